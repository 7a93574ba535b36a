//! Core of a small HTTP request composer: draft editing, validation, dispatch
//! with timing, request history and a collections workspace.

pub mod app;
pub mod body_format;
pub mod composer;
pub mod config;
pub mod db;
pub mod draft;
pub mod error;
pub mod executor;
pub mod history;
pub mod http_client;
pub mod key_value;
pub mod notify;
pub mod timing;
pub mod transport;
pub mod types;
pub mod url_validator;
pub mod validation;
pub mod workspace;
