use serde::{Deserialize, Serialize};

use crate::key_value;
use crate::types::{HttpMethod, KeyValueRow, RowPatch};

/// The request currently being edited.
///
/// Rows are only changed through the setters below so the trailing-blank
/// rule of [`key_value`] always holds for both editors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDraft {
    method: HttpMethod,
    url: String,
    query_params: Vec<KeyValueRow>,
    headers: Vec<KeyValueRow>,
    body: String,
}

impl RequestDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query_params(&self) -> &[KeyValueRow] {
        &self.query_params
    }

    pub fn headers(&self) -> &[KeyValueRow] {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_method(&mut self, method: HttpMethod) {
        self.method = method;
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn update_query_param(&mut self, index: usize, patch: &RowPatch) {
        self.query_params = key_value::update(&self.query_params, index, patch);
    }

    pub fn delete_query_param(&mut self, index: usize) {
        self.query_params = key_value::delete(&self.query_params, index);
    }

    pub fn append_query_param(&mut self) {
        self.query_params = key_value::append(&self.query_params);
    }

    pub fn clear_query_params(&mut self) {
        self.query_params = key_value::clear();
    }

    pub fn set_query_params(&mut self, rows: Vec<KeyValueRow>) {
        self.query_params = key_value::normalize(rows);
    }

    pub fn update_header(&mut self, index: usize, patch: &RowPatch) {
        self.headers = key_value::update(&self.headers, index, patch);
    }

    pub fn delete_header(&mut self, index: usize) {
        self.headers = key_value::delete(&self.headers, index);
    }

    pub fn append_header(&mut self) {
        self.headers = key_value::append(&self.headers);
    }

    pub fn clear_headers(&mut self) {
        self.headers = key_value::clear();
    }

    pub fn set_headers(&mut self, rows: Vec<KeyValueRow>) {
        self.headers = key_value::normalize(rows);
    }

    /// Replace method and URL with a saved endpoint's; rows and body are kept.
    pub fn load_from_endpoint(&mut self, method: HttpMethod, url: impl Into<String>) {
        self.method = method;
        self.url = url.into();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
