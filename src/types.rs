use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP methods a draft can be sent with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
        }
    }

    /// Lower-case form handed to the transport.
    pub fn as_transport_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "get",
            HttpMethod::POST => "post",
            HttpMethod::PUT => "put",
            HttpMethod::PATCH => "patch",
            HttpMethod::DELETE => "delete",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            HttpMethod::GET,
            HttpMethod::POST,
            HttpMethod::PUT,
            HttpMethod::PATCH,
            HttpMethod::DELETE,
        ]
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "PATCH" => Some(HttpMethod::PATCH),
            "DELETE" => Some(HttpMethod::DELETE),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One row of the query parameter or header editor.
///
/// Keys are not unique; order is display order and transport order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueRow {
    pub key: String,
    pub value: String,
}

impl KeyValueRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Partial update applied to a single row. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPatch {
    pub key: Option<String>,
    pub value: Option<String>,
}

impl RowPatch {
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: None,
        }
    }

    pub fn value(value: impl Into<String>) -> Self {
        Self {
            key: None,
            value: Some(value.into()),
        }
    }

    pub fn both(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }

    pub(crate) fn apply_to(&self, row: &mut KeyValueRow) {
        if let Some(key) = &self.key {
            row.key = key.clone();
        }
        if let Some(value) = &self.value {
            row.value = value.clone();
        }
    }
}

/// A completed request as shown in the history list. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub method: HttpMethod,
    pub url: String,
    /// Elapsed time in milliseconds
    pub time: u64,
    pub status: u16,
    pub status_text: String,
}

/// A saved endpoint inside a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEndpoint {
    pub id: String,
    pub name: String,
    pub method: HttpMethod,
    /// Path, possibly relative to the owning collection's `base_url`
    pub url: String,
}

/// A named group of endpoints sharing a base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub endpoints: Vec<CollectionEndpoint>,
}

impl Collection {
    pub fn endpoint(&self, endpoint_id: &str) -> Option<&CollectionEndpoint> {
        self.endpoints.iter().find(|e| e.id == endpoint_id)
    }

    pub fn has_endpoints(&self) -> bool {
        !self.endpoints.is_empty()
    }
}

/// Response header value; repeated headers are kept as a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValue {
    pub fn from_values(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            HeaderValue::Single(values.remove(0))
        } else {
            HeaderValue::Multiple(values)
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            HeaderValue::Single(v) => vec![v.as_str()],
            HeaderValue::Multiple(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.values().join(", "))
    }
}

/// Everything captured from one received response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOutcome {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, HeaderValue)>,
    pub body: String,
    pub elapsed_ms: u64,
}

impl ResponseOutcome {
    pub fn is_success(&self) -> bool {
        is_success_status(self.status)
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}
