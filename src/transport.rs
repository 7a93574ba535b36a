//! Transport capability: the boundary between the executor and the network.
//!
//! A transport receives a fully built [`TransportRequest`] and must resolve with
//! a [`TransportResponse`] for every received response, whatever its status.
//! Only a missing response is reported as [`NetworkFailure`].

use futures::future::BoxFuture;
use serde_json::Value;
use url::Url;

use crate::error::NetworkFailure;
use crate::types::{HeaderValue, KeyValueRow};

/// Ordered multi-valued header map. Names keep first-insertion order and
/// first spelling; names match ASCII case-insensitively, and repeated names
/// collect every value instead of overwriting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiValueMap {
    entries: Vec<(String, Vec<String>)>,
}

impl MultiValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A request ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: Url,
    /// Lower-case method name
    pub method: String,
    /// Query pairs in row order; duplicates preserved
    pub params: Vec<(String, String)>,
    pub headers: MultiValueMap,
    pub data: Option<Value>,
}

/// What the transport reports for any received response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: Option<String>,
    pub headers: Vec<(String, HeaderValue)>,
    pub body: String,
}

pub trait Transport: Send + Sync {
    /// Dispatch `request`. Non-2xx statuses resolve with `Ok`.
    fn send(&self, request: TransportRequest)
        -> BoxFuture<'_, Result<TransportResponse, NetworkFailure>>;
}

/// Query rows to transport pairs, skipping rows without a key.
pub fn rows_to_params(rows: &[KeyValueRow]) -> Vec<(String, String)> {
    rows.iter()
        .filter(|row| !row.key.trim().is_empty())
        .map(|row| (row.key.clone(), row.value.clone()))
        .collect()
}

/// Header rows to a multi-valued map, skipping rows without a key.
pub fn rows_to_headers(rows: &[KeyValueRow]) -> MultiValueMap {
    let mut headers = MultiValueMap::new();
    for row in rows.iter().filter(|row| !row.key.trim().is_empty()) {
        headers.append(row.key.clone(), row.value.clone());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_param_keys_are_preserved() {
        let rows = vec![
            KeyValueRow::new("p", "1"),
            KeyValueRow::new("q", "x"),
            KeyValueRow::new("p", "2"),
            KeyValueRow::default(),
        ];
        assert_eq!(
            rows_to_params(&rows),
            vec![
                ("p".to_string(), "1".to_string()),
                ("q".to_string(), "x".to_string()),
                ("p".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_header_keys_collect_values() {
        let rows = vec![
            KeyValueRow::new("X-Tag", "a"),
            KeyValueRow::new("Accept", "*/*"),
            KeyValueRow::new("X-Tag", "b"),
            KeyValueRow::new("  ", ""),
        ];
        let headers = rows_to_headers(&rows);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get_all("X-Tag"), &["a".to_string(), "b".to_string()]);
        assert_eq!(
            headers.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            vec!["X-Tag", "Accept"]
        );
        assert!(headers.get_all("missing").is_empty());
    }

    #[test]
    fn test_header_names_group_case_insensitively() {
        let rows = vec![
            KeyValueRow::new("X-Tag", "a"),
            KeyValueRow::new("x-tag", "b"),
            KeyValueRow::new("X-TAG", "c"),
        ];
        let headers = rows_to_headers(&rows);
        assert_eq!(headers.len(), 1);
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![("X-Tag", &["a".to_string(), "b".to_string(), "c".to_string()][..])]
        );
        assert_eq!(headers.get_all("x-TAG").len(), 3);
    }
}
