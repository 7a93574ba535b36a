//! Pre-dispatch checks on the key/value editors and the JSON body.

use serde_json::Value;

use crate::error::{BodyParseError, KeyValueError};
use crate::key_value::has_row_value;
use crate::types::KeyValueRow;

/// A row carrying something but no key. Fully blank rows are ignored.
pub fn has_empty_keys(rows: &[KeyValueRow]) -> bool {
    rows.iter()
        .any(|row| has_row_value(row) && row.key.trim().is_empty())
}

pub fn validate_key_value_inputs(
    headers: &[KeyValueRow],
    query_params: &[KeyValueRow],
) -> Result<(), KeyValueError> {
    match (has_empty_keys(headers), has_empty_keys(query_params)) {
        (true, true) => Err(KeyValueError::Both),
        (true, false) => Err(KeyValueError::Headers),
        (false, true) => Err(KeyValueError::Params),
        (false, false) => Ok(()),
    }
}

/// Parse the raw body text. An empty body means "no body", not an error.
pub fn parse_json_body(body: &str) -> Result<Option<Value>, BodyParseError> {
    if body.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| BodyParseError {
            detail: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(key: &str, value: &str) -> KeyValueRow {
        KeyValueRow::new(key, value)
    }

    // ============ key/value validation ============

    #[test]
    fn test_both_sides_invalid() {
        let result = validate_key_value_inputs(&[row("", "a")], &[row("", "b")]);
        assert_eq!(result, Err(KeyValueError::Both));
        assert_eq!(
            KeyValueError::Both.to_string(),
            "Query parameters and headers must have non-empty keys."
        );
    }

    #[test]
    fn test_only_headers_invalid() {
        let result = validate_key_value_inputs(&[row("", "a")], &[row("p", "b")]);
        assert_eq!(result, Err(KeyValueError::Headers));
    }

    #[test]
    fn test_only_params_invalid() {
        let result = validate_key_value_inputs(&[row("h", "a")], &[row("  ", "b")]);
        assert_eq!(result, Err(KeyValueError::Params));
        assert_eq!(
            KeyValueError::Params.to_string(),
            "Query parameters must have non-empty keys."
        );
    }

    #[test]
    fn test_both_valid() {
        assert_eq!(
            validate_key_value_inputs(&[row("h", "a")], &[row("p", "b")]),
            Ok(())
        );
        assert_eq!(validate_key_value_inputs(&[], &[]), Ok(()));
    }

    #[test]
    fn test_trailing_blank_row_is_exempt() {
        let headers = vec![row("h", "1"), row("", "")];
        let params = vec![row("p", "1"), row(" ", " ")];
        assert_eq!(validate_key_value_inputs(&headers, &params), Ok(()));
    }

    // ============ body parsing ============

    #[test]
    fn test_empty_body_is_no_body() {
        assert_eq!(parse_json_body(""), Ok(None));
    }

    #[test]
    fn test_valid_json_body() {
        assert_eq!(parse_json_body(r#"{"a":1}"#), Ok(Some(json!({"a": 1}))));
        assert_eq!(parse_json_body("[1, 2]"), Ok(Some(json!([1, 2]))));
    }

    #[test]
    fn test_invalid_json_body() {
        let err = parse_json_body("{bad json").unwrap_err();
        assert_eq!(err.to_string(), "Request body must contain valid JSON.");
        assert!(!err.detail.is_empty());
    }
}
