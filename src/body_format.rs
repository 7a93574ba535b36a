//! Pretty-printing for request and response bodies.
//!
//! Pure functions; nothing here touches the draft directly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Nothing to format")]
    Empty,

    #[error("JSON parse error: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Format a JSON string with 2-space indentation.
///
/// # Arguments
/// * `input` - Raw JSON text, as typed into the body editor
///
/// # Returns
/// * `Ok(String)` - The same document, pretty-printed
/// * `Err(FormatError)` - Blank input or a parse error
pub fn format_json(input: &str) -> Result<String, FormatError> {
    if input.trim().is_empty() {
        return Err(FormatError::Empty);
    }

    let value: serde_json::Value = serde_json::from_str(input)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Render a response body for viewing.
///
/// Bodies that parse as JSON are pretty-printed; anything else is shown as
/// received.
pub fn display_body(body: &str) -> String {
    match format_json(body) {
        Ok(pretty) => pretty,
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ============ format_json ============

    #[test]
    fn test_format_json_simple() {
        let result = format_json(r#"{"key":"value"}"#).unwrap();
        assert_eq!(result, "{\n  \"key\": \"value\"\n}");
    }

    #[test]
    fn test_format_json_nested() {
        let result = format_json(r#"{"outer":{"inner":[1,2]}}"#).unwrap();
        assert!(result.contains("    \"inner\": ["));
    }

    #[test]
    fn test_format_json_invalid() {
        let err = format_json("{invalid}").unwrap_err();
        assert!(matches!(err, FormatError::Invalid(_)));
        assert!(err.to_string().starts_with("JSON parse error"));
    }

    #[test]
    fn test_format_json_empty() {
        assert!(matches!(format_json("  \n"), Err(FormatError::Empty)));
    }

    // ============ display_body ============

    #[test]
    fn test_display_body_pretty_prints_json() {
        assert_eq!(display_body("[1,2]"), "[\n  1,\n  2\n]");
    }

    #[test]
    fn test_display_body_keeps_plain_text() {
        assert_eq!(display_body("<html>hi</html>"), "<html>hi</html>");
        assert_eq!(display_body(""), "");
    }
}
