//! Error types for request validation and dispatch.
//!
//! The `Display` text of each variant is the message shown to the user.

use thiserror::Error;

/// How loudly a rejection is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Address bar rejections
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("The address bar is empty.")]
    Empty,

    #[error("Only HTTP and HTTPS protocols are supported.")]
    UnsupportedScheme,

    #[error("Please enter a valid URL.")]
    Unparseable,
}

/// Rows that carry a value but no key
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum KeyValueError {
    #[error("Query parameters and headers must have non-empty keys.")]
    Both,

    #[error("Headers must have non-empty keys.")]
    Headers,

    #[error("Query parameters must have non-empty keys.")]
    Params,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Request body must contain valid JSON.")]
pub struct BodyParseError {
    /// Parser detail, kept for logging only.
    pub detail: String,
}

/// Any failure that stops a draft before it reaches the transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Url(#[from] UrlError),

    #[error(transparent)]
    KeyValue(#[from] KeyValueError),

    #[error(transparent)]
    Body(#[from] BodyParseError),
}

impl ValidationError {
    pub fn severity(&self) -> Severity {
        match self {
            ValidationError::Url(UrlError::Empty) => Severity::Warning,
            ValidationError::Url(_) => Severity::Error,
            ValidationError::KeyValue(_) => Severity::Warning,
            ValidationError::Body(_) => Severity::Error,
        }
    }
}

/// No response was received at all (connection refused, DNS, TLS, ...).
#[derive(Debug, Error, Clone, PartialEq, Eq, Default)]
#[error("{}", .message.as_deref().unwrap_or("network failure"))]
pub struct NetworkFailure {
    pub message: Option<String>,
}

impl NetworkFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    pub fn unknown() -> Self {
        Self { message: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_severity() {
        assert_eq!(
            ValidationError::from(UrlError::Empty).severity(),
            Severity::Warning
        );
        assert_eq!(
            ValidationError::from(UrlError::UnsupportedScheme).severity(),
            Severity::Error
        );
        assert_eq!(
            ValidationError::from(UrlError::Unparseable).severity(),
            Severity::Error
        );
        assert_eq!(
            ValidationError::from(KeyValueError::Params).severity(),
            Severity::Warning
        );
        let body = BodyParseError {
            detail: "EOF".into(),
        };
        assert_eq!(ValidationError::from(body).severity(), Severity::Error);
    }

    #[test]
    fn test_validation_message_is_transparent() {
        let err = ValidationError::from(KeyValueError::Headers);
        assert_eq!(err.to_string(), "Headers must have non-empty keys.");
    }

    #[test]
    fn test_network_failure_display() {
        assert_eq!(NetworkFailure::new("refused").to_string(), "refused");
        assert_eq!(NetworkFailure::unknown().to_string(), "network failure");
    }
}
