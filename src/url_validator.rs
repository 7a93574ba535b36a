//! Address bar validation and normalization.
//!
//! Users mostly type a bare host (`example.com`, `localhost:3000`) or paste an
//! absolute URL. Bare input gets a scheme prefixed: `http://` for localhost and
//! `https://` for everything else. Any other explicit scheme is rejected.

use url::Url;

use crate::error::UrlError;

/// Validate raw address bar text and turn it into an absolute http(s) URL.
///
/// Checks run in order on the trimmed input: empty, foreign scheme, explicit
/// http(s) scheme, then scheme-less input.
pub fn validate_url(raw: &str) -> Result<Url, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let http_scheme = has_http_scheme(trimmed);
    if has_any_scheme(trimmed) && !http_scheme {
        return Err(UrlError::UnsupportedScheme);
    }

    if http_scheme {
        return Url::parse(trimmed).map_err(|_| UrlError::Unparseable);
    }

    let prefix = if is_localhost(trimmed) { "http" } else { "https" };
    Url::parse(&format!("{prefix}://{trimmed}")).map_err(|_| UrlError::Unparseable)
}

/// Generic `scheme://` prefix: a letter followed by letters, digits, `+`, `.` or `-`.
pub(crate) fn has_any_scheme(input: &str) -> bool {
    let Some(pos) = input.find("://") else {
        return false;
    };
    let scheme = &input[..pos];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

fn has_http_scheme(input: &str) -> bool {
    starts_with_ignore_case(input, "http://") || starts_with_ignore_case(input, "https://")
}

/// `localhost` followed by `:`, `/` or end of input.
fn is_localhost(input: &str) -> bool {
    if !starts_with_ignore_case(input, "localhost") {
        return false;
    }
    matches!(input["localhost".len()..].chars().next(), None | Some(':') | Some('/'))
}

fn starts_with_ignore_case(input: &str, prefix: &str) -> bool {
    input
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
