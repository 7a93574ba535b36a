//! Request execution pipeline.
//!
//! One send attempt runs `Validating -> Sending -> Completed` and ends back in
//! idle. Validation is fail-fast in a fixed order (URL, key/value keys, JSON
//! body); the first failure is surfaced as a single notification and nothing is
//! dispatched. Any received response, 2xx or not, is fully captured and yields
//! a history record. A missing response yields neither.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::draft::RequestDraft;
use crate::error::{NetworkFailure, ValidationError};
use crate::http_client::canonical_status_text;
use crate::notify::Notifier;
use crate::timing::{Clock, SystemClock, TimedResponse, TimedTransport};
use crate::transport::{rows_to_headers, rows_to_params, Transport, TransportRequest};
use crate::types::{is_success_status, HistoryItem, ResponseOutcome};
use crate::url_validator::validate_url;
use crate::validation::{parse_json_body, validate_key_value_inputs};

pub const LOADING_MESSAGE: &str = "Sending...";
pub const SUCCESS_MESSAGE: &str = "Success!";
pub const BUSY_MESSAGE: &str = "A request is already in progress.";
pub const NETWORK_FALLBACK_MESSAGE: &str = "Network or unknown error occurred.";

/// Result of one send attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Stopped before dispatch
    Rejected(ValidationError),
    /// Another attempt on this executor is still in flight
    Busy,
    /// 2xx response
    Success {
        response: ResponseOutcome,
        history: HistoryItem,
    },
    /// Any other received status
    HttpFailure {
        response: ResponseOutcome,
        history: HistoryItem,
    },
    /// No response at all
    NetworkFailure(NetworkFailure),
}

impl SendOutcome {
    pub fn response(&self) -> Option<&ResponseOutcome> {
        match self {
            SendOutcome::Success { response, .. } | SendOutcome::HttpFailure { response, .. } => {
                Some(response)
            }
            _ => None,
        }
    }

    /// The record to append to history, present only when a response arrived.
    pub fn history_item(&self) -> Option<&HistoryItem> {
        match self {
            SendOutcome::Success { history, .. } | SendOutcome::HttpFailure { history, .. } => {
                Some(history)
            }
            _ => None,
        }
    }
}

/// Builds the transport request for a draft, or the first validation failure.
pub fn prepare_request(draft: &RequestDraft) -> Result<TransportRequest, ValidationError> {
    let url = validate_url(draft.url())?;
    validate_key_value_inputs(draft.headers(), draft.query_params())?;
    let data = parse_json_body(draft.body())?;

    Ok(TransportRequest {
        url,
        method: draft.method().as_transport_str().to_string(),
        params: rows_to_params(draft.query_params()),
        headers: rows_to_headers(draft.headers()),
        data,
    })
}

/// User-facing text for a failed attempt
pub fn format_http_error(status: u16, status_text: &str) -> String {
    format!("HTTP Error: {} {}", status, status_text)
        .trim_end()
        .to_string()
}

pub fn format_network_error(failure: &NetworkFailure) -> String {
    match failure.message.as_deref() {
        Some(message) if !message.trim().is_empty() => format!("Error: {}", message),
        _ => NETWORK_FALLBACK_MESSAGE.to_string(),
    }
}

/// Clears the in-flight flag when the attempt finishes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RequestExecutor<T, C = SystemClock> {
    transport: TimedTransport<T, C>,
    in_flight: AtomicBool,
}

impl<T: Transport> RequestExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: TimedTransport::new(transport),
            in_flight: AtomicBool::new(false),
        }
    }
}

impl<T: Transport, C: Clock> RequestExecutor<T, C> {
    pub fn with_clock(transport: T, clock: C) -> Self {
        Self {
            transport: TimedTransport::with_clock(transport, clock),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> &T {
        self.transport.inner()
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one attempt for `draft`. The draft is taken by value so later edits
    /// cannot leak into an attempt that is already in flight.
    pub async fn send(&self, draft: RequestDraft, notifier: &dyn Notifier) -> SendOutcome {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            log::warn!("Send ignored, a request is already in flight");
            notifier.warning(BUSY_MESSAGE);
            return SendOutcome::Busy;
        };

        let request = match prepare_request(&draft) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Request rejected: {}", e);
                notifier.notify(e.severity(), &e.to_string());
                return SendOutcome::Rejected(e);
            }
        };

        log::debug!("Sending {} {}", draft.method(), request.url);
        notifier.loading(LOADING_MESSAGE);

        match self.transport.dispatch(request).await {
            Ok(timed) => self.complete(&draft, timed, notifier),
            Err(failure) => {
                log::error!("Request failed without a response: {}", failure);
                notifier.error(&format_network_error(&failure));
                SendOutcome::NetworkFailure(failure)
            }
        }
    }

    fn complete(
        &self,
        draft: &RequestDraft,
        timed: TimedResponse,
        notifier: &dyn Notifier,
    ) -> SendOutcome {
        let TimedResponse {
            response,
            elapsed_ms,
        } = timed;

        let status_text = response
            .status_text
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| canonical_status_text(response.status).to_string());

        let outcome = ResponseOutcome {
            status: response.status,
            status_text: status_text.clone(),
            headers: response.headers,
            body: response.body,
            elapsed_ms,
        };

        let history = HistoryItem {
            method: draft.method(),
            url: draft.url().to_string(),
            time: elapsed_ms,
            status: outcome.status,
            status_text,
        };

        log::info!(
            "{} {} -> {} in {} ms",
            history.method,
            history.url,
            history.status,
            elapsed_ms
        );

        if is_success_status(outcome.status) {
            notifier.success(SUCCESS_MESSAGE);
            SendOutcome::Success {
                response: outcome,
                history,
            }
        } else {
            log::warn!("HTTP error status {}", outcome.status);
            notifier.error(&format_http_error(outcome.status, &outcome.status_text));
            SendOutcome::HttpFailure {
                response: outcome,
                history,
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{response, ScriptedTransport};
    use super::*;
    use crate::error::{KeyValueError, UrlError};
    use crate::notify::test_support::{Event, RecordingNotifier};
    use crate::timing::test_support::SteppingClock;
    use crate::types::{HttpMethod, KeyValueRow, RowPatch};
    use pretty_assertions::assert_eq;

    fn draft(url: &str) -> RequestDraft {
        let mut draft = RequestDraft::new();
        draft.set_url(url);
        draft
    }

    fn executor(
        replies: Vec<Result<crate::transport::TransportResponse, NetworkFailure>>,
    ) -> RequestExecutor<ScriptedTransport, SteppingClock> {
        RequestExecutor::with_clock(ScriptedTransport::replying(replies), SteppingClock::new(42))
    }

    // ============ validation ordering ============

    #[tokio::test]
    async fn test_empty_url_is_a_warning_without_loading() {
        let executor = executor(vec![]);
        let notifier = RecordingNotifier::default();

        let outcome = executor.send(draft("  "), &notifier).await;

        assert_eq!(outcome, SendOutcome::Rejected(UrlError::Empty.into()));
        assert_eq!(
            notifier.events(),
            vec![Event::Warning("The address bar is empty.".into())]
        );
        assert!(executor.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_scheme_is_an_error() {
        let executor = executor(vec![]);
        let notifier = RecordingNotifier::default();

        executor.send(draft("ftp://x.com"), &notifier).await;

        assert_eq!(
            notifier.events(),
            vec![Event::Error(
                "Only HTTP and HTTPS protocols are supported.".into()
            )]
        );
    }

    #[tokio::test]
    async fn test_url_is_checked_before_rows_and_body() {
        let executor = executor(vec![]);
        let notifier = RecordingNotifier::default();
        let mut bad = draft("");
        bad.set_headers(vec![KeyValueRow::new("", "a")]);
        bad.set_body("{nope");

        let outcome = executor.send(bad, &notifier).await;
        assert_eq!(outcome, SendOutcome::Rejected(UrlError::Empty.into()));
    }

    #[tokio::test]
    async fn test_rows_are_checked_before_body() {
        let executor = executor(vec![]);
        let notifier = RecordingNotifier::default();
        let mut bad = draft("example.com");
        bad.set_query_params(vec![KeyValueRow::new("", "b")]);
        bad.set_body("{nope");

        let outcome = executor.send(bad, &notifier).await;

        assert_eq!(outcome, SendOutcome::Rejected(KeyValueError::Params.into()));
        assert_eq!(
            notifier.events(),
            vec![Event::Warning(
                "Query parameters must have non-empty keys.".into()
            )]
        );
    }

    #[tokio::test]
    async fn test_invalid_body_is_an_error() {
        let executor = executor(vec![]);
        let notifier = RecordingNotifier::default();
        let mut bad = draft("example.com");
        bad.set_body("{nope");

        let outcome = executor.send(bad, &notifier).await;

        assert!(matches!(outcome, SendOutcome::Rejected(ValidationError::Body(_))));
        assert_eq!(
            notifier.events(),
            vec![Event::Error("Request body must contain valid JSON.".into())]
        );
        assert!(outcome.history_item().is_none());
    }

    // ============ request building ============

    #[test]
    fn test_prepare_request_normalizes_and_keeps_duplicates() {
        let mut d = draft("localhost:8080/search");
        d.set_method(HttpMethod::POST);
        d.set_query_params(vec![KeyValueRow::new("p", "1"), KeyValueRow::new("p", "2")]);
        d.append_header();
        d.update_header(0, &RowPatch::both("X-Id", "7"));
        d.set_body(r#"{"q":"rust"}"#);

        let request = prepare_request(&d).unwrap();

        assert_eq!(request.url.as_str(), "http://localhost:8080/search");
        assert_eq!(request.method, "post");
        assert_eq!(
            request.params,
            vec![("p".to_string(), "1".to_string()), ("p".to_string(), "2".to_string())]
        );
        assert_eq!(request.headers.get_all("X-Id"), &["7".to_string()]);
        assert_eq!(request.data, Some(serde_json::json!({"q": "rust"})));
    }

    #[test]
    fn test_prepare_request_without_body() {
        let request = prepare_request(&draft("example.com")).unwrap();
        assert_eq!(request.data, None);
        assert!(request.params.is_empty());
        assert!(request.headers.is_empty());
    }

    // ============ classification ============

    #[tokio::test]
    async fn test_success_yields_history_and_lifecycle() {
        let executor = executor(vec![Ok(response(200, Some("OK"), "{}"))]);
        let notifier = RecordingNotifier::default();

        let outcome = executor.send(draft("example.com"), &notifier).await;

        assert_eq!(
            outcome.history_item(),
            Some(&HistoryItem {
                method: HttpMethod::GET,
                url: "example.com".into(),
                time: 42,
                status: 200,
                status_text: "OK".into(),
            })
        );
        assert_eq!(outcome.response().unwrap().elapsed_ms, 42);
        assert_eq!(
            notifier.events(),
            vec![
                Event::Loading("Sending...".into()),
                Event::Success("Success!".into())
            ]
        );
        assert_eq!(executor.transport().sent()[0].method, "get");
    }

    #[tokio::test]
    async fn test_http_error_is_captured_not_swallowed() {
        let executor = executor(vec![Ok(response(404, None, "missing"))]);
        let notifier = RecordingNotifier::default();

        let outcome = executor.send(draft("example.com/x"), &notifier).await;

        let SendOutcome::HttpFailure { response, history } = outcome else {
            panic!("expected an HTTP failure");
        };
        assert_eq!(response.body, "missing");
        assert_eq!(response.status_text, "Not Found");
        assert_eq!(response.elapsed_ms, 42);
        assert_eq!(history.status, 404);
        assert_eq!(
            notifier.events(),
            vec![
                Event::Loading("Sending...".into()),
                Event::Error("HTTP Error: 404 Not Found".into())
            ]
        );
    }

    #[tokio::test]
    async fn test_network_failure_has_no_history() {
        let executor = executor(vec![Err(NetworkFailure::new("connection refused"))]);
        let notifier = RecordingNotifier::default();

        let outcome = executor.send(draft("localhost:1"), &notifier).await;

        assert_eq!(
            outcome,
            SendOutcome::NetworkFailure(NetworkFailure::new("connection refused"))
        );
        assert!(outcome.history_item().is_none());
        assert!(outcome.response().is_none());
        assert_eq!(
            notifier.events(),
            vec![
                Event::Loading("Sending...".into()),
                Event::Error("Error: connection refused".into())
            ]
        );
    }

    #[tokio::test]
    async fn test_network_failure_without_message_uses_fallback() {
        let executor = executor(vec![Err(NetworkFailure::unknown())]);
        let notifier = RecordingNotifier::default();

        executor.send(draft("example.com"), &notifier).await;

        assert_eq!(
            notifier.events().last(),
            Some(&Event::Error("Network or unknown error occurred.".into()))
        );
    }

    #[test]
    fn test_format_http_error_without_status_text() {
        assert_eq!(format_http_error(599, ""), "HTTP Error: 599");
        assert_eq!(format_http_error(500, "Internal Server Error"), "HTTP Error: 500 Internal Server Error");
    }

    // ============ overlapping sends ============

    #[tokio::test]
    async fn test_second_send_while_in_flight_is_busy() {
        let executor = executor(vec![Ok(response(200, Some("OK"), ""))]);
        let release = executor.transport().hold_next();
        let first_notifier = RecordingNotifier::default();
        let second_notifier = RecordingNotifier::default();

        let (first, second) = futures::join!(
            executor.send(draft("example.com"), &first_notifier),
            async {
                let outcome = executor.send(draft("example.com"), &second_notifier).await;
                let _ = release.send(());
                outcome
            }
        );

        assert!(matches!(first, SendOutcome::Success { .. }));
        assert_eq!(second, SendOutcome::Busy);
        assert_eq!(
            second_notifier.events(),
            vec![Event::Warning(BUSY_MESSAGE.into())]
        );
        assert_eq!(executor.transport().sent().len(), 1);
        assert!(!executor.is_sending());
    }

    #[tokio::test]
    async fn test_executor_is_idle_after_rejection() {
        let executor = executor(vec![Ok(response(200, Some("OK"), ""))]);
        let notifier = RecordingNotifier::default();

        executor.send(draft(""), &notifier).await;
        assert!(!executor.is_sending());

        let outcome = executor.send(draft("example.com"), &notifier).await;
        assert!(matches!(outcome, SendOutcome::Success { .. }));
    }
}
