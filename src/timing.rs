//! Per-request timing.
//!
//! [`TimedTransport`] wraps a transport and measures each dispatch on its own:
//! the start stamp is taken right before the request is handed over and the
//! elapsed time is computed when a response arrives, whatever its status.

use std::time::Instant;

use crate::error::NetworkFailure;
use crate::transport::{Transport, TransportRequest, TransportResponse};

/// Source of monotonic time stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A received response together with its round-trip time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedResponse {
    pub response: TransportResponse,
    pub elapsed_ms: u64,
}

pub struct TimedTransport<T, C = SystemClock> {
    inner: T,
    clock: C,
}

impl<T: Transport> TimedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            clock: SystemClock,
        }
    }
}

impl<T: Transport, C: Clock> TimedTransport<T, C> {
    pub fn with_clock(inner: T, clock: C) -> Self {
        Self { inner, clock }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Send through the inner transport. Network failures carry no timing.
    pub async fn dispatch(
        &self,
        request: TransportRequest,
    ) -> Result<TimedResponse, NetworkFailure> {
        let started = self.clock.now();
        let response = self.inner.send(request).await?;
        let elapsed = self.clock.now().saturating_duration_since(started);

        Ok(TimedResponse {
            response,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        })
    }
}
