use std::sync::OnceLock;

use futures::future::BoxFuture;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use tokio::runtime::Runtime;

use crate::error::NetworkFailure;
use crate::transport::{Transport, TransportRequest, TransportResponse};
use crate::types::HeaderValue;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Shared tokio runtime that every dispatch runs on, whichever executor awaits it.
pub fn runtime() -> std::io::Result<&'static Runtime> {
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    if let Err(loser) = RUNTIME.set(runtime) {
        // lost a first-use race; dropping a runtime may happen inside async code
        loser.shutdown_background();
    }
    RUNTIME
        .get()
        .ok_or_else(|| std::io::Error::other("async runtime unavailable"))
}

/// Reason phrase for a status code, or `""` for unregistered codes.
pub fn canonical_status_text(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

/// Transport backed by reqwest
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("reqdraft/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    fn build(&self, request: TransportRequest) -> Result<reqwest::RequestBuilder, NetworkFailure> {
        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|e| NetworkFailure::new(e.to_string()))?;

        let mut builder = self.client.request(method, request.url);

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }

        // `header` appends, so repeated values all go out
        for (name, values) in request.headers.iter() {
            for value in values {
                builder = builder.header(name, value.as_str());
            }
        }

        if let Some(data) = &request.data {
            builder = builder.json(data);
        }

        Ok(builder)
    }
}

/// Group response headers by name, keeping every value of repeated headers.
pub fn group_headers(headers: &HeaderMap) -> Vec<(String, HeaderValue)> {
    headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            (name.as_str().to_string(), HeaderValue::from_values(values))
        })
        .collect()
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, NetworkFailure>> {
        let built = self.build(request);

        Box::pin(async move {
            let builder = built?;
            let runtime = runtime().map_err(|e| NetworkFailure::new(e.to_string()))?;

            let (status, headers, body) = runtime
                .spawn(async move {
                    let response = builder.send().await?;
                    let status = response.status();
                    let headers = group_headers(response.headers());
                    let body = response.text().await?;
                    Ok::<_, reqwest::Error>((status, headers, body))
                })
                .await
                .map_err(|e| NetworkFailure::new(e.to_string()))?
                .map_err(|e| {
                    log::error!("Request failed: {}", e);
                    NetworkFailure::new(e.to_string())
                })?;

            Ok(TransportResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().map(str::to_string),
                headers,
                body,
            })
        })
    }
}
