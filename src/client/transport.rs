//! # Query Transport
//!
//! A single submission attempt against the human-query service. The poll
//! loop only needs "did the service respond, and with what"; everything else
//! is a [`TransportError`] that the loop recovers from.

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::{QueryHumanError, Result};
use crate::query::QueryPayload;

/// Any HTTP-level response. Every status is terminal for the poll loop.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

/// Failures below the HTTP layer: no response was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    fn from_reqwest(error: reqwest::Error, attempt_timeout: Duration) -> Self {
        if error.is_timeout() {
            Self::Timeout(attempt_timeout)
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

/// Common interface for submitting a query, regardless of how it is sent.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Endpoint description for logs.
    fn endpoint(&self) -> &str;

    /// Send one attempt, allowed to take at most `attempt_timeout`.
    async fn submit(
        &self,
        payload: &QueryPayload<'_>,
        attempt_timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport posting JSON to `{base_url}queryHuman`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url.as_str())
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let url = config.query_url()?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        // No client-wide timeout: each attempt sets its own.
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(default_headers)
            .build()
            .map_err(QueryHumanError::HttpClient)?;

        debug!(url = %url, "Created human-query HTTP transport");

        Ok(Self { client, url })
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    fn endpoint(&self) -> &str {
        self.url.as_str()
    }

    async fn submit(
        &self,
        payload: &QueryPayload<'_>,
        attempt_timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(self.url.clone())
            .timeout(attempt_timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, attempt_timeout))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(e, attempt_timeout))?;

        Ok(TransportResponse {
            status,
            body: parse_body(text),
        })
    }
}

/// JSON when the body parses as JSON, otherwise the raw text as a string.
fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
