//! HTTP transport
//!
//! The dispatcher talks to the server through the [`Transport`] trait so the
//! auth/retry policy can be exercised without a network. [`ReqwestTransport`]
//! is the production implementation: one pooled `reqwest::Client` with a
//! client-wide timeout, owned by the dispatcher for its whole lifetime.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::MoorError;
use crate::session::AuthToken;

/// Header carrying the session token in both directions
pub const AUTH_HEADER: &str = "X-Moor-Auth-Token";

/// Request body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    /// Sent as `text/plain; charset=utf-8` (MOO programs and verb source)
    Text(String),
}

/// A request ready to be sent
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Unencoded path segments, e.g. `["verbs", "oid:1", "look"]`
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Body,
    pub token: Option<AuthToken>,
}

impl HttpRequest {
    /// Human-readable path for logs
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// A received response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Value of the auth header, if the server sent one
    pub token: Option<AuthToken>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single HTTP request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Network failures and timeouts come back as `RequestFailed` errors;
    /// any HTTP status, including errors, is a successful `send`.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, MoorError>;
}

/// `reqwest`-backed transport
pub struct ReqwestTransport {
    base_url: Url,
    http: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, MoorError> {
        debug!(%base_url, ?timeout, "ReqwestTransport::new: called");
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| MoorError::invalid_argument(format!("invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(MoorError::invalid_argument(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("moorrest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MoorError::request_failed(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url,
            http,
            timeout,
        })
    }

    /// Join the path segments onto the base URL, percent-encoding each one
    pub fn url_for(&self, request: &HttpRequest) -> Result<Url, MoorError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MoorError::invalid_argument("base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(&request.segments);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, MoorError> {
        let url = self.url_for(request)?;
        debug!(method = %request.method, path = %request.path(), "ReqwestTransport::send: called");

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &request.token {
            builder = builder.header(AUTH_HEADER, token.as_str());
        }
        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Text(text) => builder
                .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(text.clone()),
        };

        let response = builder.send().await.map_err(|e| {
            debug!(error = %e, "ReqwestTransport::send: network error");
            if e.is_timeout() {
                MoorError::request_failed(format!("request timed out after {:?}", self.timeout))
            } else {
                MoorError::request_failed(format!("network error: {}", e.without_url()))
            }
        })?;

        let status = response.status().as_u16();
        let token = response
            .headers()
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(AuthToken::new);
        let body = response
            .text()
            .await
            .map_err(|e| MoorError::request_failed(format!("failed to read response body: {}", e.without_url())))?;

        debug!(%status, body_len = body.len(), "ReqwestTransport::send: response received");
        Ok(HttpResponse { status, token, body })
    }
}
