//! HTTP client for the Latitude.sh REST API.
//!
//! [`LatitudeClient`] wraps one `reqwest::Client` built at startup from
//! [`Config`] and shared by reference for the life of the process. It holds
//! no per-call state, so overlapping calls can reuse it freely.
//!
//! ## Authentication
//!
//! Every request carries `Authorization: Bearer <key>` plus JSON:API
//! `Content-Type` / `Accept` headers, installed once as default headers.
//!
//! ## Error handling
//!
//! Each call makes exactly one network attempt. Non-2xx statuses and
//! transport failures are classified into [`ApiError`] here and nowhere
//! else. Response bodies are redacted before they can end up in an error.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;
use crate::params::ApiParams;
use crate::redact::Redactor;

pub const JSON_API: &str = "application/vnd.api+json";

/// Upper bound on the connectivity probe timeout; a shorter data-call
/// timeout wins.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Path used by the connectivity probe.
pub const PROBE_PATH: &str = "/user/profile";

/// Failure to build the HTTP client at startup.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("API key contains characters that are not allowed in an HTTP header")]
    InvalidApiKey,
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// One outbound call.
#[derive(Debug)]
pub struct ApiRequest<'a> {
    pub method: Method,
    pub path: String,
    pub params: ApiParams,
    pub body: Option<Value>,
    /// Human name of the addressed resource, used for 404 messages.
    pub resource: &'a str,
}

impl<'a> ApiRequest<'a> {
    pub fn new(method: Method, path: impl Into<String>, resource: &'a str) -> Self {
        Self {
            method,
            path: path.into(),
            params: ApiParams::new(),
            body: None,
            resource,
        }
    }

    pub fn get(path: impl Into<String>, resource: &'a str) -> Self {
        Self::new(Method::GET, path, resource)
    }

    pub fn post(path: impl Into<String>, resource: &'a str) -> Self {
        Self::new(Method::POST, path, resource)
    }

    pub fn patch(path: impl Into<String>, resource: &'a str) -> Self {
        Self::new(Method::PATCH, path, resource)
    }

    pub fn delete(path: impl Into<String>, resource: &'a str) -> Self {
        Self::new(Method::DELETE, path, resource)
    }

    pub fn params(mut self, params: ApiParams) -> Self {
        self.params = params;
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP client for the Latitude.sh API.
pub struct LatitudeClient {
    http: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
    redactor: Redactor,
}

impl LatitudeClient {
    /// Build the client from validated configuration.
    pub fn new(config: &Config) -> Result<Self, ClientBuildError> {
        let mut auth = HeaderValue::from_str(&config.authorization())
            .map_err(|_| ClientBuildError::InvalidApiKey)?;
        auth.set_sensitive(true);

        let mut default_headers = HeaderMap::new();
        default_headers.insert(AUTHORIZATION, auth);
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_API));
        default_headers.insert(ACCEPT, HeaderValue::from_static(JSON_API));

        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .user_agent(concat!("mcp-latitude/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_ms(),
            redactor: Redactor::new(config.api_key().clone()),
        })
    }

    /// The API base URL (without trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    /// Perform one request and return the parsed body (`Null` for an empty
    /// 2xx body).
    pub async fn send(&self, request: ApiRequest<'_>) -> Result<Value, ApiError> {
        self.execute(request, None).await
    }

    /// `GET /user/profile` with the short probe timeout. Validates the key
    /// and reachability without waiting as long as a data call would.
    pub async fn probe(&self) -> Result<Value, ApiError> {
        let timeout = PROBE_TIMEOUT.min(Duration::from_millis(self.timeout_ms));
        self.execute(ApiRequest::get(PROBE_PATH, "User profile"), Some(timeout))
            .await
    }

    async fn execute(
        &self,
        request: ApiRequest<'_>,
        timeout: Option<Duration>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let timeout_ms = timeout.map_or(self.timeout_ms, |t| t.as_millis() as u64);

        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.params.is_empty() {
            builder = builder.query(request.params.pairs());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        debug!(method = %request.method, path = %request.path, params = ?request.params.pairs(), "sending request");
        let started = Instant::now();

        let response = builder.send().await.map_err(|e| self.transport_error(&e, timeout_ms))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e, timeout_ms))?;

        debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response received"
        );

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&text)
                .map_err(|e| ApiError::InvalidResponse(format!("body is not valid JSON: {e}")))
        } else {
            let body = self.redactor.redact(&text);
            Err(ApiError::from_status(status.as_u16(), &body, request.resource))
        }
    }

    fn transport_error(&self, err: &reqwest::Error, timeout_ms: u64) -> ApiError {
        match ApiError::from_transport(err, timeout_ms) {
            ApiError::Network(message) => ApiError::Network(self.redactor.redact(&message)),
            other => other,
        }
    }
}
