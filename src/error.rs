//! Error taxonomy for provider calls.
//!
//! [`ApiError`] is produced exactly once, at the transport boundary, from an
//! HTTP status or a transport condition. Domain operations wrap it in an
//! [`OperationError`] to add context ("Failed to fetch project X") without
//! changing its classification. Upstream JSON:API error objects ride along as
//! auxiliary [`ApiError::details`] and are shown to the caller, never used to
//! make decisions.

use serde_json::Value;
use thiserror::Error;

/// Classified failure of a single provider call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: invalid or expired API key")]
    Unauthorized { details: Option<Value> },

    #[error("Forbidden: the API key lacks permission for this operation")]
    Forbidden { details: Option<Value> },

    #[error("{resource} not found")]
    NotFound {
        resource: String,
        details: Option<Value>,
    },

    #[error("Bad request: {message}")]
    BadRequest {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    #[error("Rate limited: too many requests, back off and retry later")]
    RateLimited { details: Option<Value> },

    #[error("Server error (HTTP {status}): {message}")]
    Server {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    #[error("Invalid response: missing data")]
    MissingData,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Classify a non-2xx response. `resource` names the thing being
    /// addressed (e.g. "Project") so a 404 reads "Project not found".
    pub fn from_status(status: u16, body: &str, resource: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let details = parsed.as_ref().and_then(upstream_details).or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && parsed.is_none()).then(|| Value::String(trimmed.to_string()))
        });

        match status {
            401 => Self::Unauthorized { details },
            403 => Self::Forbidden { details },
            404 => Self::NotFound {
                resource: resource.to_string(),
                details,
            },
            400 | 422 => Self::BadRequest {
                status,
                message: parsed
                    .as_ref()
                    .and_then(field_errors)
                    .or_else(|| parsed.as_ref().and_then(upstream_message))
                    .unwrap_or_else(|| "the request was rejected".to_string()),
                details,
            },
            429 => Self::RateLimited { details },
            s if s >= 500 => Self::Server {
                status,
                message: parsed
                    .as_ref()
                    .and_then(upstream_message)
                    .unwrap_or_else(|| "the provider failed to process the request".to_string()),
                details,
            },
            _ => Self::Api {
                status,
                message: parsed
                    .as_ref()
                    .and_then(upstream_message)
                    .unwrap_or_else(|| fallback_message(body)),
                details,
            },
        }
    }

    /// Classify a transport failure (no HTTP status was received).
    pub fn from_transport(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_ms }
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(describe_transport(err))
        }
    }

    /// Structured upstream error detail, if the provider sent any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Unauthorized { details }
            | Self::Forbidden { details }
            | Self::NotFound { details, .. }
            | Self::BadRequest { details, .. }
            | Self::RateLimited { details }
            | Self::Server { details, .. }
            | Self::Api { details, .. } => details.as_ref(),
            Self::Timeout { .. } | Self::Network(_) | Self::MissingData | Self::InvalidResponse(_) => {
                None
            }
        }
    }

    /// Short machine-friendly class name, used in logs.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::BadRequest { .. } => "bad_request",
            Self::RateLimited { .. } => "rate_limited",
            Self::Server { .. } => "server_error",
            Self::Timeout { .. } => "timeout",
            Self::Network(_) => "network",
            Self::Api { .. } => "api_error",
            Self::MissingData | Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// An [`ApiError`] with the context of the operation that hit it.
#[derive(Debug, Error)]
#[error("{context}: {source}")]
pub struct OperationError {
    pub context: String,
    #[source]
    pub source: ApiError,
}

impl OperationError {
    pub fn details(&self) -> Option<&Value> {
        self.source.details()
    }
}

/// Attach operation context to a classified error.
pub trait Context<T> {
    fn context(self, context: impl FnOnce() -> String) -> Result<T, OperationError>;
}

impl<T> Context<T> for Result<T, ApiError> {
    fn context(self, context: impl FnOnce() -> String) -> Result<T, OperationError> {
        self.map_err(|source| OperationError {
            context: context(),
            source,
        })
    }
}

/// Where in the call lifecycle a tool call currently is (or failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Mapped,
    Requested,
    Normalized,
    Returned,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Mapped => "mapped",
            Stage::Requested => "requested",
            Stage::Normalized => "normalized",
            Stage::Returned => "returned",
        };
        f.write_str(name)
    }
}

/// The `errors` array of a JSON:API error document, or the whole body when
/// it is some other JSON shape.
fn upstream_details(body: &Value) -> Option<Value> {
    match body.get("errors") {
        Some(errors) => Some(errors.clone()),
        None if body.is_null() => None,
        None => Some(body.clone()),
    }
}

/// Join field-level JSON:API errors into "field: reason; field: reason".
fn field_errors(body: &Value) -> Option<String> {
    let errors = body.get("errors")?.as_array()?;
    let parts: Vec<String> = errors
        .iter()
        .filter_map(|e| {
            let reason = e
                .get("detail")
                .or_else(|| e.get("title"))
                .and_then(Value::as_str)?;
            let field = e
                .pointer("/source/pointer")
                .and_then(Value::as_str)
                .map(|p| p.rsplit('/').next().unwrap_or(p))
                .or_else(|| e.pointer("/source/parameter").and_then(Value::as_str))
                .filter(|f| !f.is_empty());
            Some(match field {
                Some(field) => format!("{field}: {reason}"),
                None => reason.to_string(),
            })
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}

/// First human-readable message in an upstream error body.
fn upstream_message(body: &Value) -> Option<String> {
    if let Some(first) = body.get("errors").and_then(Value::as_array).and_then(|a| a.first()) {
        let title = first.get("title").and_then(Value::as_str);
        let detail = first.get("detail").and_then(Value::as_str);
        return match (title, detail) {
            (Some(t), Some(d)) if t != d => Some(format!("{t}: {d}")),
            (Some(t), _) => Some(t.to_string()),
            (None, Some(d)) => Some(d.to_string()),
            (None, None) => None,
        };
    }
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(String::from)
}

fn fallback_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "unexpected response from the provider".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// Walk the error source chain so "connection refused" / DNS failures show
/// their root cause instead of reqwest's generic wrapper text.
fn describe_transport(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message = format!("{message}: {cause}");
        source = cause.source();
    }
    message
}
