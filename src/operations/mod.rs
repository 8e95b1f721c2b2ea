//! Domain operations, one module per Latitude.sh resource.
//!
//! Each operation takes a typed argument record (deserialized from
//! [`Validated`](crate::schema::Validated) arguments), maps it to wire
//! parameters with [`crate::params`], performs exactly one call through
//! [`LatitudeClient`], and normalizes the body with [`crate::normalize`].
//! The mapping half of every operation is a plain function so it can be
//! checked without a network.

pub mod account;
pub mod plans;
pub mod projects;
pub mod regions;
pub mod servers;

use serde_json::json;
use tracing::debug;

use crate::client::{ApiRequest, LatitudeClient};
use crate::error::{ApiError, Context, OperationError, Stage};
use crate::normalize::{self, ResultEnvelope};
use crate::params::Page;

/// How the response body should be normalized.
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    Collection(Page),
    Single,
    /// Empty 2xx bodies are fine (actions, deletes).
    Optional,
}

/// Send `request`, normalize the body per `shape`, and wrap any failure in
/// the operation's context.
pub async fn run(
    client: &LatitudeClient,
    request: ApiRequest<'_>,
    shape: Shape,
    context: impl FnOnce() -> String,
) -> Result<ResultEnvelope, OperationError> {
    debug!(
        stage = %Stage::Mapped,
        method = %request.method,
        path = %request.path,
        "request mapped"
    );

    let result = send_and_normalize(client, request, shape).await;
    result.context(context)
}

async fn send_and_normalize(
    client: &LatitudeClient,
    request: ApiRequest<'_>,
    shape: Shape,
) -> Result<ResultEnvelope, ApiError> {
    let body = client.send(request).await?;
    debug!(stage = %Stage::Requested, "response body received");

    let envelope = match shape {
        Shape::Collection(page) => normalize::collection(body, page)?,
        Shape::Single => normalize::single(body)?,
        Shape::Optional => normalize::optional(body)?,
    };
    debug!(stage = %Stage::Normalized, "response normalized");
    Ok(envelope)
}

/// Envelope for a successful delete: the provider's body if it sent one,
/// otherwise a note of what was removed.
pub(crate) fn deleted(envelope: ResultEnvelope, id: &str) -> ResultEnvelope {
    if envelope.data.is_null() && envelope.meta.as_object().map_or(true, |m| m.is_empty()) {
        ResultEnvelope {
            data: serde_json::Value::Null,
            meta: json!({ "deleted": id }),
        }
    } else {
        envelope
    }
}
