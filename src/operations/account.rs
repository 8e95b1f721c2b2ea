//! Connectivity check against the authenticated user's profile.

use tracing::debug;

use crate::client::LatitudeClient;
use crate::error::{Context, OperationError, Stage};
use crate::normalize::{self, ResultEnvelope};

/// `test_connection`: one short-timeout probe of `/user/profile`.
pub async fn test_connection(client: &LatitudeClient) -> Result<ResultEnvelope, OperationError> {
    debug!(stage = %Stage::Mapped, base_url = client.base_url(), "probing API");
    let mut envelope = client
        .probe()
        .await
        .and_then(normalize::single)
        .context(|| "Connection test failed".into())?;
    if let Some(meta) = envelope.meta.as_object_mut() {
        meta.insert("connected".into(), true.into());
        meta.insert("base_url".into(), client.base_url().into());
    }
    Ok(envelope)
}
