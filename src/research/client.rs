//! Remote client factory.

use std::sync::Arc;

use super::config::ResearchConfig;
use super::provider::ResearchApi;
use super::providers::ParallelClient;
use crate::error::RemoteError;

/// Creates the Parallel client when an API key is configured.
///
/// Returns `Ok(None)` without a key: the orchestrator then runs without a
/// remote backend and rejects submissions as unavailable.
///
/// # Errors
///
/// Returns [`RemoteError`] if the HTTP client cannot be built.
pub fn create_client(config: &ResearchConfig) -> Result<Option<Arc<dyn ResearchApi>>, RemoteError> {
    let Some(api_key) = config.api_key.as_deref() else {
        tracing::warn!("PARALLEL_API_KEY not configured, research submissions will be rejected");
        return Ok(None);
    };

    let client = ParallelClient::new(api_key, &config.base_url, config.request_timeout)?;
    tracing::info!(base_url = %config.base_url, "Parallel client initialized");
    Ok(Some(Arc::new(client)))
}
