//! Pluggable remote research API.
//!
//! The orchestrator and its workers only see this trait, so they run
//! unchanged against the Parallel HTTP client or an in-process fake.

use async_trait::async_trait;

use super::run::{RunHandle, RunStatus, TaskRunResult};
use crate::core::ProcessorTier;
use crate::error::RemoteError;

/// Remote service that executes long-running research runs.
///
/// Latency is unspecified: creating a run is expected to take seconds,
/// a run itself anywhere from seconds to tens of minutes.
#[async_trait]
pub trait ResearchApi: Send + Sync {
    /// Backend name for logging (e.g. `"parallel"`).
    fn name(&self) -> &'static str;

    /// Starts a research run.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the run could not be created.
    async fn create_run(
        &self,
        query: &str,
        processor: ProcessorTier,
    ) -> Result<RunHandle, RemoteError>;

    /// Fetches the current status of a run.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport or API failures.
    async fn get_status(&self, run_id: &str) -> Result<RunStatus, RemoteError>;

    /// Fetches the output of a finished run.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport, API or decoding failures.
    async fn get_result(&self, run_id: &str) -> Result<TaskRunResult, RemoteError>;
}
