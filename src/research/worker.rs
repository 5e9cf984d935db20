//! Background polling worker.
//!
//! One worker drives one job from Approved to Complete or Failed:
//!
//! ```text
//! start (Approved → Running, started_at)
//!   loop: get_status ──active──► sleep(poll_interval) ──┐
//!            ▲                                          │
//!            └──────────────────────────────────────────┘
//!   inactive + completed → get_result → chunk → Complete
//!   inactive otherwise / any unrecoverable error → Failed
//! ```
//!
//! Polls for a job are strictly sequential. Retryable remote errors are
//! retried with exponential backoff; everything else fails the job. The
//! whole sequence is bounded by the job's deadline (if any), stops at the
//! next suspension point once the job's cancellation token fires, and runs
//! under `catch_unwind` so a panic still ends in Failed.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

use super::config::ResearchConfig;
use super::job::ResearchResult;
use super::provider::ResearchApi;
use super::registry::JobEntry;
use crate::error::{RemoteError, WorkerError};

/// Upper bound for a single backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry policy for remote calls made by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
    /// Cap for a single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Policy from configuration.
    #[must_use]
    pub const fn from_config(config: &ResearchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_backoff,
            max_delay: MAX_BACKOFF,
        }
    }

    /// Delay before retry number `attempt` (0-based). A server-sent
    /// `Retry-After` wins when it is longer.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, err: &RemoteError) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let backoff = self.base_delay.saturating_mul(factor).min(self.max_delay);
        err.retry_after().map_or(backoff, |server| server.max(backoff))
    }
}

/// Per-job worker parameters.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Retry policy for remote calls.
    pub retry: RetryPolicy,
    /// Deadline measured from the start of polling.
    pub max_wait: Option<Duration>,
}

/// Runs the worker for `entry` until the job is terminal.
///
/// Every outcome, including a panic inside the polling sequence, is
/// written back into the job record.
pub async fn run(entry: Arc<JobEntry>, api: Arc<dyn ResearchApi>, settings: WorkerSettings) {
    let job_id = entry.id();

    let outcome = AssertUnwindSafe(drive(&entry, api.as_ref(), settings))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(WorkerError::Panicked(panic_message(panic.as_ref()))));

    match outcome {
        Ok(result) => {
            let total_chunks = result.total_chunks();
            let citation_groups = result.citations.len();
            let content_length = result.content_length();
            match entry.update(|r| r.complete(result, Utc::now())) {
                Ok(()) => info!(
                    %job_id,
                    total_chunks,
                    citation_groups,
                    content_length,
                    "research complete"
                ),
                Err(e) => error!(%job_id, error = %e, "failed to record research result"),
            }
        }
        Err(failure) => {
            let message = failure.to_string();
            error!(%job_id, error = %message, "research failed");
            if let Err(e) = entry.update(|r| r.fail(message, Utc::now())) {
                error!(%job_id, error = %e, "failed to record research failure");
            }
        }
    }
}

async fn drive(
    entry: &JobEntry,
    api: &dyn ResearchApi,
    settings: WorkerSettings,
) -> Result<ResearchResult, WorkerError> {
    let run_id = entry
        .snapshot()
        .external_run_id
        .ok_or_else(|| WorkerError::RunFailed("job has no remote run id".to_string()))?;

    entry.update(|r| r.start(Utc::now()))?;
    info!(job_id = %entry.id(), %run_id, "polling remote run");

    let cancel = entry.cancellation_token();
    let poll = poll_to_completion(api, &run_id, settings);
    let bounded = async {
        match settings.max_wait {
            Some(limit) => tokio::time::timeout(limit, poll)
                .await
                .unwrap_or(Err(WorkerError::DeadlineExceeded(limit))),
            None => poll.await,
        }
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(WorkerError::Cancelled),
        outcome = bounded => outcome,
    }
}

async fn poll_to_completion(
    api: &dyn ResearchApi,
    run_id: &str,
    settings: WorkerSettings,
) -> Result<ResearchResult, WorkerError> {
    let mut polls: u64 = 0;

    let status = loop {
        let status = with_retry("get_status", settings.retry, || api.get_status(run_id))
            .await
            .map_err(WorkerError::Poll)?;

        if !status.is_active {
            break status;
        }

        polls += 1;
        debug!(run_id, polls, status = %status.status, "research in progress");
        tokio::time::sleep(settings.poll_interval).await;
    };

    info!(run_id, polls, status = %status.status, "remote run finished");

    if !status.succeeded() {
        return Err(WorkerError::RunFailed(status.failure_reason()));
    }

    let run = with_retry("get_result", settings.retry, || api.get_result(run_id))
        .await
        .map_err(WorkerError::Retrieve)?;

    Ok(ResearchResult::from_run(&run))
}

/// Runs `op`, retrying retryable errors according to `policy`.
pub async fn with_retry<T, F, Fut>(
    operation: &'static str,
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt, &e);
                warn!(
                    operation,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "retrying remote call"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
