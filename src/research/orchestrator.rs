//! Research job orchestrator.
//!
//! Owns the job registry and the injected collaborators (remote API and
//! default approver). Submission runs synchronously up to remote run
//! creation, then hands the job to a background worker and returns.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::approval::{ApprovalRequest, Approver, AutoApprove, DeclineAll};
use super::client::create_client;
use super::config::ResearchConfig;
use super::job::{ChunkView, JobId, JobRecord, JobState, JobSummary, StatusView};
use super::provider::ResearchApi;
use super::registry::{JobEntry, JobRegistry};
use super::worker::{self, RetryPolicy, WorkerSettings};
use crate::core::ProcessorTier;
use crate::error::{JobError, RemoteError};

/// What a caller gets back from a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    /// Identifier for status and chunk lookups.
    pub job_id: JobId,
    /// Tier the job runs on, after default substitution.
    pub processor: ProcessorTier,
    /// State right after submission: Cancelled when declined, otherwise
    /// Approved or later.
    pub state: JobState,
}

/// Coordinates job submission, lookups and worker lifetimes.
pub struct Orchestrator {
    api: Option<Arc<dyn ResearchApi>>,
    approver: Arc<dyn Approver>,
    registry: JobRegistry,
    config: ResearchConfig,
}

impl Orchestrator {
    /// Creates an orchestrator with explicit collaborators.
    ///
    /// `api` may be `None`: the orchestrator still serves lookups and
    /// rejects submissions with [`JobError::RemoteUnavailable`].
    pub fn new(
        api: Option<Arc<dyn ResearchApi>>,
        approver: Arc<dyn Approver>,
        config: ResearchConfig,
    ) -> Self {
        Self {
            api,
            approver,
            registry: JobRegistry::new(),
            config,
        }
    }

    /// Creates an orchestrator backed by the Parallel client.
    ///
    /// The default approver approves everything when `auto_approve` is set
    /// and declines otherwise; interactive surfaces pass their own approver
    /// to [`submit_with`](Self::submit_with).
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the HTTP client cannot be built.
    pub fn from_config(config: ResearchConfig) -> Result<Self, RemoteError> {
        let api = create_client(&config)?;
        let approver: Arc<dyn Approver> = if config.auto_approve {
            Arc::new(AutoApprove)
        } else {
            Arc::new(DeclineAll)
        };
        Ok(Self::new(api, approver, config))
    }

    /// Submits a research job using the default approver.
    ///
    /// # Errors
    ///
    /// See [`submit_with`](Self::submit_with).
    pub async fn submit(
        &self,
        query: &str,
        processor: Option<&str>,
    ) -> Result<SubmitReceipt, JobError> {
        self.submit_with(query, processor, self.approver.as_ref())
            .await
    }

    /// Submits a research job, asking `approver` when the tier needs it.
    ///
    /// Unknown or absent tiers fall back to the configured default. A
    /// declined job is returned as Cancelled, not as an error.
    ///
    /// # Errors
    ///
    /// - [`JobError::RemoteUnavailable`] when no remote client is
    ///   configured (no job is created)
    /// - [`JobError::SubmissionFailed`] when run creation fails (the job
    ///   exists in state Failed)
    pub async fn submit_with(
        &self,
        query: &str,
        processor: Option<&str>,
        approver: &dyn Approver,
    ) -> Result<SubmitReceipt, JobError> {
        self.prune_expired();

        let processor = ProcessorTier::resolve(processor, self.config.default_processor);
        let api = self.api.clone().ok_or(JobError::RemoteUnavailable)?;

        let entry = self.registry.insert(JobRecord::new(query, processor))?;
        let job_id = entry.id();
        info!(%job_id, %processor, backend = api.name(), "research job created");

        let mut max_wait = self.config.max_wait;
        if processor.requires_approval() && !self.config.auto_approve {
            let decision = approver
                .decide(&ApprovalRequest::new(query, processor))
                .await;
            if !decision.approved {
                entry.update(|r| r.cancel(Utc::now()))?;
                info!(%job_id, "research declined");
                return Ok(SubmitReceipt {
                    job_id,
                    processor,
                    state: JobState::Cancelled,
                });
            }
            max_wait = decision.max_wait.or(max_wait);
        }

        let settings = WorkerSettings {
            poll_interval: self.config.poll_interval_for(processor),
            retry: RetryPolicy::from_config(&self.config),
            max_wait,
        };

        // Once run creation starts it finishes and attaches a worker even if
        // the caller goes away.
        let launch = tokio::spawn(launch_run(
            Arc::clone(&entry),
            api,
            query.to_string(),
            processor,
            settings,
        ));
        match launch.await {
            Ok(launched) => launched?,
            Err(e) => {
                let message = format!("run launch aborted: {e}");
                error!(%job_id, error = %message, "research launch task failed");
                entry.update(|r| r.fail(format!("submission failed: {message}"), Utc::now()))?;
                return Err(JobError::SubmissionFailed {
                    job_id: job_id.to_string(),
                    message,
                });
            }
        }

        Ok(SubmitReceipt {
            job_id,
            processor,
            state: entry.state(),
        })
    }

    /// Current status of a job.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for unknown identifiers.
    pub fn status(&self, job_id: &str) -> Result<StatusView, JobError> {
        let entry = self.registry.get(job_id)?;
        Ok(entry.snapshot().status_view(Utc::now()))
    }

    /// Returns chunk `chunk_number` (1-based) of a completed job.
    ///
    /// # Errors
    ///
    /// - [`JobError::NotFound`] for unknown identifiers
    /// - [`JobError::NotReady`] unless the job is Complete
    /// - [`JobError::ChunkOutOfRange`] unless `1 <= chunk_number <= total`
    pub fn fetch_chunk(&self, job_id: &str, chunk_number: usize) -> Result<ChunkView, JobError> {
        let record = self.registry.get(job_id)?.snapshot();
        let result = match (&record.result, record.state) {
            (Some(result), JobState::Complete) => result,
            (_, state) => {
                return Err(JobError::NotReady {
                    job_id: record.id.to_string(),
                    state,
                });
            }
        };

        let total_chunks = result.total_chunks();
        let content = result
            .chunk(chunk_number)
            .ok_or(JobError::ChunkOutOfRange {
                chunk: chunk_number,
                total: total_chunks,
            })?;

        Ok(ChunkView {
            job_id: record.id,
            chunk_number,
            total_chunks,
            is_last: chunk_number == total_chunks,
            content: content.to_string(),
        })
    }

    /// Waits up to `timeout` for a job to reach a terminal state.
    ///
    /// # Errors
    ///
    /// - [`JobError::NotFound`] for unknown identifiers
    /// - [`JobError::WaitTimedOut`] when the job is still in flight
    pub async fn wait(&self, job_id: &str, timeout: Duration) -> Result<StatusView, JobError> {
        let entry = self.registry.get(job_id)?;
        match tokio::time::timeout(timeout, entry.wait_terminal()).await {
            Ok(record) => Ok(record.status_view(Utc::now())),
            Err(_) => Err(JobError::WaitTimedOut {
                job_id: entry.id().to_string(),
                state: entry.state(),
                waited: timeout,
            }),
        }
    }

    /// Submits and waits for the job to finish.
    ///
    /// A declined job returns its Cancelled status immediately.
    ///
    /// # Errors
    ///
    /// Any error from [`submit_with`](Self::submit_with) or
    /// [`wait`](Self::wait).
    pub async fn submit_and_wait(
        &self,
        query: &str,
        processor: Option<&str>,
        approver: &dyn Approver,
        timeout: Duration,
    ) -> Result<StatusView, JobError> {
        let receipt = self.submit_with(query, processor, approver).await?;
        self.wait(&receipt.job_id.to_string(), timeout).await
    }

    /// All known jobs, newest first.
    pub fn list(&self) -> Vec<JobSummary> {
        let mut jobs: Vec<JobSummary> = self
            .registry
            .entries()
            .iter()
            .map(|entry| entry.snapshot().summary())
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Evicts terminal jobs older than the configured retention window.
    /// Does nothing unless retention is configured. Returns the number of
    /// evicted jobs.
    pub fn prune_expired(&self) -> usize {
        let Some(retention) = self.config.retention else {
            return 0;
        };
        let Some(cutoff) = TimeDelta::from_std(retention)
            .ok()
            .and_then(|window| Utc::now().checked_sub_signed(window))
        else {
            return 0;
        };

        let removed = self.registry.remove_finished_before(cutoff);
        if removed > 0 {
            info!(removed, retention_secs = retention.as_secs(), "pruned expired jobs");
        }
        removed
    }

    /// Cancels every running worker. Returns how many were signalled.
    pub fn shutdown(&self) -> usize {
        let mut cancelled = 0;
        for entry in self.registry.entries() {
            if entry.worker_active() {
                entry.cancel_worker();
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            warn!(cancelled, "cancelled in-flight research workers");
        }
        cancelled
    }

    /// The job registry.
    pub const fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Effective configuration.
    pub const fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Whether a remote client is configured.
    pub const fn has_remote(&self) -> bool {
        self.api.is_some()
    }
}

/// Creates the remote run and attaches its worker.
///
/// Run creation is not retried: a duplicate would be billed twice.
async fn launch_run(
    entry: Arc<JobEntry>,
    api: Arc<dyn ResearchApi>,
    query: String,
    processor: ProcessorTier,
    settings: WorkerSettings,
) -> Result<(), JobError> {
    let job_id = entry.id();
    let run_id = match api.create_run(&query, processor).await {
        Ok(handle) => handle.run_id,
        Err(e) => {
            let message = e.to_string();
            error!(%job_id, error = %message, "failed to create remote run");
            entry.update(|r| r.fail(format!("submission failed: {message}"), Utc::now()))?;
            return Err(JobError::SubmissionFailed {
                job_id: job_id.to_string(),
                message,
            });
        }
    };

    info!(%job_id, %run_id, "remote run created");
    entry.update(|r| {
        r.approve(run_id)?;
        r.max_wait = settings.max_wait;
        Ok(())
    })?;
    entry.spawn_worker(worker::run(Arc::clone(&entry), api, settings))
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("backend", &self.api.as_ref().map(|api| api.name()))
            .field("jobs", &self.registry.len())
            .field("default_processor", &self.config.default_processor)
            .finish_non_exhaustive()
    }
}
