//! Process-wide registry of research jobs.
//!
//! The map from [`JobId`] to [`JobEntry`] is the only structure shared by
//! all jobs and takes a short map-level lock. Each record lives in its own
//! `watch` channel: the worker publishes whole-record updates, readers take
//! consistent snapshots and can await state changes without polling.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::job::{JobId, JobRecord, JobState};
use crate::error::JobError;

/// One registered job: its record, worker handle and cancellation token.
pub struct JobEntry {
    id: JobId,
    record: watch::Sender<JobRecord>,
    worker: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl JobEntry {
    fn new(record: JobRecord) -> Self {
        let id = record.id;
        let (record, _) = watch::channel(record);
        Self {
            id,
            record,
            worker: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Consistent copy of the record. Results are shared, not copied.
    #[must_use]
    pub fn snapshot(&self) -> JobRecord {
        self.record.borrow().clone()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> JobState {
        self.record.borrow().state
    }

    /// Applies a transition atomically with respect to readers.
    ///
    /// Readers either see the record before `f` ran or after it finished.
    /// When `f` fails nothing is published, so `f` must validate before it
    /// mutates (the [`JobRecord`] transition methods do).
    pub(crate) fn update<F>(&self, f: F) -> Result<(), JobError>
    where
        F: FnOnce(&mut JobRecord) -> Result<(), JobError>,
    {
        let mut outcome = Ok(());
        self.record.send_if_modified(|record| match f(record) {
            Ok(()) => true,
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome
    }

    /// Spawns the job's polling worker. A job gets at most one worker in
    /// its lifetime; a second call is rejected without spawning.
    pub(crate) fn spawn_worker<F>(&self, worker: F) -> Result<(), JobError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(JobError::WorkerAlreadyAttached {
                job_id: self.id.to_string(),
            });
        }
        *slot = Some(tokio::spawn(worker));
        Ok(())
    }

    /// Whether a worker was spawned and is still running.
    #[must_use]
    pub fn worker_active(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Token the worker observes at each suspension point.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Asks the worker to stop.
    pub fn cancel_worker(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the job is terminal, returning the terminal record.
    pub async fn wait_terminal(&self) -> JobRecord {
        let mut rx = self.record.subscribe();
        match rx.wait_for(|record| record.state.is_terminal()).await {
            Ok(record) => record.clone(),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.snapshot(),
        }
    }

    /// Subscribes to record updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<JobRecord> {
        self.record.subscribe()
    }
}

impl std::fmt::Debug for JobEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobEntry")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("worker_active", &self.worker_active())
            .finish_non_exhaustive()
    }
}

/// Concurrent map of all jobs known to this process.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Arc<JobEntry>>>,
}

impl JobRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new record.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::DuplicateJob`] if the identifier is already taken.
    pub fn insert(&self, record: JobRecord) -> Result<Arc<JobEntry>, JobError> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        if jobs.contains_key(&record.id) {
            return Err(JobError::DuplicateJob {
                job_id: record.id.to_string(),
            });
        }
        let entry = Arc::new(JobEntry::new(record));
        jobs.insert(entry.id(), Arc::clone(&entry));
        Ok(entry)
    }

    /// Looks up a job by its external identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for unknown or malformed identifiers.
    pub fn get(&self, job_id: &str) -> Result<Arc<JobEntry>, JobError> {
        job_id
            .parse::<JobId>()
            .ok()
            .and_then(|id| self.get_by_id(id))
            .ok_or_else(|| JobError::NotFound {
                job_id: job_id.to_string(),
            })
    }

    /// Looks up a job by typed identifier.
    #[must_use]
    pub fn get_by_id(&self, id: JobId) -> Option<Arc<JobEntry>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// All entries, in no particular order.
    #[must_use]
    pub fn entries(&self) -> Vec<Arc<JobEntry>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Number of registered jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evicts terminal jobs that finished before `cutoff`. Returns how many
    /// were removed. Non-terminal jobs are never evicted.
    pub fn remove_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let before = jobs.len();
        jobs.retain(|_, entry| {
            let record = entry.record.borrow();
            !(record.state.is_terminal() && record.finished_at.is_some_and(|t| t < cutoff))
        });
        before - jobs.len()
    }
}
