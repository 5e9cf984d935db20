//! Error types for parallel-mcp.
//!
//! Each concern owns a `thiserror` enum; [`Error`] wraps them for the
//! CLI and binary edges. Failures inside a polling worker never surface
//! through these types directly: they are captured as text in the job's
//! `error` field.

use std::time::Duration;

use thiserror::Error;

use crate::research::job::JobState;

/// Result type alias using the crate's top-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Job orchestration error.
    #[error(transparent)]
    Job(#[from] JobError),

    /// Remote research API error.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// CLI command error.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by the orchestrator's synchronous paths and lookups.
#[derive(Debug, Error)]
pub enum JobError {
    /// No job with this identifier is known to the registry.
    #[error("job not found: {job_id}")]
    NotFound {
        /// The identifier that was looked up.
        job_id: String,
    },

    /// The job has not completed, so its result cannot be read.
    #[error("job {job_id} is not ready (state: {state})")]
    NotReady {
        /// Job identifier.
        job_id: String,
        /// State observed at lookup time.
        state: JobState,
    },

    /// Requested chunk number is outside `1..=total`.
    #[error("chunk {chunk} out of range (job has {total} chunks)")]
    ChunkOutOfRange {
        /// Requested 1-based chunk number.
        chunk: usize,
        /// Total number of chunks in the result.
        total: usize,
    },

    /// No remote client is configured; the job was never created.
    #[error("Parallel client not configured. Set PARALLEL_API_KEY in the environment.")]
    RemoteUnavailable,

    /// The remote run could not be created. The job exists in state `failed`.
    #[error("research submission failed for job {job_id}: {message}")]
    SubmissionFailed {
        /// Job identifier (queryable, in state `failed`).
        job_id: String,
        /// Remote error text.
        message: String,
    },

    /// A state transition that the job state machine does not allow.
    #[error("invalid job transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: JobState,
        /// Requested state.
        to: JobState,
    },

    /// The registry already holds a job with this identifier.
    #[error("duplicate job id: {job_id}")]
    DuplicateJob {
        /// Conflicting identifier.
        job_id: String,
    },

    /// A polling worker is already attached to this job.
    #[error("job {job_id} already has an active worker")]
    WorkerAlreadyAttached {
        /// Job identifier.
        job_id: String,
    },

    /// The job did not reach a terminal state within the wait window.
    #[error("job {job_id} still {state} after waiting {waited:?}")]
    WaitTimedOut {
        /// Job identifier.
        job_id: String,
        /// State observed when the wait gave up.
        state: JobState,
        /// How long the caller waited.
        waited: Duration,
    },
}

/// Errors from the remote research API collaborator.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network-level failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP response.
    #[error("HTTP error with status {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        message: String,
        /// Parsed `Retry-After` header, in seconds.
        retry_after: Option<u64>,
    },

    /// Response body did not match the expected schema.
    #[error("failed to decode response: {message}")]
    Decode {
        /// Decoder error text.
        message: String,
    },

    /// The remote service is not reachable or not configured.
    #[error("remote research API unavailable: {message}")]
    Unavailable {
        /// Reason.
        message: String,
    },
}

impl RemoteError {
    /// Returns `true` for errors worth retrying with backoff: transport
    /// timeouts and connection failures, HTTP 408, 429 and 5xx.
    /// Everything else is terminal for the job.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::Decode { .. } | Self::Unavailable { .. } => false,
        }
    }

    /// Server-requested delay before retrying, when one was sent.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Http {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Reasons a polling worker moved its job to Failed.
///
/// Rendered to text and stored in the job record; callers never receive
/// this type directly.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Status polling failed after exhausting retries, or terminally.
    #[error("status poll failed: {0}")]
    Poll(RemoteError),

    /// The run finished but its result could not be retrieved.
    #[error("result retrieval failed: {0}")]
    Retrieve(RemoteError),

    /// The remote run finished without success.
    #[error("{0}")]
    RunFailed(String),

    /// The job's deadline elapsed before the run finished.
    #[error("research timed out after {}s waiting for the remote run", .0.as_secs())]
    DeadlineExceeded(Duration),

    /// The worker was cancelled (server shutdown).
    #[error("worker cancelled before the remote run finished")]
    Cancelled,

    /// The worker panicked.
    #[error("worker panicked: {0}")]
    Panicked(String),

    /// The job record rejected a transition.
    #[error(transparent)]
    Job(#[from] JobError),
}

/// CLI command errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not complete.
    #[error("{0}")]
    ExecutionFailed(String),

    /// A command-line argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(408, true ; "request timeout")]
    #[test_case(429, true ; "rate limited")]
    #[test_case(500, true ; "internal error")]
    #[test_case(503, true ; "unavailable")]
    #[test_case(400, false ; "bad request")]
    #[test_case(401, false ; "unauthorized")]
    #[test_case(404, false ; "not found")]
    #[test_case(422, false ; "validation")]
    fn test_http_retry_classification(status: u16, retryable: bool) {
        let err = RemoteError::Http {
            status,
            message: String::new(),
            retry_after: None,
        };
        assert_eq!(err.is_retryable(), retryable);
    }

    #[test]
    fn test_decode_is_terminal() {
        let err = RemoteError::Decode {
            message: "missing field `run_id`".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let err = RemoteError::Http {
            status: 429,
            message: "slow down".to_string(),
            retry_after: Some(7),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_not_ready_message_includes_state() {
        let err = JobError::NotReady {
            job_id: "abc".to_string(),
            state: JobState::Running,
        };
        assert_eq!(err.to_string(), "job abc is not ready (state: running)");
    }

    #[test]
    fn test_wraps_into_top_level() {
        let err: Error = JobError::RemoteUnavailable.into();
        assert!(matches!(err, Error::Job(JobError::RemoteUnavailable)));
    }
}
