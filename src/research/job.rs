//! Job records and their state machine.
//!
//! ```text
//! Pending ──► Approved ──► Running ──► Complete
//!    │            │           │
//!    │            └───────────┴──────► Failed
//!    ├────────────────────────────────► Failed   (run creation failed)
//!    └──► Cancelled                               (approval declined)
//! ```
//!
//! Transitions only move forward. Exactly one of `result` / `error` is set
//! once a job is Complete or Failed; a Cancelled job carries neither.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::run::{CitationGroup, TaskRunResult};
use crate::core::{ChunkedText, ProcessorTier, chunk_text};
use crate::error::JobError;

/// Opaque job identifier handed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Created, awaiting approval and run creation.
    Pending,
    /// Remote run created.
    Approved,
    /// Worker is polling the remote run.
    Running,
    /// Result available.
    Complete,
    /// Terminated with an error.
    Failed,
    /// Declined before any remote call.
    Cancelled,
}

impl JobState {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Cancelled)
    }

    /// Whether the state machine allows `self -> next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Cancelled | Self::Failed)
                | (Self::Approved, Self::Running | Self::Failed)
                | (Self::Running, Self::Complete | Self::Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completed research output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchResult {
    /// Full answer text.
    pub content: String,
    /// Citation groups backing the answer.
    pub citations: Vec<CitationGroup>,
    /// Answer split into retrievable chunks.
    #[serde(skip)]
    pub chunks: Vec<String>,
    /// Estimated token count of `content`.
    pub estimated_tokens: usize,
}

impl ResearchResult {
    /// Builds a result from answer text and citations, chunking the text.
    #[must_use]
    pub fn new(content: String, citations: Vec<CitationGroup>) -> Self {
        let ChunkedText {
            chunks,
            estimated_tokens,
        } = chunk_text(&content);
        Self {
            content,
            citations,
            chunks,
            estimated_tokens,
        }
    }

    /// Builds a result from a raw remote run result.
    #[must_use]
    pub fn from_run(run: &TaskRunResult) -> Self {
        Self::new(run.content_text(), run.citation_groups())
    }

    /// Answer length in characters, the unit chunk limits are counted in.
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }

    /// Number of chunks (always at least one).
    #[must_use]
    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Total sources across all citation groups.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.citations.iter().map(|g| g.citations.len()).sum()
    }

    /// Returns the 1-based chunk, if it exists.
    #[must_use]
    pub fn chunk(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.chunks.get(idx))
            .map(String::as_str)
    }
}

/// One submitted research job.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Job identifier.
    pub id: JobId,
    /// Original query text.
    pub query: String,
    /// Processor tier the run uses.
    pub processor: ProcessorTier,
    /// Current state.
    pub state: JobState,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Time the worker began polling.
    pub started_at: Option<DateTime<Utc>>,
    /// Time the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
    /// Remote run identifier, once the run exists.
    pub external_run_id: Option<String>,
    /// Deadline for the polling worker, measured from `started_at`.
    pub max_wait: Option<Duration>,
    /// Result, set only when Complete.
    pub result: Option<Arc<ResearchResult>>,
    /// Failure description, set only when Failed.
    pub error: Option<String>,
}

impl JobRecord {
    /// Creates a Pending record with a fresh identifier.
    #[must_use]
    pub fn new(query: impl Into<String>, processor: ProcessorTier) -> Self {
        Self {
            id: JobId::new(),
            query: query.into(),
            processor,
            state: JobState::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            external_run_id: None,
            max_wait: None,
            result: None,
            error: None,
        }
    }

    fn transition(&mut self, to: JobState) -> Result<(), JobError> {
        if self.state.can_transition_to(to) {
            self.state = to;
            Ok(())
        } else {
            Err(JobError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }

    /// Pending → Approved: records the remote run identifier.
    pub(crate) fn approve(&mut self, run_id: String) -> Result<(), JobError> {
        self.transition(JobState::Approved)?;
        self.external_run_id = Some(run_id);
        Ok(())
    }

    /// Approved → Running: records `started_at`.
    pub(crate) fn start(&mut self, at: DateTime<Utc>) -> Result<(), JobError> {
        self.transition(JobState::Running)?;
        self.started_at = Some(at);
        Ok(())
    }

    /// Running → Complete: installs the result.
    pub(crate) fn complete(
        &mut self,
        result: ResearchResult,
        at: DateTime<Utc>,
    ) -> Result<(), JobError> {
        self.transition(JobState::Complete)?;
        self.result = Some(Arc::new(result));
        self.finished_at = Some(at);
        Ok(())
    }

    /// Pending/Approved/Running → Failed: installs the error text.
    pub(crate) fn fail(&mut self, message: String, at: DateTime<Utc>) -> Result<(), JobError> {
        self.transition(JobState::Failed)?;
        self.error = Some(message);
        self.finished_at = Some(at);
        Ok(())
    }

    /// Pending → Cancelled.
    pub(crate) fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), JobError> {
        self.transition(JobState::Cancelled)?;
        self.finished_at = Some(at);
        Ok(())
    }

    /// Time spent so far, or in total once terminal.
    ///
    /// Pending/Approved count from `created_at`; Running from `started_at`;
    /// terminal jobs are frozen at `finished_at`.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let (start, end) = match self.state {
            JobState::Pending | JobState::Approved => (self.created_at, now),
            JobState::Running => (self.started_at.unwrap_or(self.created_at), now),
            JobState::Complete | JobState::Failed => (
                self.started_at.unwrap_or(self.created_at),
                self.finished_at.unwrap_or(now),
            ),
            JobState::Cancelled => (self.created_at, self.finished_at.unwrap_or(now)),
        };
        (end - start).to_std().unwrap_or_default()
    }

    /// Builds the caller-facing status view.
    #[must_use]
    pub fn status_view(&self, now: DateTime<Utc>) -> StatusView {
        let result = self.result.as_deref();
        StatusView {
            job_id: self.id,
            state: self.state,
            processor: self.processor,
            query: self.query.clone(),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            elapsed_seconds: self.elapsed(now).as_secs_f64(),
            external_run_id: self.external_run_id.clone(),
            error: self.error.clone(),
            summary: result.map(|r| ResultSummary {
                content_length: r.content_length(),
                estimated_tokens: r.estimated_tokens,
                total_chunks: r.total_chunks(),
                citation_count: r.citations.len(),
                source_count: r.source_count(),
            }),
            first_chunk: result.and_then(|r| r.chunk(1)).map(str::to_string),
            citations: result.map(|r| r.citations.clone()).unwrap_or_default(),
        }
    }

    /// Builds a short listing entry.
    #[must_use]
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            job_id: self.id,
            state: self.state,
            processor: self.processor,
            created_at: self.created_at,
            query_preview: preview(&self.query, 50),
        }
    }
}

/// Truncates `text` to `max` characters, appending `...` when cut.
fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Counts describing a completed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    /// Answer length in characters.
    pub content_length: usize,
    /// Estimated token count.
    pub estimated_tokens: usize,
    /// Number of retrievable chunks.
    pub total_chunks: usize,
    /// Number of citation groups.
    pub citation_count: usize,
    /// Number of sources across all groups.
    pub source_count: usize,
}

/// Caller-facing job status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    /// Job identifier.
    pub job_id: JobId,
    /// Current state.
    pub state: JobState,
    /// Processor tier.
    pub processor: ProcessorTier,
    /// Original query.
    pub query: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Polling start time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Elapsed seconds (frozen once terminal).
    pub elapsed_seconds: f64,
    /// Remote run identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_run_id: Option<String>,
    /// Failure description (Failed only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Result counts (Complete only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ResultSummary>,
    /// First chunk of the answer (Complete only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_chunk: Option<String>,
    /// Citation groups (Complete only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<CitationGroup>,
}

/// One retrieved chunk with its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkView {
    /// Job identifier.
    pub job_id: JobId,
    /// 1-based chunk number.
    pub chunk_number: usize,
    /// Total chunks in the result.
    pub total_chunks: usize,
    /// Whether this is the final chunk.
    pub is_last: bool,
    /// Chunk text.
    pub content: String,
}

/// Listing entry for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    /// Job identifier.
    pub job_id: JobId,
    /// Current state.
    pub state: JobState,
    /// Processor tier.
    pub processor: ProcessorTier,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// First 50 characters of the query.
    pub query_preview: String,
}
