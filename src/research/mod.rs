//! Asynchronous research job orchestration.
//!
//! A submitted query becomes a [`JobRecord`] in the [`JobRegistry`]. After
//! approval the remote run is created and a background [`worker`] polls it
//! until it finishes, installing either a chunked [`ResearchResult`] or an
//! error. Callers only ever observe jobs through [`Orchestrator`].
//!
//! # Architecture
//!
//! ```text
//! caller ──submit──► Orchestrator ──approve?──► Approver
//!                         │
//!                         ├──create_run──► ResearchApi
//!                         │
//!                         └──spawn──► worker ──poll/fetch──► ResearchApi
//!                                        │
//!                                        └──update──► JobRegistry (watch per job)
//! ```

pub mod approval;
pub mod client;
pub mod config;
pub mod job;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod run;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use approval::{
    ApprovalDecision, ApprovalRequest, Approver, AutoApprove, DeclineAll, StdinApprover,
};
pub use client::create_client;
pub use config::{ResearchConfig, ResearchConfigBuilder};
pub use job::{
    ChunkView, JobId, JobRecord, JobState, JobSummary, ResearchResult, ResultSummary, StatusView,
};
pub use orchestrator::{Orchestrator, SubmitReceipt};
pub use provider::ResearchApi;
pub use registry::{JobEntry, JobRegistry};
pub use run::{Citation, CitationGroup, Confidence, RunHandle, RunStatus, TaskRunResult};
