//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parallel_mcp::core::ProcessorTier;
use parallel_mcp::error::RemoteError;
use parallel_mcp::research::run::{OutputContent, TaskOutput};
use parallel_mcp::research::{
    Approver, Citation, CitationGroup, Confidence, Orchestrator, ResearchApi, ResearchConfig,
    RunHandle, RunStatus, TaskRunResult,
};

/// Remote API that reports active for the first `active_polls` status
/// calls (across all runs), then completes with a canned answer.
pub struct FakeResearchApi {
    active_polls: usize,
    content: String,
    citations: Vec<CitationGroup>,
    polls: AtomicUsize,
    runs: AtomicUsize,
}

impl FakeResearchApi {
    pub fn new(active_polls: usize, content: &str) -> Self {
        Self {
            active_polls,
            content: content.to_string(),
            citations: Vec::new(),
            polls: AtomicUsize::new(0),
            runs: AtomicUsize::new(0),
        }
    }

    pub fn with_citation(mut self, url: &str) -> Self {
        self.citations.push(CitationGroup {
            field: Some("output".to_string()),
            citations: vec![Citation {
                url: Some(url.to_string()),
                title: Some("Source".to_string()),
                excerpts: vec!["excerpt".to_string()],
            }],
            confidence: Some(Confidence::Label("high".to_string())),
            reasoning: Some("supported by source".to_string()),
        });
        self
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResearchApi for FakeResearchApi {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn create_run(
        &self,
        _query: &str,
        _processor: ProcessorTier,
    ) -> Result<RunHandle, RemoteError> {
        let n = self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(RunHandle {
            run_id: format!("run_{n}"),
            status: "queued".to_string(),
            is_active: true,
        })
    }

    async fn get_status(&self, run_id: &str) -> Result<RunStatus, RemoteError> {
        let n = self.polls.fetch_add(1, Ordering::SeqCst);
        let is_active = n < self.active_polls;
        Ok(RunStatus {
            run_id: run_id.to_string(),
            status: if is_active { "running" } else { "completed" }.to_string(),
            is_active,
            error: None,
        })
    }

    async fn get_result(&self, _run_id: &str) -> Result<TaskRunResult, RemoteError> {
        Ok(TaskRunResult {
            output: Some(TaskOutput {
                content: Some(OutputContent::Text(self.content.clone())),
                basis: self.citations.clone(),
            }),
        })
    }
}

/// Configuration with millisecond poll intervals.
pub fn fast_config() -> ResearchConfig {
    ResearchConfig::builder()
        .poll_interval(Duration::from_millis(5))
        .quick_poll_interval(Duration::from_millis(2))
        .retry_backoff(Duration::from_millis(1))
        .build()
}

pub fn orchestrator(api: Arc<FakeResearchApi>, approver: Arc<dyn Approver>) -> Orchestrator {
    let api: Arc<dyn ResearchApi> = api;
    Orchestrator::new(Some(api), approver, fast_config())
}
