//! Scripted [`ResearchApi`] for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::provider::ResearchApi;
use super::run::{OutputContent, RunErrorDetail, RunHandle, RunStatus, TaskOutput, TaskRunResult};
use crate::core::ProcessorTier;
use crate::error::RemoteError;

/// One scripted response to `get_status`.
#[derive(Debug, Clone, Copy)]
pub enum StatusStep {
    Active,
    Completed,
    Failed(&'static str),
    Error(u16),
    Panic,
}

pub struct ScriptedApi {
    steps: Mutex<VecDeque<StatusStep>>,
    fallback: StatusStep,
    content: String,
    create_error: Option<u16>,
    create_gate: Option<Arc<Notify>>,
    result_error: Option<u16>,
    create_calls: AtomicUsize,
    status_calls: AtomicUsize,
    last_processor: Mutex<Option<ProcessorTier>>,
}

fn http(status: u16) -> RemoteError {
    RemoteError::Http {
        status,
        message: format!("scripted {status}"),
        retry_after: None,
    }
}

impl ScriptedApi {
    /// Plays `steps` in order, then repeats the last one.
    pub fn new(steps: Vec<StatusStep>) -> Self {
        let fallback = steps.last().copied().unwrap_or(StatusStep::Completed);
        Self {
            steps: Mutex::new(steps.into()),
            fallback,
            content: "answer text".to_string(),
            create_error: None,
            create_gate: None,
            result_error: None,
            create_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            last_processor: Mutex::new(None),
        }
    }

    /// Reports `active` polls in progress, then completes with `content`.
    pub fn completing_after(active: usize, content: &str) -> Self {
        let mut steps = vec![StatusStep::Active; active];
        steps.push(StatusStep::Completed);
        Self::new(steps).with_content(content)
    }

    pub fn always_active() -> Self {
        Self::new(vec![StatusStep::Active])
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn with_create_error(mut self, status: u16) -> Self {
        self.create_error = Some(status);
        self
    }

    /// Holds `create_run` until `gate` is notified.
    pub fn with_create_gate(mut self, gate: Arc<Notify>) -> Self {
        self.create_gate = Some(gate);
        self
    }

    pub fn with_result_error(mut self, status: u16) -> Self {
        self.result_error = Some(status);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn last_processor(&self) -> Option<ProcessorTier> {
        *self.last_processor.lock().unwrap()
    }
}

#[async_trait]
impl ResearchApi for ScriptedApi {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn create_run(
        &self,
        _query: &str,
        processor: ProcessorTier,
    ) -> Result<RunHandle, RemoteError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_processor.lock().unwrap() = Some(processor);
        if let Some(gate) = &self.create_gate {
            gate.notified().await;
        }
        if let Some(status) = self.create_error {
            return Err(http(status));
        }
        Ok(RunHandle {
            run_id: "run_scripted".to_string(),
            status: "queued".to_string(),
            is_active: true,
        })
    }

    async fn get_status(&self, run_id: &str) -> Result<RunStatus, RemoteError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        let status = |label: &str, is_active: bool, error: Option<&str>| RunStatus {
            run_id: run_id.to_string(),
            status: label.to_string(),
            is_active,
            error: error.map(|message| RunErrorDetail {
                message: message.to_string(),
            }),
        };

        match step {
            StatusStep::Active => Ok(status("running", true, None)),
            StatusStep::Completed => Ok(status("completed", false, None)),
            StatusStep::Failed(message) => Ok(status("failed", false, Some(message))),
            StatusStep::Error(code) => Err(http(code)),
            StatusStep::Panic => panic!("scripted panic"),
        }
    }

    async fn get_result(&self, _run_id: &str) -> Result<TaskRunResult, RemoteError> {
        if let Some(status) = self.result_error {
            return Err(http(status));
        }
        Ok(TaskRunResult {
            output: Some(TaskOutput {
                content: Some(OutputContent::Text(self.content.clone())),
                basis: Vec::new(),
            }),
        })
    }
}
