//! Typed schema for the remote research API.
//!
//! These types decouple the worker from the HTTP client: the worker sees
//! [`RunStatus`] and [`TaskRunResult`], never raw JSON. Every field the
//! service may omit is modelled as `Option` or defaulted, so parsing a
//! partial response never needs to check for attributes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status label the service reports for a successful run.
pub const STATUS_COMPLETED: &str = "completed";

/// Handle returned when a run is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHandle {
    /// Remote run identifier.
    pub run_id: String,
    /// Initial status label (e.g. `"queued"`).
    #[serde(default)]
    pub status: String,
    /// Whether the run is still in progress.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// Error detail attached to a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunErrorDetail {
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,
}

/// Snapshot of a remote run's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    /// Remote run identifier.
    pub run_id: String,
    /// Status label: `queued`, `running`, `completed`, `failed`, `cancelled`...
    #[serde(default)]
    pub status: String,
    /// Whether the run is still in progress.
    pub is_active: bool,
    /// Error detail, present when the run failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunErrorDetail>,
}

impl RunStatus {
    /// A run succeeded when it is inactive, labelled `completed` and
    /// carries no error.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self.is_active && self.status == STATUS_COMPLETED && self.error.is_none()
    }

    /// Describes why an inactive run did not succeed.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        match &self.error {
            Some(detail) if !detail.message.is_empty() => {
                format!("remote run ended with status '{}': {}", self.status, detail.message)
            }
            _ => format!("remote run ended with status '{}'", self.status),
        }
    }
}

/// Full result of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRunResult {
    /// Run output. Absent when the service returned no output block.
    #[serde(default)]
    pub output: Option<TaskOutput>,
}

impl TaskRunResult {
    /// Extracts the free-text answer.
    ///
    /// Text content is returned as-is. A structured object yields its
    /// `"output"` entry (strings verbatim, anything else JSON-encoded), or
    /// the whole object encoded as JSON when there is no `"output"` key.
    #[must_use]
    pub fn content_text(&self) -> String {
        match self.output.as_ref().and_then(|o| o.content.as_ref()) {
            None => String::new(),
            Some(OutputContent::Text(text)) => text.clone(),
            Some(OutputContent::Structured(map)) => match map.get("output") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => Value::Object(map.clone()).to_string(),
            },
        }
    }

    /// Citation groups backing the answer.
    #[must_use]
    pub fn citation_groups(&self) -> Vec<CitationGroup> {
        self.output
            .as_ref()
            .map(|o| o.basis.clone())
            .unwrap_or_default()
    }
}

/// The `output` block of a run result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Answer content.
    #[serde(default)]
    pub content: Option<OutputContent>,
    /// Per-field research basis (citations, reasoning, confidence).
    #[serde(default)]
    pub basis: Vec<CitationGroup>,
}

/// Answer content: plain text or a structured JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputContent {
    /// Plain text answer.
    Text(String),
    /// Structured answer.
    Structured(serde_json::Map<String, Value>),
}

/// A citation group binding one output field to its supporting sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationGroup {
    /// Output field this group justifies.
    #[serde(default)]
    pub field: Option<String>,
    /// Supporting sources.
    #[serde(default)]
    pub citations: Vec<Citation>,
    /// Confidence annotation.
    #[serde(default)]
    pub confidence: Option<Confidence>,
    /// Reasoning behind the field's value.
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// A single source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Source URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Source title.
    #[serde(default)]
    pub title: Option<String>,
    /// Relevant excerpts.
    #[serde(default)]
    pub excerpts: Vec<String>,
}

/// Confidence as reported by the service: a label (`"high"`) or a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    /// Categorical confidence.
    Label(String),
    /// Numeric confidence.
    Score(f64),
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) => f.write_str(label),
            Self::Score(score) => write!(f, "{score}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> TaskRunResult {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_content() {
        let result = parse(r#"{"output": {"type": "text", "content": "answer text", "basis": []}}"#);
        assert_eq!(result.content_text(), "answer text");
        assert!(result.citation_groups().is_empty());
    }

    #[test]
    fn test_structured_content_output_key() {
        let result = parse(r#"{"output": {"type": "json", "content": {"output": "summary"}}}"#);
        assert_eq!(result.content_text(), "summary");
    }

    #[test]
    fn test_structured_content_non_string_output() {
        let result = parse(r#"{"output": {"content": {"output": {"a": 1}}}}"#);
        assert_eq!(result.content_text(), r#"{"a":1}"#);
    }

    #[test]
    fn test_structured_content_without_output_key() {
        let result = parse(r#"{"output": {"content": {"answer": "x"}}}"#);
        assert_eq!(result.content_text(), r#"{"answer":"x"}"#);
    }

    #[test]
    fn test_missing_output() {
        let result = parse(r#"{"run": {"run_id": "r1"}}"#);
        assert_eq!(result.content_text(), "");
        assert!(result.citation_groups().is_empty());
    }

    #[test]
    fn test_partial_basis() {
        let result = parse(
            r#"{"output": {"content": "c", "basis": [
                {"field": "output", "confidence": "high", "reasoning": "r",
                 "citations": [{"url": "https://example.com", "excerpts": ["e1"]}]},
                {"confidence": 0.4}
            ]}}"#,
        );
        let groups = result.citation_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].field.as_deref(), Some("output"));
        assert_eq!(groups[0].citations[0].title, None);
        assert_eq!(groups[0].citations[0].excerpts, vec!["e1".to_string()]);
        assert_eq!(groups[0].confidence, Some(Confidence::Label("high".to_string())));
        assert_eq!(groups[1].confidence, Some(Confidence::Score(0.4)));
        assert!(groups[1].citations.is_empty());
    }

    #[test]
    fn test_run_status_outcomes() {
        let done: RunStatus =
            serde_json::from_str(r#"{"run_id": "r", "status": "completed", "is_active": false}"#)
                .unwrap();
        assert!(done.succeeded());

        let failed: RunStatus = serde_json::from_str(
            r#"{"run_id": "r", "status": "failed", "is_active": false,
                "error": {"message": "quota exceeded"}}"#,
        )
        .unwrap();
        assert!(!failed.succeeded());
        assert_eq!(
            failed.failure_reason(),
            "remote run ended with status 'failed': quota exceeded"
        );

        let running: RunStatus =
            serde_json::from_str(r#"{"run_id": "r", "status": "running", "is_active": true}"#)
                .unwrap();
        assert!(!running.succeeded());
    }
}
