//! MCP tool parameter types.
//!
//! Defines the input schemas for MCP tools using `schemars` for automatic
//! JSON Schema generation required by the MCP protocol.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default `quick_research` wait, in seconds.
pub const DEFAULT_QUICK_TIMEOUT_SECS: u64 = 120;

/// Parameters for the `submit_research` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubmitResearchParams {
    /// Research question, e.g. "Compare authentication approaches for microservices".
    pub query: String,

    /// Processor tier: `lite`, `base`, `core`, `core2x`, `pro`, `ultra`,
    /// `ultra2x`, `ultra4x` or `ultra8x`. Unknown values use the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,
}

/// Parameters for tools that address a single job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobIdParams {
    /// Job identifier returned by `submit_research`.
    pub job_id: String,
}

/// Parameters for the `fetch_research_chunk` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchChunkParams {
    /// Job identifier returned by `submit_research`.
    pub job_id: String,

    /// 1-based chunk number.
    pub chunk_number: usize,
}

/// Parameters for the `quick_research` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuickResearchParams {
    /// Quick research question.
    pub query: String,

    /// Seconds to wait for the answer before returning the job id instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Form the client fills in to approve a costly research run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ApprovalForm {
    /// Approve this research task.
    pub approved: bool,

    /// Minutes to wait for the research before giving up. Leave empty for
    /// a deadline sized to the tier; 0 waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wait_minutes: Option<u32>,
}

rmcp::elicit_safe!(ApprovalForm);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_processor_optional() {
        let params: SubmitResearchParams =
            serde_json::from_str(r#"{"query": "Compare OAuth 2.1 vs JWT"}"#).unwrap();
        assert!(params.processor.is_none());
    }

    #[test]
    fn test_approval_form_wait_optional() {
        let form: ApprovalForm = serde_json::from_str(r#"{"approved": true}"#).unwrap();
        assert!(form.approved);
        assert_eq!(form.max_wait_minutes, None);
    }

    #[test]
    fn test_negative_chunk_rejected() {
        let parsed = serde_json::from_str::<FetchChunkParams>(r#"{"job_id": "x", "chunk_number": -1}"#);
        assert!(parsed.is_err());
    }
}
