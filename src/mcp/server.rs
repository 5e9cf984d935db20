//! MCP server implementation for parallel-mcp.
//!
//! Exposes the research orchestrator as MCP tools. All sessions share one
//! [`Orchestrator`], so a job submitted in one session can be polled from
//! another.

use std::sync::Arc;
use std::time::Duration;

use rmcp::handler::server::router::prompt::PromptRouter;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, GetPromptRequestParams, GetPromptResult, Implementation,
    ListPromptsResult, PaginatedRequestParams, PromptMessage, PromptMessageRole, ProtocolVersion,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, prompt, prompt_handler, prompt_router, tool,
    tool_handler, tool_router,
};
use serde::Serialize;
use serde_json::json;

use super::approval::PeerApprover;
use super::params::{
    DEFAULT_QUICK_TIMEOUT_SECS, FetchChunkParams, JobIdParams, QuickResearchParams,
    SubmitResearchParams,
};
use crate::core::ProcessorTier;
use crate::error::JobError;
use crate::research::{JobState, Orchestrator, ResearchConfig};

/// Session-start notice sent to clients as server instructions.
pub const SESSION_NOTICE: &str = "Parallel deep research for architecture decisions.\n\n\
IMPORTANT NOTICES:\n\
- Research tasks take 1-5 minutes (core) or 3-9 minutes (pro) to complete\n\
- Each query incurs API costs ($30-$100 per 1000 queries)\n\
- Always request user permission before initiating research\n\
- Citations are provided for verification\n\n\
Use `submit_research` to start a job (approval is requested for every tier except lite), \
`research_status` to poll it and `fetch_research_chunk` to page through long answers. \
`quick_research` runs the lite tier and waits for the answer.";

/// Text of the `research_session_start` prompt.
pub const SESSION_PROMPT: &str = "You are about to use Parallel's deep research API for architecture decisions.\n\n\
IMPORTANT NOTICES:\n\
- Research tasks take 1-5 minutes (core) or 3-9 minutes (pro) to complete\n\
- Each query incurs API costs ($30-$100 per 1000 queries)\n\
- Always request user permission before initiating research\n\
- Citations are provided for verification\n\n\
What would you like me to research? (I'll ask for approval before starting)";

/// Converts an orchestrator error into an MCP error.
fn to_mcp_error(err: &JobError) -> McpError {
    match err {
        JobError::NotFound { .. } => McpError::resource_not_found(err.to_string(), None),
        JobError::NotReady { .. } | JobError::ChunkOutOfRange { .. } => {
            McpError::invalid_params(err.to_string(), None)
        }
        _ => McpError::internal_error(err.to_string(), None),
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Parallel research MCP server.
///
/// Provides tools to submit research jobs, poll their status and page
/// through results.
#[derive(Clone)]
pub struct ResearchMcpServer {
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
    orchestrator: Arc<Orchestrator>,
}

#[tool_router]
impl ResearchMcpServer {
    /// Submit a deep research job and return its id immediately.
    #[tool(
        name = "submit_research",
        description = "Start a deep research job on Parallel AI for an architecture decision. Asks the user for approval (with a cost and time estimate) unless the tier is lite. Returns a job id immediately; poll it with research_status."
    )]
    async fn submit_research(
        &self,
        Parameters(params): Parameters<SubmitResearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let approver = PeerApprover::new(context.peer.clone());
        let receipt = self
            .orchestrator
            .submit_with(&params.query, params.processor.as_deref(), &approver)
            .await
            .map_err(|e| to_mcp_error(&e))?;

        let message = if receipt.state == JobState::Cancelled {
            "Research cancelled: approval was declined.".to_string()
        } else {
            format!(
                "Research started. Expected completion in {}. Poll research_status with the job id.",
                receipt.processor.expected_duration()
            )
        };

        json_result(&json!({
            "job_id": receipt.job_id,
            "processor": receipt.processor,
            "state": receipt.state,
            "estimated_cost_per_1k": receipt.processor.cost_per_1k(),
            "estimated_duration": receipt.processor.expected_duration(),
            "message": message,
        }))
    }

    /// Report a job's state, elapsed time and, once complete, its summary.
    #[tool(
        name = "research_status",
        description = "Get the status of a research job: state, elapsed seconds and, when complete, a result summary with the first chunk of the answer and its citations."
    )]
    async fn research_status(
        &self,
        Parameters(params): Parameters<JobIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let view = self
            .orchestrator
            .status(&params.job_id)
            .map_err(|e| to_mcp_error(&e))?;
        json_result(&view)
    }

    /// Return one chunk of a completed job's answer.
    #[tool(
        name = "fetch_research_chunk",
        description = "Fetch one chunk (1-based) of a completed research answer. Long answers are split into chunks; research_status reports the total."
    )]
    async fn fetch_research_chunk(
        &self,
        Parameters(params): Parameters<FetchChunkParams>,
    ) -> Result<CallToolResult, McpError> {
        let chunk = self
            .orchestrator
            .fetch_chunk(&params.job_id, params.chunk_number)
            .map_err(|e| to_mcp_error(&e))?;
        json_result(&chunk)
    }

    /// Run a lite-tier query and wait for the answer.
    #[tool(
        name = "quick_research",
        description = "Quick research on the lite tier (5-60s, $5 per 1000 queries, no approval). Waits for the answer; if it takes longer than timeout_secs the job id is returned for polling."
    )]
    async fn quick_research(
        &self,
        Parameters(params): Parameters<QuickResearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let approver = PeerApprover::new(context.peer.clone());
        let timeout =
            Duration::from_secs(params.timeout_secs.unwrap_or(DEFAULT_QUICK_TIMEOUT_SECS));

        match self
            .orchestrator
            .submit_and_wait(
                &params.query,
                Some(ProcessorTier::Lite.as_str()),
                &approver,
                timeout,
            )
            .await
        {
            Ok(view) => json_result(&view),
            Err(JobError::WaitTimedOut { job_id, state, .. }) => json_result(&json!({
                "job_id": job_id,
                "state": state,
                "message": format!(
                    "Still running after {}s. Poll research_status with the job id.",
                    timeout.as_secs()
                ),
            })),
            Err(e) => Err(to_mcp_error(&e)),
        }
    }

    /// List every job known to this server.
    #[tool(
        name = "list_research_jobs",
        description = "List all research jobs known to this server, newest first, with state, tier and a query preview."
    )]
    async fn list_research_jobs(&self) -> Result<CallToolResult, McpError> {
        json_result(&self.orchestrator.list())
    }
}

#[prompt_router]
impl ResearchMcpServer {
    /// Session opener reminding the user of cost, duration and approval.
    #[prompt(
        name = "research_session_start",
        description = "Start Parallel Research Session: usage notes on cost, duration and approval before the first research request."
    )]
    async fn research_session_start(&self) -> Vec<PromptMessage> {
        vec![PromptMessage::new_text(
            PromptMessageRole::User,
            SESSION_PROMPT,
        )]
    }
}

#[tool_handler]
#[prompt_handler]
impl ServerHandler for ResearchMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "parallel-mcp".to_string(),
                title: Some("Parallel Research MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(SESSION_NOTICE.to_string()),
        }
    }
}

impl ResearchMcpServer {
    /// Creates a server around an existing orchestrator.
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
            orchestrator,
        }
    }

    /// Creates a server with an orchestrator built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote client cannot be created.
    pub fn from_config(config: ResearchConfig) -> Result<Self, crate::error::Error> {
        let orchestrator = Orchestrator::from_config(config)?;
        Ok(Self::new(Arc::new(orchestrator)))
    }

    /// The shared orchestrator.
    pub const fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::AutoApprove;

    fn server() -> ResearchMcpServer {
        let orchestrator = Orchestrator::new(None, Arc::new(AutoApprove), ResearchConfig::default());
        ResearchMcpServer::new(Arc::new(orchestrator))
    }

    #[test]
    fn test_info_carries_notice() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, "parallel-mcp");
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("Always request user permission"));
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.prompts.is_some());
    }

    #[test]
    fn test_tools_registered() {
        let names: Vec<String> = ResearchMcpServer::tool_router()
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        for expected in [
            "submit_research",
            "research_status",
            "fetch_research_chunk",
            "quick_research",
            "list_research_jobs",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing tool {expected}");
        }
    }

    #[tokio::test]
    async fn test_session_prompt_listed() {
        let prompts = ResearchMcpServer::prompt_router().list_all();
        let session = prompts
            .iter()
            .find(|p| p.name == "research_session_start")
            .expect("session prompt registered");
        assert!(session.description.as_deref().unwrap().contains("Start Parallel Research Session"));

        let messages = server().research_session_start().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, PromptMessageRole::User);
        let rmcp::model::PromptMessageContent::Text { text } = &messages[0].content else {
            panic!("expected text prompt");
        };
        assert!(text.contains("Always request user permission"));
    }

    #[tokio::test]
    async fn test_status_unknown_job_not_found() {
        let err = server()
            .research_status(Parameters(JobIdParams {
                job_id: "nonexistent-id".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::RESOURCE_NOT_FOUND);
        assert!(err.message.contains("job not found"));
    }

    #[tokio::test]
    async fn test_list_empty() {
        let result = server().list_research_jobs().await.unwrap();
        assert_eq!(result.is_error, Some(false));
    }

    #[test]
    fn test_error_mapping() {
        let err = to_mcp_error(&JobError::RemoteUnavailable);
        assert_eq!(err.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
        assert!(err.message.contains("PARALLEL_API_KEY"));

        let err = to_mcp_error(&JobError::ChunkOutOfRange { chunk: 4, total: 3 });
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }
}
