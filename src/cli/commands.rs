//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use std::sync::Arc;
use std::time::Duration;

use crate::cli::output::{OutputFormat, format_research, format_tiers};
#[cfg(feature = "mcp")]
use crate::cli::parser::McpCommands;
use crate::cli::parser::{Cli, Commands};
use crate::error::{CommandError, Result};
use crate::research::{
    Approver, AutoApprove, JobState, Orchestrator, ResearchConfig, StatusView, StdinApprover,
};

/// Executes the CLI command.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Research {
            query,
            processor,
            yes,
            max_wait_secs,
        } => cmd_research(query, processor.as_deref(), *yes, *max_wait_secs, format),
        Commands::Tiers => Ok(format_tiers(format)),

        // ── MCP server ───────────────────────────────────────────
        #[cfg(feature = "mcp")]
        Commands::Mcp(sub) => cmd_mcp(sub),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

fn research_config(yes: bool, max_wait_secs: Option<u64>) -> ResearchConfig {
    let mut builder = ResearchConfig::builder();
    if yes {
        builder = builder.auto_approve(true);
    }
    if let Some(secs) = max_wait_secs {
        builder = builder.max_wait(Duration::from_secs(secs));
    }
    builder.from_env().build()
}

fn cmd_research(
    query: &str,
    processor: Option<&str>,
    yes: bool,
    max_wait_secs: Option<u64>,
    format: OutputFormat,
) -> Result<String> {
    if query.trim().is_empty() {
        return Err(CommandError::InvalidArgument("query cannot be empty".to_string()).into());
    }

    let config = research_config(yes, max_wait_secs);
    let approver: Arc<dyn Approver> = if config.auto_approve {
        Arc::new(AutoApprove)
    } else {
        Arc::new(StdinApprover)
    };

    let rt = runtime()?;
    rt.block_on(async {
        let orchestrator = Orchestrator::from_config(config)?;
        let view = orchestrator
            .submit_and_wait(query, processor, approver.as_ref(), Duration::MAX)
            .await?;
        render_research(&orchestrator, &view, format)
    })
}

fn render_research(
    orchestrator: &Orchestrator,
    view: &StatusView,
    format: OutputFormat,
) -> Result<String> {
    match view.state {
        JobState::Complete => {
            let job_id = view.job_id.to_string();
            let total = view.summary.as_ref().map_or(1, |s| s.total_chunks);
            let mut content = String::new();
            for n in 1..=total {
                content.push_str(&orchestrator.fetch_chunk(&job_id, n)?.content);
            }
            Ok(format_research(view, &content, format))
        }
        JobState::Cancelled => match format {
            OutputFormat::Text => Ok("Research cancelled.\n".to_string()),
            OutputFormat::Json | OutputFormat::Ndjson => Ok(format.to_json(view)),
        },
        state => Err(CommandError::ExecutionFailed(
            view.error
                .clone()
                .unwrap_or_else(|| format!("research ended in state {state}")),
        )
        .into()),
    }
}

#[cfg(feature = "mcp")]
fn cmd_mcp(cmd: &McpCommands) -> Result<String> {
    use crate::mcp::{ResearchMcpServer, serve_sse, serve_stdio};

    let server = ResearchMcpServer::from_config(ResearchConfig::from_env()).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create MCP server: {e}"))
    })?;

    let rt = runtime()?;
    rt.block_on(async {
        match cmd {
            McpCommands::Stdio => serve_stdio(server).await,
            McpCommands::Sse { host, port } => serve_sse(server, host, *port).await,
        }
    })
    .map_err(|e| CommandError::ExecutionFailed(format!("MCP server error: {e}")))?;

    Ok(String::new())
}
