//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// parallel-mcp: deep research jobs on the Parallel Task API.
///
/// Runs an MCP server that submits long-running research tasks, polls
/// them in the background and serves their results in chunks.
#[derive(Parser, Debug)]
#[command(name = "parallel-mcp")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Emit logs as JSON lines on stderr (also `LOG_FORMAT=json`).
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Also write rolling `system` and `errors` log files to this directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a research query and wait for the answer.
    ///
    /// Tiers other than lite ask for confirmation on the terminal unless
    /// `--yes` is given.
    #[command(after_help = r#"Examples:
  parallel-mcp research "What is OAuth 2.1?" --processor lite
  parallel-mcp research "Compare OAuth 2.1 vs JWT" --yes
  parallel-mcp --format json research "Kafka vs Pulsar" -p core --max-wait-secs 600
"#)]
    Research {
        /// Research question.
        query: String,

        /// Processor tier (see `parallel-mcp tiers`). Defaults to
        /// `DEFAULT_PROCESSOR` or `pro`.
        #[arg(short, long)]
        processor: Option<String>,

        /// Approve without prompting.
        #[arg(short, long)]
        yes: bool,

        /// Give up on the research after this many seconds.
        #[arg(long)]
        max_wait_secs: Option<u64>,
    },

    /// List processor tiers with their cost and expected duration.
    Tiers,

    /// Start the MCP (Model Context Protocol) server.
    #[cfg(feature = "mcp")]
    #[command(subcommand)]
    Mcp(McpCommands),
}

/// MCP server subcommands.
#[cfg(feature = "mcp")]
#[derive(Subcommand, Debug)]
pub enum McpCommands {
    /// Start MCP server with stdio transport.
    ///
    /// Reads JSON-RPC messages from stdin, writes responses to stdout.
    #[command(after_help = r#"Examples:
  parallel-mcp mcp stdio                              # Start stdio MCP server
  PARALLEL_API_KEY=... parallel-mcp mcp stdio         # With API key
  DEFAULT_PROCESSOR=core parallel-mcp mcp stdio       # Change default tier
"#)]
    Stdio,

    /// Start MCP server with SSE/HTTP transport.
    ///
    /// Listens for incoming HTTP connections using streamable HTTP transport.
    #[command(after_help = r#"Examples:
  parallel-mcp mcp sse                            # Listen on 127.0.0.1:3000
  parallel-mcp mcp sse --host 0.0.0.0 --port 8080
"#)]
    Sse {
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to.
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_research_args() {
        let cli = Cli::try_parse_from([
            "parallel-mcp",
            "--format",
            "json",
            "--log-dir",
            "/tmp/parallel-logs",
            "research",
            "What is OAuth?",
            "-p",
            "lite",
            "--yes",
            "--max-wait-secs",
            "90",
        ])
        .unwrap();
        assert_eq!(cli.format, "json");
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/parallel-logs")));
        let Commands::Research {
            query,
            processor,
            yes,
            max_wait_secs,
        } = cli.command
        else {
            panic!("expected research command");
        };
        assert_eq!(query, "What is OAuth?");
        assert_eq!(processor.as_deref(), Some("lite"));
        assert!(yes);
        assert_eq!(max_wait_secs, Some(90));
    }

    #[cfg(feature = "mcp")]
    #[test]
    fn test_mcp_sse_defaults() {
        let cli = Cli::try_parse_from(["parallel-mcp", "mcp", "sse"]).unwrap();
        let Commands::Mcp(McpCommands::Sse { host, port }) = cli.command else {
            panic!("expected mcp sse command");
        };
        assert_eq!(host, "127.0.0.1");
        assert_eq!(port, 3000);
    }
}
