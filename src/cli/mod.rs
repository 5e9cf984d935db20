//! CLI layer for parallel-mcp.
//!
//! Provides the command-line interface using clap: the MCP server
//! transports, one-shot research from the terminal and the tier table.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
#[cfg(feature = "mcp")]
pub use parser::McpCommands;
pub use parser::{Cli, Commands};
