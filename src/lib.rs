//! # parallel-mcp
//!
//! MCP server and CLI for deep research on the Parallel Task API.
//!
//! Research runs take from seconds to tens of minutes, so every query
//! becomes a background job: the caller gets a job id immediately, a
//! worker polls the remote run, and the answer is served back in chunks
//! small enough for an agent's context window.
//!
//! ## Modules
//!
//! - [`core`]: processor tiers and result chunking (pure data)
//! - [`research`]: job records, registry, polling worker, orchestrator and
//!   the remote API client
//! - [`mcp`]: MCP tools and transports (feature `mcp`)
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use parallel_mcp::research::{AutoApprove, Orchestrator, ResearchConfig};
//!
//! # async fn run() -> parallel_mcp::Result<()> {
//! let orchestrator = Orchestrator::from_config(ResearchConfig::from_env())?;
//! let receipt = orchestrator.submit_with("What is OAuth 2.1?", Some("lite"), &AutoApprove).await?;
//! let view = orchestrator
//!     .wait(&receipt.job_id.to_string(), Duration::from_secs(120))
//!     .await?;
//! println!("{}", view.state);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod logging;
#[cfg(feature = "mcp")]
pub mod mcp;
pub mod research;

pub use error::{Error, Result};
pub use research::{Orchestrator, ResearchConfig};
