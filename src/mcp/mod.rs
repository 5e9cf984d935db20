//! MCP (Model Context Protocol) server for parallel-mcp.
//!
//! Exposes the research orchestrator to MCP clients: submit a job, poll
//! its status, page through long answers, run quick lite-tier lookups.
//!
//! # Feature Gate
//!
//! This module requires the `mcp` feature flag (enabled by default).
//!
//! # Architecture
//!
//! ```text
//! MCP Client (agent)
//!   ↓ submit_research(query, processor)
//! ResearchMcpServer
//!   ↓ PeerApprover (elicitation: approve? max wait?)
//! Orchestrator::submit_with()
//!   ├── create remote run
//!   └── spawn worker ──poll──► Parallel Task API
//!   ↓
//! job id → MCP Client ──research_status / fetch_research_chunk──► ...
//! ```

pub mod approval;
pub mod params;
pub mod server;
pub mod transport;

pub use approval::PeerApprover;
pub use params::{ApprovalForm, FetchChunkParams, JobIdParams, QuickResearchParams, SubmitResearchParams};
pub use server::ResearchMcpServer;
pub use transport::{serve_sse, serve_stdio};
