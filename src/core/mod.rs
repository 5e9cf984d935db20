//! Pure domain data shared by the orchestrator, the MCP layer and the CLI.
//!
//! Nothing in here performs I/O: processor tiers are static configuration
//! data and chunking is a deterministic function over a string.

pub mod chunking;
pub mod tier;

pub use chunking::{CHUNK_CHAR_LIMIT, ChunkedText, TOKEN_THRESHOLD, chunk_text, estimate_tokens};
pub use tier::ProcessorTier;
