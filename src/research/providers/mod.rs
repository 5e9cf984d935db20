//! Concrete remote research API implementations.

pub mod parallel;

pub use parallel::ParallelClient;
