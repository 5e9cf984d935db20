//! Caller approval for costly research runs.
//!
//! Every tier except `lite` asks an [`Approver`] before the remote run is
//! created. A decline leaves the job Cancelled with no remote call made.

use std::time::Duration;

use async_trait::async_trait;

use crate::core::ProcessorTier;

/// Description of a pending job shown to whoever approves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    /// Research query.
    pub query: String,
    /// Processor tier.
    pub processor: ProcessorTier,
    /// Approximate cost per 1,000 queries.
    pub estimated_cost: &'static str,
    /// Expected completion time.
    pub estimated_duration: &'static str,
}

impl ApprovalRequest {
    /// Builds a request with the tier's estimates.
    #[must_use]
    pub fn new(query: impl Into<String>, processor: ProcessorTier) -> Self {
        Self {
            query: query.into(),
            processor,
            estimated_cost: processor.cost_per_1k(),
            estimated_duration: processor.expected_duration(),
        }
    }

    /// Human-readable approval prompt.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "APPROVAL REQUIRED\n\n\
             Research Query: {}\n\
             Processor: {}\n\
             Estimated Time: {}\n\
             API Cost: {} per 1,000 queries\n\n\
             Approve this research task?",
            self.query, self.processor, self.estimated_duration, self.estimated_cost
        )
    }
}

/// Outcome of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalDecision {
    /// Whether the run may proceed.
    pub approved: bool,
    /// Deadline for the worker, if the approver set one.
    pub max_wait: Option<Duration>,
}

impl ApprovalDecision {
    /// Approve without a deadline.
    pub const APPROVED: Self = Self {
        approved: true,
        max_wait: None,
    };

    /// Decline.
    pub const DECLINED: Self = Self {
        approved: false,
        max_wait: None,
    };

    /// Approve with a worker deadline.
    #[must_use]
    pub const fn approved_with_deadline(max_wait: Duration) -> Self {
        Self {
            approved: true,
            max_wait: Some(max_wait),
        }
    }
}

/// Capability that approves or declines a pending job.
#[async_trait]
pub trait Approver: Send + Sync {
    /// Decides whether `request` may proceed.
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision;
}

/// Approves everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl Approver for AutoApprove {
    async fn decide(&self, _request: &ApprovalRequest) -> ApprovalDecision {
        ApprovalDecision::APPROVED
    }
}

/// Declines everything. Used when no interactive approver is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

#[async_trait]
impl Approver for DeclineAll {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
        tracing::info!(
            processor = %request.processor,
            "no approver available, declining research task"
        );
        ApprovalDecision::DECLINED
    }
}

/// Asks on the terminal: prompt on stderr, answer on stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinApprover;

#[async_trait]
impl Approver for StdinApprover {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
        let message = request.message();
        let answer = tokio::task::spawn_blocking(move || {
            use std::io::{BufRead, Write};

            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "{message} [y/N] ");
            let _ = stderr.flush();

            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) if matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes") => {
                ApprovalDecision::APPROVED
            }
            Ok(Ok(_)) => ApprovalDecision::DECLINED,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to read approval from stdin");
                ApprovalDecision::DECLINED
            }
            Err(e) => {
                tracing::warn!(error = %e, "approval prompt task failed");
                ApprovalDecision::DECLINED
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_tier_estimates() {
        let request = ApprovalRequest::new("Compare OAuth 2.1 vs JWT", ProcessorTier::Pro);
        assert_eq!(request.estimated_cost, "$100");
        assert_eq!(request.estimated_duration, "3-9min");

        let message = request.message();
        assert!(message.starts_with("APPROVAL REQUIRED"));
        assert!(message.contains("Research Query: Compare OAuth 2.1 vs JWT"));
        assert!(message.contains("Processor: pro"));
        assert!(message.contains("API Cost: $100 per 1,000 queries"));
    }

    #[tokio::test]
    async fn test_fixed_approvers() {
        let request = ApprovalRequest::new("q", ProcessorTier::Ultra);
        assert!(AutoApprove.decide(&request).await.approved);
        assert!(!DeclineAll.decide(&request).await.approved);
    }

    #[test]
    fn test_deadline_decision() {
        let decision = ApprovalDecision::approved_with_deadline(Duration::from_secs(900));
        assert!(decision.approved);
        assert_eq!(decision.max_wait, Some(Duration::from_secs(900)));
    }
}
