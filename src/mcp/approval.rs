//! Approval through MCP elicitation.

use std::time::Duration;

use async_trait::async_trait;
use rmcp::{Peer, RoleServer};

use super::params::ApprovalForm;
use crate::core::ProcessorTier;
use crate::research::{ApprovalDecision, ApprovalRequest, Approver};

/// Asks the connected MCP client to approve a research run.
///
/// A client that does not support elicitation, rejects the form or closes
/// the session counts as a decline.
#[derive(Clone)]
pub struct PeerApprover {
    peer: Peer<RoleServer>,
}

impl PeerApprover {
    /// Wraps the peer of the current request.
    pub const fn new(peer: Peer<RoleServer>) -> Self {
        Self { peer }
    }
}

/// Maps a submitted form to a decision for a run on `processor`.
///
/// An empty wait gets the tier's default deadline; 0 means no deadline.
pub fn decision_from_form(form: &ApprovalForm, processor: ProcessorTier) -> ApprovalDecision {
    if !form.approved {
        return ApprovalDecision::DECLINED;
    }
    match form.max_wait_minutes {
        None => ApprovalDecision::approved_with_deadline(processor.default_deadline()),
        Some(0) => ApprovalDecision::APPROVED,
        Some(minutes) => ApprovalDecision::approved_with_deadline(Duration::from_secs(
            u64::from(minutes) * 60,
        )),
    }
}

#[async_trait]
impl Approver for PeerApprover {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
        match self.peer.elicit::<ApprovalForm>(request.message()).await {
            Ok(Some(form)) => decision_from_form(&form, request.processor),
            Ok(None) => {
                tracing::info!(processor = %request.processor, "approval form dismissed");
                ApprovalDecision::DECLINED
            }
            Err(e) => {
                tracing::warn!(
                    processor = %request.processor,
                    error = %e,
                    "approval elicitation failed, treating as declined"
                );
                ApprovalDecision::DECLINED
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::research::testing::ScriptedApi;
    use crate::research::{DeclineAll, JobState, Orchestrator, ResearchApi, ResearchConfig};

    fn form(json: &str) -> ApprovalForm {
        serde_json::from_str(json).unwrap()
    }

    /// Answers every request with the same submitted form.
    struct FormApprover(ApprovalForm);

    #[async_trait]
    impl Approver for FormApprover {
        async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
            decision_from_form(&self.0, request.processor)
        }
    }

    #[test]
    fn test_form_mapping() {
        let declined = form(r#"{"approved": false, "max_wait_minutes": 15}"#);
        assert_eq!(
            decision_from_form(&declined, ProcessorTier::Pro),
            ApprovalDecision::DECLINED
        );

        let explicit = form(r#"{"approved": true, "max_wait_minutes": 15}"#);
        assert_eq!(
            decision_from_form(&explicit, ProcessorTier::Ultra8x).max_wait,
            Some(Duration::from_secs(900))
        );

        let unbounded = form(r#"{"approved": true, "max_wait_minutes": 0}"#);
        assert_eq!(
            decision_from_form(&unbounded, ProcessorTier::Pro),
            ApprovalDecision::APPROVED
        );
    }

    #[test]
    fn test_empty_wait_uses_tier_deadline() {
        let accepted = form(r#"{"approved": true}"#);
        for tier in ProcessorTier::ALL {
            let decision = decision_from_form(&accepted, tier);
            assert!(decision.approved);
            assert_eq!(decision.max_wait, Some(tier.default_deadline()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_form_outlasts_long_tier_run() {
        // 120 polls at 10s keeps the run active for 20 minutes.
        let api = Arc::new(ScriptedApi::completing_after(120, "deep answer"));
        let api_dyn: Arc<dyn ResearchApi> = api.clone();
        let config = ResearchConfig::builder()
            .poll_interval(Duration::from_secs(10))
            .build();
        let orch = Orchestrator::new(Some(api_dyn), Arc::new(DeclineAll), config);
        let approver = FormApprover(form(r#"{"approved": true}"#));

        let view = orch
            .submit_and_wait("q", Some("ultra8x"), &approver, Duration::from_secs(7200))
            .await
            .unwrap();
        assert_eq!(view.state, JobState::Complete, "error: {:?}", view.error);
        assert_eq!(view.first_chunk.as_deref(), Some("deep answer"));
        assert_eq!(api.status_calls(), 121);
    }
}
