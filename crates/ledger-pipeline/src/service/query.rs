//! Query Executor - read-only proposal path.
//!
//! No transaction id, no ordering, no commit wait. One response is
//! expected; extra responses are logged and the first one is used.

use super::broadcaster::ProposalBroadcaster;
use crate::domain::{PipelineError, RejectionCause, SignedProposal};
use crate::ports::PeerClient;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct QueryExecutor {
    broadcaster: ProposalBroadcaster,
}

impl QueryExecutor {
    pub fn new(broadcaster: ProposalBroadcaster) -> Self {
        Self { broadcaster }
    }

    /// Evaluate `proposal` and return the payload of the first response.
    pub async fn execute(
        &self,
        peers: &[Arc<dyn PeerClient>],
        proposal: &SignedProposal,
    ) -> Result<Vec<u8>, PipelineError> {
        let outcomes = self.broadcaster.broadcast(peers, proposal).await;

        if outcomes.len() > 1 {
            warn!(
                responses = outcomes.len(),
                function = %proposal.proposal.invocation.function,
                "Query expected exactly one response, using the first"
            );
        }

        match outcomes.into_iter().next() {
            None => Err(PipelineError::rejected(
                RejectionCause::NoResponses,
                "no peer responses received",
            )),
            Some(Err(failure)) => Err(PipelineError::rejected(
                RejectionCause::Unreachable,
                failure.to_string(),
            )),
            Some(Ok(response)) if !response.is_success() => Err(PipelineError::rejected(
                RejectionCause::Endorsement(response.status),
                response.describe(),
            )),
            Some(Ok(response)) => Ok(response.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockPeer;
    use crate::domain::{ChaincodeInvocation, EndorsementStatus, LedgerIdentity, Proposal};
    use std::time::Duration;

    fn proposal() -> SignedProposal {
        let identity = LedgerIdentity::from_seed("user1", "Org1MSP", "", [8u8; 32]);
        let invocation =
            ChaincodeInvocation::new("mycc", "getCitizenCJIB", vec!["123456789".into()]);
        SignedProposal::sign(Proposal::for_query(&identity, "mychannel", invocation), &identity)
    }

    fn executor() -> QueryExecutor {
        QueryExecutor::new(ProposalBroadcaster::new(Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn test_returns_payload_unchanged() {
        let peers: Vec<Arc<dyn PeerClient>> =
            vec![Arc::new(MockPeer::endorsing("peer0", b"{\"bsn\":\"1\"}".to_vec()))];
        let payload = executor().execute(&peers, &proposal()).await.unwrap();
        assert_eq!(payload, b"{\"bsn\":\"1\"}");
    }

    #[tokio::test]
    async fn test_error_response_is_rejection() {
        let peers: Vec<Arc<dyn PeerClient>> = vec![Arc::new(MockPeer::answering(
            "peer0",
            EndorsementStatus::NotFound,
            "transaction returned with failure: Error 404: citizen not found",
        ))];
        let err = executor().execute(&peers, &proposal()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_multiple_responses_use_first() {
        let peers: Vec<Arc<dyn PeerClient>> = vec![
            Arc::new(MockPeer::endorsing("peer0", b"first".to_vec())),
            Arc::new(MockPeer::endorsing("peer1", b"second".to_vec())),
        ];
        let payload = executor().execute(&peers, &proposal()).await.unwrap();
        assert_eq!(payload, b"first");
    }

    #[tokio::test]
    async fn test_no_peers() {
        let err = executor().execute(&[], &proposal()).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ProposalRejected {
                cause: RejectionCause::NoResponses,
                ..
            }
        ));
    }
}
