//! Proposal Broadcaster - concurrent fan-out of a signed proposal.
//!
//! Every peer is contacted before any answer is awaited. Slots come back in
//! peer order; an unreachable or slow peer fills its slot with a
//! [`PeerFailure`] without holding up the others beyond its deadline.

use crate::domain::{PeerFailure, PeerOutcome, SignedProposal};
use crate::ports::PeerClient;
use futures::future::join_all;
use ledger_telemetry::log_peer_event;
use ledger_telemetry::metrics::PROPOSALS_TOTAL;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ProposalBroadcaster {
    per_peer_timeout: Duration,
}

impl ProposalBroadcaster {
    pub fn new(per_peer_timeout: Duration) -> Self {
        Self { per_peer_timeout }
    }

    /// Send `proposal` to all `peers` and collect one outcome per peer.
    pub async fn broadcast(
        &self,
        peers: &[Arc<dyn PeerClient>],
        proposal: &SignedProposal,
    ) -> Vec<PeerOutcome> {
        join_all(peers.iter().map(|peer| self.send_one(peer.as_ref(), proposal))).await
    }

    async fn send_one(&self, peer: &dyn PeerClient, proposal: &SignedProposal) -> PeerOutcome {
        let outcome =
            match tokio::time::timeout(self.per_peer_timeout, peer.process_proposal(proposal)).await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(e)) => Err(PeerFailure {
                    peer: peer.name().to_string(),
                    message: e.to_string(),
                }),
                Err(_) => Err(PeerFailure {
                    peer: peer.name().to_string(),
                    message: format!(
                        "no response within {}ms",
                        self.per_peer_timeout.as_millis()
                    ),
                }),
            };

        match &outcome {
            Ok(response) if response.is_success() => {
                PROPOSALS_TOTAL.with_label_values(&["endorsed"]).inc();
                log_peer_event!(debug, "Proposal endorsed", peer.name());
            }
            Ok(response) => {
                PROPOSALS_TOTAL.with_label_values(&["rejected"]).inc();
                log_peer_event!(
                    info,
                    "Proposal not endorsed",
                    peer.name(),
                    status = %response.status,
                    message = %response.message
                );
            }
            Err(failure) => {
                PROPOSALS_TOTAL.with_label_values(&["unreachable"]).inc();
                log_peer_event!(warn, "Peer did not answer proposal", peer.name(), error = %failure.message);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockPeer, PeerScript};
    use crate::domain::{ChaincodeInvocation, EndorsementStatus, LedgerIdentity, Proposal};

    fn proposal() -> SignedProposal {
        let identity = LedgerIdentity::from_seed("user1", "Org1MSP", "", [2u8; 32]);
        let invocation = ChaincodeInvocation::new("mycc", "getCitizenCJIB", vec!["1".into()]);
        SignedProposal::sign(Proposal::for_query(&identity, "mychannel", invocation), &identity)
    }

    #[tokio::test]
    async fn test_slots_follow_peer_order() {
        let peers: Vec<Arc<dyn PeerClient>> = vec![
            Arc::new(MockPeer::unreachable("peer0")),
            Arc::new(MockPeer::endorsing("peer1", b"x".to_vec())),
            Arc::new(MockPeer::answering("peer2", EndorsementStatus::Failed, "boom")),
        ];
        let outcomes = ProposalBroadcaster::new(Duration::from_secs(1))
            .broadcast(&peers, &proposal())
            .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].as_ref().unwrap_err().peer, "peer0");
        assert!(outcomes[1].as_ref().unwrap().is_success());
        assert_eq!(outcomes[2].as_ref().unwrap().status, EndorsementStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_peer_times_out_without_blocking_others() {
        let stalled = Arc::new(MockPeer::new("peer0", PeerScript::Stall));
        let healthy = Arc::new(MockPeer::endorsing("peer1", b"x".to_vec()));
        let peers: Vec<Arc<dyn PeerClient>> = vec![stalled.clone(), healthy.clone()];

        let outcomes = ProposalBroadcaster::new(Duration::from_secs(3))
            .broadcast(&peers, &proposal())
            .await;

        assert!(outcomes[0].as_ref().unwrap_err().message.contains("3000ms"));
        assert!(outcomes[1].is_ok());
        assert_eq!(stalled.calls(), 1);
        assert_eq!(healthy.calls(), 1);
    }

    #[tokio::test]
    async fn test_no_peers_yields_no_outcomes() {
        let outcomes = ProposalBroadcaster::new(Duration::from_secs(1))
            .broadcast(&[], &proposal())
            .await;
        assert!(outcomes.is_empty());
    }
}
