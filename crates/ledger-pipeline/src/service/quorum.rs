//! Quorum Evaluator - decides whether the responses may be ordered.
//!
//! Rules, applied to slots in peer order:
//! 1. At least one slot must exist.
//! 2. The first slot must be a response with status success. Anything else
//!    fails the whole request with that peer's message.
//! 3. With consistency checking on, every later response must also be a
//!    success carrying the same payload. Unreachable slots are skipped.

use crate::domain::{
    EndorsedProposal, PeerOutcome, PipelineError, ProposalResponse, RejectionCause,
    SignedProposal,
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct QuorumEvaluator {
    require_consistency: bool,
}

impl QuorumEvaluator {
    pub fn new(require_consistency: bool) -> Self {
        Self {
            require_consistency,
        }
    }

    pub fn evaluate(
        &self,
        proposal: SignedProposal,
        outcomes: Vec<PeerOutcome>,
    ) -> Result<EndorsedProposal, PipelineError> {
        let mut slots = outcomes.into_iter();

        let first = match slots.next() {
            None => {
                return Err(PipelineError::rejected(
                    RejectionCause::NoResponses,
                    "no peer responses received",
                ))
            }
            Some(Err(failure)) => {
                return Err(PipelineError::rejected(
                    RejectionCause::Unreachable,
                    failure.to_string(),
                ))
            }
            Some(Ok(response)) if !response.is_success() => {
                return Err(PipelineError::rejected(
                    RejectionCause::Endorsement(response.status),
                    response.describe(),
                ))
            }
            Some(Ok(response)) => response,
        };

        let mut endorsements = vec![first];
        for slot in slots {
            let response = match slot {
                Ok(response) => response,
                Err(failure) => {
                    debug!(peer = %failure.peer, "Skipping unreachable peer in quorum");
                    continue;
                }
            };

            if self.require_consistency {
                check_consistent(&endorsements[0], &response)?;
            }
            if response.is_success() {
                endorsements.push(response);
            }
        }

        Ok(EndorsedProposal::new(proposal, endorsements))
    }
}

fn check_consistent(
    first: &ProposalResponse,
    other: &ProposalResponse,
) -> Result<(), PipelineError> {
    if !other.is_success() {
        return Err(PipelineError::rejected(
            RejectionCause::Inconsistent,
            format!(
                "peer {} did not endorse: {}",
                other.peer,
                other.describe()
            ),
        ));
    }
    if other.payload != first.payload {
        return Err(PipelineError::rejected(
            RejectionCause::Inconsistent,
            format!(
                "peers {} and {} returned different results",
                first.peer, other.peer
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ChaincodeInvocation, EndorsementStatus, LedgerIdentity, PeerFailure, Proposal,
    };

    fn proposal() -> SignedProposal {
        let identity = LedgerIdentity::from_seed("user1", "Org1MSP", "", [4u8; 32]);
        let (tx_id, nonce) = identity.mint_transaction_id();
        let invocation = ChaincodeInvocation::new("mycc", "setCitizen", vec!["1".into()]);
        SignedProposal::sign(
            Proposal::for_invoke(&identity, "mychannel", invocation, tx_id, nonce),
            &identity,
        )
    }

    fn ok(peer: &str, payload: &[u8]) -> PeerOutcome {
        Ok(ProposalResponse {
            peer: peer.into(),
            status: EndorsementStatus::Success,
            message: String::new(),
            payload: payload.to_vec(),
            endorsement: None,
        })
    }

    fn status(peer: &str, status: EndorsementStatus, message: &str) -> PeerOutcome {
        Ok(ProposalResponse {
            peer: peer.into(),
            status,
            message: message.into(),
            payload: Vec::new(),
            endorsement: None,
        })
    }

    fn down(peer: &str) -> PeerOutcome {
        Err(PeerFailure {
            peer: peer.into(),
            message: "connection refused".into(),
        })
    }

    fn cause(err: PipelineError) -> RejectionCause {
        match err {
            PipelineError::ProposalRejected { cause, .. } => cause,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_all_agree() {
        let endorsed = QuorumEvaluator::new(true)
            .evaluate(proposal(), vec![ok("p0", b"r"), ok("p1", b"r")])
            .unwrap();
        assert_eq!(endorsed.responses().len(), 2);
        assert_eq!(endorsed.payload(), b"r");
    }

    #[test]
    fn test_empty_set_rejected() {
        let err = QuorumEvaluator::new(true).evaluate(proposal(), vec![]).unwrap_err();
        assert_eq!(cause(err), RejectionCause::NoResponses);
    }

    #[test]
    fn test_first_failure_is_fatal_with_peer_message() {
        let err = QuorumEvaluator::new(true)
            .evaluate(
                proposal(),
                vec![
                    status("p0", EndorsementStatus::NotFound, "Error 404: no such citizen"),
                    ok("p1", b"r"),
                ],
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Error 404: no such citizen");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_first_unreachable_is_fatal() {
        let err = QuorumEvaluator::new(false)
            .evaluate(proposal(), vec![down("p0"), ok("p1", b"r")])
            .unwrap_err();
        assert_eq!(cause(err), RejectionCause::Unreachable);
    }

    #[test]
    fn test_later_unreachable_is_skipped() {
        let endorsed = QuorumEvaluator::new(true)
            .evaluate(proposal(), vec![ok("p0", b"r"), down("p1"), ok("p2", b"r")])
            .unwrap();
        let peers: Vec<_> = endorsed.responses().iter().map(|r| r.peer.as_str()).collect();
        assert_eq!(peers, vec!["p0", "p2"]);
    }

    #[test]
    fn test_payload_mismatch_is_inconsistent() {
        let err = QuorumEvaluator::new(true)
            .evaluate(proposal(), vec![ok("p0", b"a"), ok("p1", b"b")])
            .unwrap_err();
        assert_eq!(cause(err), RejectionCause::Inconsistent);
    }

    #[test]
    fn test_later_failure_is_inconsistent() {
        let err = QuorumEvaluator::new(true)
            .evaluate(
                proposal(),
                vec![ok("p0", b"a"), status("p1", EndorsementStatus::Failed, "boom")],
            )
            .unwrap_err();
        assert_eq!(cause(err), RejectionCause::Inconsistent);
    }

    #[test]
    fn test_consistency_check_can_be_disabled() {
        let endorsed = QuorumEvaluator::new(false)
            .evaluate(
                proposal(),
                vec![
                    ok("p0", b"a"),
                    ok("p1", b"b"),
                    status("p2", EndorsementStatus::Failed, "boom"),
                ],
            )
            .unwrap();
        assert_eq!(endorsed.responses().len(), 2);
    }
}
