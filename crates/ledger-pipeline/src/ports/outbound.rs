//! # Outbound Ports
//!
//! Traits for the ledger network and the identity collaborator.

use crate::domain::{
    CommitBatch, LedgerIdentity, OrderingAck, PipelineError, ProposalResponse, SignedProposal,
    TransactionEnvelope, TransportError,
};
use async_trait::async_trait;

/// A peer that executes and endorses proposals - outbound port.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Name used in logs and response attribution.
    fn name(&self) -> &str;

    /// Send one proposal and return the peer's answer.
    async fn process_proposal(
        &self,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse, TransportError>;
}

/// The ordering service - outbound port.
#[async_trait]
pub trait OrderingClient: Send + Sync {
    /// Submit an envelope for sequencing.
    async fn broadcast(&self, envelope: &TransactionEnvelope) -> Result<OrderingAck, TransportError>;
}

/// Stream of commit events from the ledger - outbound port.
#[async_trait]
pub trait CommitEventSource: Send + Sync {
    /// Return events from blocks after `after`, or from the current height
    /// when `after` is `None`, together with the height answered up to.
    /// May wait for new blocks before answering.
    async fn poll_commits(&self, after: Option<u64>) -> Result<CommitBatch, TransportError>;
}

/// Source of the enrolled identity - outbound port.
pub trait IdentityStore: Send + Sync {
    /// Load an enrolled identity, or fail with `IdentityNotEnrolled`.
    fn load_enrolled_identity(&self, name: &str) -> Result<LedgerIdentity, PipelineError>;
}
