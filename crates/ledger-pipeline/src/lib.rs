//! # Ledger Pipeline
//!
//! Transaction submission and confirmation against a permissioned ledger
//! network of endorsing peers and an ordering service.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Broadcast a signed proposal to every peer on the channel
//! - Check that the endorsements succeeded and agree
//! - Hand the signed envelope to the ordering service
//! - Wait, bounded by a deadline, for the commit event of the transaction
//!
//! Queries take a shorter path: proposal out, first payload back.
//!
//! ## Guarantees
//!
//! | Guarantee | Where |
//! |-----------|-------|
//! | One transaction id per invoke, used in every phase | `TransactionOrchestrator::invoke` |
//! | Listener registered before submission | `TransactionOrchestrator::run_invoke` |
//! | No envelope without a passed quorum | `EndorsedProposal` is crate-constructed only |
//! | No registration outlives its request | `CommitSubscription` unregisters on drop |
//!
//! ## Module Structure
//!
//! ```text
//! ledger-pipeline/
//! ├── domain/          # Ids, status codes, proposals, envelopes, errors
//! ├── ports/           # TransactionApi, PeerClient, OrderingClient, ...
//! ├── adapters/        # Commit event hub, HTTP clients, commit feed, mocks
//! └── service/         # Broadcaster, quorum, submitter, listener, query, orchestrator
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    CommitEventHub, CommitFeed, CommitFeedConfig, CommitNotification, CommitSubscription,
    FileIdentityStore, HttpOrderingClient, HttpPeerClient, MockOrderer, MockPeer, OrdererScript,
    PeerScript,
};
pub use domain::{
    duration_millis, ChaincodeInvocation, CommitBatch, CommitEvent, CommitReceipt, Creator,
    EndorsedProposal, Endorsement, EndorsementStatus, ErrorKind, LedgerIdentity, OrderingAck,
    OrderingStatus, PeerFailure, PeerOutcome, PipelineConfig, PipelineConfigError, PipelineError,
    PipelinePhase, Proposal, ProposalResponse, RejectionCause, SignedProposal, TransactionEnvelope,
    TransactionId, TransportError, ValidationCode, DEFAULT_COMMIT_TIMEOUT,
};
pub use ports::{CommitEventSource, IdentityStore, OrderingClient, PeerClient, TransactionApi};
pub use service::{
    ChannelHandle, CommitListener, CommitSubmitter, ProposalBroadcaster, QueryExecutor,
    QuorumEvaluator, TransactionOrchestrator,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
