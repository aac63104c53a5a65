//! # Services
//!
//! One module per pipeline component plus the channel handle.

pub mod broadcaster;
pub mod channel;
pub mod listener;
pub mod orchestrator;
pub mod query;
pub mod quorum;
pub mod submitter;

pub use broadcaster::ProposalBroadcaster;
pub use channel::ChannelHandle;
pub use listener::CommitListener;
pub use orchestrator::TransactionOrchestrator;
pub use query::QueryExecutor;
pub use quorum::QuorumEvaluator;
pub use submitter::CommitSubmitter;
