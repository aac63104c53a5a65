//! # Pipeline Errors
//!
//! Every failure an `invoke` or `query` can end in. Each variant knows the
//! phase it belongs to so callers can log and map it without string parsing.

use super::value_objects::{EndorsementStatus, TransactionId, ValidationCode};
use std::fmt;
use thiserror::Error;

/// Stage of the pipeline a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelinePhase {
    Startup,
    Proposal,
    Ordering,
    CommitWait,
}

impl PipelinePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Proposal => "proposal",
            Self::Ordering => "ordering",
            Self::CommitWait => "commit-wait",
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of [`PipelineError`], used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    IdentityNotEnrolled,
    ProposalRejected,
    OrderingFailed,
    CommitTimeout,
    CommitInvalid,
    CommitListenerFailed,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IdentityNotEnrolled => "identity_not_enrolled",
            Self::ProposalRejected => "proposal_rejected",
            Self::OrderingFailed => "ordering_failed",
            Self::CommitTimeout => "commit_timeout",
            Self::CommitInvalid => "commit_invalid",
            Self::CommitListenerFailed => "commit_listener_failed",
        }
    }
}

/// Why a proposal did not yield a usable endorsement set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionCause {
    /// No peers were configured or none answered at all.
    NoResponses,
    /// The first peer could not be reached.
    Unreachable,
    /// The first peer answered with a non-success status.
    Endorsement(EndorsementStatus),
    /// Peers disagreed on status or payload.
    Inconsistent,
}

/// Pipeline errors.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("identity '{name}' is not enrolled: {reason}")]
    IdentityNotEnrolled { name: String, reason: String },

    #[error("{message}")]
    ProposalRejected {
        cause: RejectionCause,
        message: String,
    },

    #[error("transaction {tx_id} was not accepted for ordering: {message}")]
    OrderingFailed { tx_id: TransactionId, message: String },

    #[error("transaction {tx_id} was not committed within {waited_ms}ms")]
    CommitTimeout { tx_id: TransactionId, waited_ms: u64 },

    #[error("transaction {tx_id} was committed in block {block_number} as invalid: {code}")]
    CommitInvalid {
        tx_id: TransactionId,
        code: ValidationCode,
        block_number: u64,
    },

    #[error("commit listener for transaction {tx_id} failed: {reason}")]
    CommitListenerFailed { tx_id: TransactionId, reason: String },
}

impl PipelineError {
    pub fn rejected(cause: RejectionCause, message: impl Into<String>) -> Self {
        Self::ProposalRejected {
            cause,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IdentityNotEnrolled { .. } => ErrorKind::IdentityNotEnrolled,
            Self::ProposalRejected { .. } => ErrorKind::ProposalRejected,
            Self::OrderingFailed { .. } => ErrorKind::OrderingFailed,
            Self::CommitTimeout { .. } => ErrorKind::CommitTimeout,
            Self::CommitInvalid { .. } => ErrorKind::CommitInvalid,
            Self::CommitListenerFailed { .. } => ErrorKind::CommitListenerFailed,
        }
    }

    pub fn phase(&self) -> PipelinePhase {
        match self {
            Self::IdentityNotEnrolled { .. } => PipelinePhase::Startup,
            Self::ProposalRejected { .. } => PipelinePhase::Proposal,
            Self::OrderingFailed { .. } => PipelinePhase::Ordering,
            Self::CommitTimeout { .. }
            | Self::CommitInvalid { .. }
            | Self::CommitListenerFailed { .. } => PipelinePhase::CommitWait,
        }
    }

    /// True when the chaincode reported the requested key does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProposalRejected {
                cause: RejectionCause::Endorsement(EndorsementStatus::NotFound),
                ..
            }
        )
    }

    /// Transaction the error is about, when one was minted.
    pub fn tx_id(&self) -> Option<&TransactionId> {
        match self {
            Self::OrderingFailed { tx_id, .. }
            | Self::CommitTimeout { tx_id, .. }
            | Self::CommitInvalid { tx_id, .. }
            | Self::CommitListenerFailed { tx_id, .. } => Some(tx_id),
            Self::IdentityNotEnrolled { .. } | Self::ProposalRejected { .. } => None,
        }
    }
}

/// Failure of a single network call to a peer or orderer.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("protocol error: {0}")]
    Protocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx() -> TransactionId {
        TransactionId::new("ab12")
    }

    #[test]
    fn test_phases() {
        let err = PipelineError::IdentityNotEnrolled {
            name: "user1".into(),
            reason: "missing".into(),
        };
        assert_eq!(err.phase(), PipelinePhase::Startup);

        let err = PipelineError::rejected(RejectionCause::Unreachable, "down");
        assert_eq!(err.phase(), PipelinePhase::Proposal);

        let err = PipelineError::OrderingFailed {
            tx_id: tx(),
            message: "BAD_REQUEST".into(),
        };
        assert_eq!(err.phase(), PipelinePhase::Ordering);

        let err = PipelineError::CommitTimeout {
            tx_id: tx(),
            waited_ms: 20_000,
        };
        assert_eq!(err.phase(), PipelinePhase::CommitWait);
        assert_eq!(err.phase().to_string(), "commit-wait");
    }

    #[test]
    fn test_not_found_detection() {
        let err = PipelineError::rejected(
            RejectionCause::Endorsement(EndorsementStatus::NotFound),
            "no citizen",
        );
        assert!(err.is_not_found());

        let err = PipelineError::rejected(
            RejectionCause::Endorsement(EndorsementStatus::Failed),
            "boom",
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_rejection_message_is_peer_message() {
        let err = PipelineError::rejected(
            RejectionCause::Endorsement(EndorsementStatus::Rejected),
            "citizen already exists",
        );
        assert_eq!(err.to_string(), "citizen already exists");
        assert_eq!(err.kind(), ErrorKind::ProposalRejected);
        assert!(err.tx_id().is_none());
    }

    #[test]
    fn test_commit_invalid_message() {
        let err = PipelineError::CommitInvalid {
            tx_id: tx(),
            code: ValidationCode::MvccReadConflict,
            block_number: 7,
        };
        assert!(err.to_string().contains("MVCC_READ_CONFLICT"));
        assert_eq!(err.kind().as_str(), "commit_invalid");
    }
}
