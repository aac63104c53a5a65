//! # Value Objects
//!
//! Identifiers and closed status enumerations used across the pipeline.

use super::identity::Creator;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of the random nonce mixed into every transaction id.
pub const NONCE_LEN: usize = 24;

/// Correlation key for one `invoke`.
///
/// Lowercase hex of `SHA-256(nonce ‖ creator)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Derive the id for a nonce and a creator.
    pub fn derive(nonce: &[u8], creator: &Creator) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(nonce);
        hasher.update(creator.msp_id.as_bytes());
        hasher.update(&creator.public_key);
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap an id received from the network.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome a peer reports for a proposal.
///
/// Decoded from the numeric status on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum EndorsementStatus {
    /// Executed and endorsed (200).
    Success,
    /// The chaincode reported the key does not exist (404).
    NotFound,
    /// Rejected by the chaincode or peer (other 4xx).
    Rejected,
    /// Execution failed (5xx or unknown).
    Failed,
}

impl EndorsementStatus {
    /// Numeric status code used on the wire.
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 200,
            Self::NotFound => 404,
            Self::Rejected => 400,
            Self::Failed => 500,
        }
    }

    /// Whether this is the expected success status.
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl From<i32> for EndorsementStatus {
    fn from(code: i32) -> Self {
        match code {
            200 => Self::Success,
            404 => Self::NotFound,
            400..=499 => Self::Rejected,
            _ => Self::Failed,
        }
    }
}

impl From<EndorsementStatus> for i32 {
    fn from(status: EndorsementStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for EndorsementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "SUCCESS",
            Self::NotFound => "NOT_FOUND",
            Self::Rejected => "REJECTED",
            Self::Failed => "FAILED",
        };
        write!(f, "{} {}", self.code(), label)
    }
}

/// Status returned by the ordering service for a broadcast envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderingStatus {
    Success,
    BadRequest,
    Forbidden,
    NotFound,
    RequestEntityTooLarge,
    InternalServerError,
    NotImplemented,
    ServiceUnavailable,
}

impl OrderingStatus {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::BadRequest => "BAD_REQUEST",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::RequestEntityTooLarge => "REQUEST_ENTITY_TOO_LARGE",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for OrderingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final validity of a committed transaction.
///
/// Codes the network may add later decode as `InvalidOtherReason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    Valid,
    NilEnvelope,
    BadPayload,
    BadCommonHeader,
    BadCreatorSignature,
    InvalidEndorserTransaction,
    BadProposalTxid,
    DuplicateTxid,
    EndorsementPolicyFailure,
    MvccReadConflict,
    PhantomReadConflict,
    ExpiredChaincode,
    ChaincodeVersionConflict,
    BadResponsePayload,
    BadRwset,
    IllegalWriteset,
    InvalidWriteset,
    NotValidated,
    #[serde(other)]
    InvalidOtherReason,
}

impl ValidationCode {
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::NilEnvelope => "NIL_ENVELOPE",
            Self::BadPayload => "BAD_PAYLOAD",
            Self::BadCommonHeader => "BAD_COMMON_HEADER",
            Self::BadCreatorSignature => "BAD_CREATOR_SIGNATURE",
            Self::InvalidEndorserTransaction => "INVALID_ENDORSER_TRANSACTION",
            Self::BadProposalTxid => "BAD_PROPOSAL_TXID",
            Self::DuplicateTxid => "DUPLICATE_TXID",
            Self::EndorsementPolicyFailure => "ENDORSEMENT_POLICY_FAILURE",
            Self::MvccReadConflict => "MVCC_READ_CONFLICT",
            Self::PhantomReadConflict => "PHANTOM_READ_CONFLICT",
            Self::ExpiredChaincode => "EXPIRED_CHAINCODE",
            Self::ChaincodeVersionConflict => "CHAINCODE_VERSION_CONFLICT",
            Self::BadResponsePayload => "BAD_RESPONSE_PAYLOAD",
            Self::BadRwset => "BAD_RWSET",
            Self::IllegalWriteset => "ILLEGAL_WRITESET",
            Self::InvalidWriteset => "INVALID_WRITESET",
            Self::NotValidated => "NOT_VALIDATED",
            Self::InvalidOtherReason => "INVALID_OTHER_REASON",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creator() -> Creator {
        Creator {
            msp_id: "Org1MSP".to_string(),
            public_key: vec![7u8; 32],
        }
    }

    #[test]
    fn test_transaction_id_is_hex_sha256() {
        let id = TransactionId::derive(&[1u8; NONCE_LEN], &creator());
        assert_eq!(id.as_str().len(), 64);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_transaction_id_depends_on_nonce() {
        let a = TransactionId::derive(&[1u8; NONCE_LEN], &creator());
        let b = TransactionId::derive(&[2u8; NONCE_LEN], &creator());
        assert_ne!(a, b);
    }

    #[test]
    fn test_endorsement_status_from_code() {
        assert_eq!(EndorsementStatus::from(200), EndorsementStatus::Success);
        assert_eq!(EndorsementStatus::from(404), EndorsementStatus::NotFound);
        assert_eq!(EndorsementStatus::from(403), EndorsementStatus::Rejected);
        assert_eq!(EndorsementStatus::from(500), EndorsementStatus::Failed);
        assert_eq!(EndorsementStatus::from(201), EndorsementStatus::Failed);
    }

    #[test]
    fn test_endorsement_status_wire_format() {
        let status: EndorsementStatus = serde_json::from_str("404").unwrap();
        assert_eq!(status, EndorsementStatus::NotFound);
        assert_eq!(serde_json::to_string(&EndorsementStatus::Success).unwrap(), "200");
    }

    #[test]
    fn test_ordering_status_wire_format() {
        let status: OrderingStatus = serde_json::from_str("\"SUCCESS\"").unwrap();
        assert!(status.is_success());
        let status: OrderingStatus = serde_json::from_str("\"SERVICE_UNAVAILABLE\"").unwrap();
        assert!(!status.is_success());
    }

    #[test]
    fn test_unknown_validation_code_is_invalid() {
        let code: ValidationCode = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(code, ValidationCode::InvalidOtherReason);
        assert!(!code.is_valid());
    }

    #[test]
    fn test_validation_code_display_matches_wire() {
        let code = ValidationCode::MvccReadConflict;
        assert_eq!(
            serde_json::to_string(&code).unwrap(),
            format!("\"{}\"", code)
        );
    }
}
