//! # Core Entities
//!
//! Proposal, response, envelope and commit types exchanged with the ledger
//! network. Wire encoding is camelCase JSON with hex-encoded byte fields.

use super::identity::{Creator, LedgerIdentity};
use super::value_objects::{EndorsementStatus, OrderingStatus, TransactionId, ValidationCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length-prefixed hashing so adjacent fields cannot alias.
fn hash_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// A chaincode function call with its ordered arguments.
///
/// Arguments are opaque to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaincodeInvocation {
    pub chaincode_id: String,
    pub function: String,
    pub args: Vec<String>,
}

impl ChaincodeInvocation {
    pub fn new(
        chaincode_id: impl Into<String>,
        function: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            chaincode_id: chaincode_id.into(),
            function: function.into(),
            args,
        }
    }
}

impl fmt::Display for ChaincodeInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chaincode_id, self.function)
    }
}

/// Proposal header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalHeader {
    /// `None` for read-only proposals.
    pub tx_id: Option<TransactionId>,
    pub channel: String,
    pub creator: Creator,
    #[serde(with = "hex::serde")]
    pub nonce: Vec<u8>,
    pub timestamp_ms: i64,
}

/// An unsigned proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub header: ProposalHeader,
    pub invocation: ChaincodeInvocation,
}

impl Proposal {
    /// Proposal for a write, bound to a minted transaction id.
    pub fn for_invoke(
        identity: &LedgerIdentity,
        channel: &str,
        invocation: ChaincodeInvocation,
        tx_id: TransactionId,
        nonce: Vec<u8>,
    ) -> Self {
        Self {
            header: ProposalHeader {
                tx_id: Some(tx_id),
                channel: channel.to_string(),
                creator: identity.creator(),
                nonce,
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
            },
            invocation,
        }
    }

    /// Read-only proposal. Carries a nonce but no transaction id.
    pub fn for_query(identity: &LedgerIdentity, channel: &str, invocation: ChaincodeInvocation) -> Self {
        let nonce: [u8; super::value_objects::NONCE_LEN] = rand::random();
        Self {
            header: ProposalHeader {
                tx_id: None,
                channel: channel.to_string(),
                creator: identity.creator(),
                nonce: nonce.to_vec(),
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
            },
            invocation,
        }
    }

    /// Digest that signatures are computed over.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        let tx_id = self.header.tx_id.as_ref().map(TransactionId::as_str).unwrap_or("");
        hash_field(&mut hasher, tx_id.as_bytes());
        hash_field(&mut hasher, self.header.channel.as_bytes());
        hash_field(&mut hasher, self.header.creator.msp_id.as_bytes());
        hash_field(&mut hasher, &self.header.creator.public_key);
        hash_field(&mut hasher, &self.header.nonce);
        hasher.update(self.header.timestamp_ms.to_be_bytes());
        hash_field(&mut hasher, self.invocation.chaincode_id.as_bytes());
        hash_field(&mut hasher, self.invocation.function.as_bytes());
        hasher.update((self.invocation.args.len() as u64).to_be_bytes());
        for arg in &self.invocation.args {
            hash_field(&mut hasher, arg.as_bytes());
        }
        hasher.finalize().into()
    }
}

/// A proposal signed by the client identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedProposal {
    pub proposal: Proposal,
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

impl SignedProposal {
    pub fn sign(proposal: Proposal, identity: &LedgerIdentity) -> Self {
        let signature = identity.sign(&proposal.digest());
        Self {
            proposal,
            signature,
        }
    }

    pub fn tx_id(&self) -> Option<&TransactionId> {
        self.proposal.header.tx_id.as_ref()
    }

    /// Check the signature against the creator in the header.
    pub fn verify(&self) -> bool {
        self.proposal
            .header
            .creator
            .verify(&self.proposal.digest(), &self.signature)
    }
}

/// A peer's signature over its execution result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endorsement {
    pub endorser: String,
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

/// What one peer answered for a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalResponse {
    #[serde(default)]
    pub peer: String,
    #[serde(rename = "statusCode")]
    pub status: EndorsementStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default, with = "hex::serde")]
    pub payload: Vec<u8>,
    #[serde(default)]
    pub endorsement: Option<Endorsement>,
}

impl ProposalResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The peer's message, or the status when the peer sent none.
    pub fn describe(&self) -> String {
        if self.message.is_empty() {
            format!("peer {} answered {}", self.peer, self.status)
        } else {
            self.message.clone()
        }
    }
}

/// A peer slot that produced no response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerFailure {
    pub peer: String,
    pub message: String,
}

impl fmt::Display for PeerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer {}: {}", self.peer, self.message)
    }
}

/// Result slot for one peer, in peer order.
pub type PeerOutcome = Result<ProposalResponse, PeerFailure>;

/// A signed proposal whose responses passed quorum evaluation.
///
/// Only the quorum evaluator can build one.
#[derive(Debug, Clone)]
pub struct EndorsedProposal {
    proposal: SignedProposal,
    responses: Vec<ProposalResponse>,
}

impl EndorsedProposal {
    pub(crate) fn new(proposal: SignedProposal, responses: Vec<ProposalResponse>) -> Self {
        Self {
            proposal,
            responses,
        }
    }

    pub fn proposal(&self) -> &SignedProposal {
        &self.proposal
    }

    pub fn responses(&self) -> &[ProposalResponse] {
        &self.responses
    }

    /// Payload agreed on by the endorsers.
    pub fn payload(&self) -> &[u8] {
        self.responses
            .first()
            .map(|r| r.payload.as_slice())
            .unwrap_or_default()
    }
}

/// The package handed to the ordering service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
    pub proposal: SignedProposal,
    pub proposal_responses: Vec<ProposalResponse>,
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

impl TransactionEnvelope {
    /// Build and sign the envelope for an endorsed proposal.
    pub fn assemble(endorsed: EndorsedProposal, identity: &LedgerIdentity) -> Self {
        let EndorsedProposal {
            proposal,
            responses,
        } = endorsed;
        let signature = identity.sign(&Self::digest_of(&proposal, &responses));
        Self {
            proposal,
            proposal_responses: responses,
            signature,
        }
    }

    pub fn tx_id(&self) -> Option<&TransactionId> {
        self.proposal.tx_id()
    }

    pub fn digest(&self) -> [u8; 32] {
        Self::digest_of(&self.proposal, &self.proposal_responses)
    }

    fn digest_of(proposal: &SignedProposal, responses: &[ProposalResponse]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(proposal.proposal.digest());
        hash_field(&mut hasher, &proposal.signature);
        hasher.update((responses.len() as u64).to_be_bytes());
        for response in responses {
            hash_field(&mut hasher, response.peer.as_bytes());
            hasher.update(response.status.code().to_be_bytes());
            hash_field(&mut hasher, &response.payload);
            match &response.endorsement {
                Some(e) => {
                    hash_field(&mut hasher, e.endorser.as_bytes());
                    hash_field(&mut hasher, &e.signature);
                }
                None => hash_field(&mut hasher, &[]),
            }
        }
        hasher.finalize().into()
    }
}

/// Ordering service acknowledgment. Not a commit confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderingAck {
    pub status: OrderingStatus,
    #[serde(default)]
    pub info: String,
}

/// Commit notification for one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitEvent {
    #[serde(rename = "transactionId")]
    pub tx_id: TransactionId,
    #[serde(rename = "validityCode")]
    pub validity: ValidationCode,
    pub block_number: u64,
}

/// One answer from the commit event source.
///
/// `height` is the last block the answer covers, events or not. The next
/// poll asks for blocks after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitBatch {
    #[serde(default)]
    pub events: Vec<CommitEvent>,
    pub height: u64,
}

impl CommitBatch {
    pub fn new(events: Vec<CommitEvent>, height: u64) -> Self {
        Self { events, height }
    }

    /// Highest block this batch accounts for.
    pub fn covered_height(&self) -> u64 {
        self.events
            .iter()
            .map(|e| e.block_number)
            .fold(self.height, u64::max)
    }
}

/// Result of a successful `invoke`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    #[serde(rename = "transactionId")]
    pub tx_id: TransactionId,
    pub block_number: u64,
}
