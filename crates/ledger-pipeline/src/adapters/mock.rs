//! Scripted peers and orderer for tests and local runs.

use super::event_hub::CommitEventHub;
use crate::domain::{
    CommitEvent, Endorsement, EndorsementStatus, LedgerIdentity, OrderingAck, OrderingStatus,
    ProposalResponse, SignedProposal, TransactionEnvelope, TransportError, ValidationCode,
};
use crate::ports::{OrderingClient, PeerClient};
use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How a [`MockPeer`] answers.
#[derive(Debug, Clone)]
pub enum PeerScript {
    /// Endorse with this payload.
    Endorse(Vec<u8>),
    /// Answer with a status and message, no endorsement.
    Answer {
        status: EndorsementStatus,
        message: String,
    },
    /// Fail at the transport level.
    Unreachable(String),
    /// Never answer.
    Stall,
}

/// Mock peer for testing.
pub struct MockPeer {
    name: String,
    signer: LedgerIdentity,
    script: Mutex<PeerScript>,
    calls: AtomicUsize,
    last_proposal: Mutex<Option<SignedProposal>>,
}

impl MockPeer {
    pub fn new(name: impl Into<String>, script: PeerScript) -> Self {
        let name = name.into();
        let seed: [u8; 32] = Sha256::digest(name.as_bytes()).into();
        Self {
            signer: LedgerIdentity::from_seed(name.clone(), "PeerMSP", "", seed),
            name,
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
            last_proposal: Mutex::new(None),
        }
    }

    pub fn endorsing(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self::new(name, PeerScript::Endorse(payload.into()))
    }

    pub fn answering(
        name: impl Into<String>,
        status: EndorsementStatus,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            PeerScript::Answer {
                status,
                message: message.into(),
            },
        )
    }

    pub fn unreachable(name: impl Into<String>) -> Self {
        Self::new(name, PeerScript::Unreachable("connection refused".to_string()))
    }

    pub fn set_script(&self, script: PeerScript) {
        *self.script.lock() = script;
    }

    /// Number of proposals received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_proposal(&self) -> Option<SignedProposal> {
        self.last_proposal.lock().clone()
    }
}

#[async_trait]
impl PeerClient for MockPeer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process_proposal(
        &self,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_proposal.lock() = Some(proposal.clone());

        let script = self.script.lock().clone();
        match script {
            PeerScript::Unreachable(reason) => Err(TransportError::Unreachable(reason)),
            PeerScript::Stall => std::future::pending().await,
            PeerScript::Answer { status, message } => Ok(ProposalResponse {
                peer: self.name.clone(),
                status,
                message,
                payload: Vec::new(),
                endorsement: None,
            }),
            PeerScript::Endorse(_) if !proposal.verify() => Ok(ProposalResponse {
                peer: self.name.clone(),
                status: EndorsementStatus::Rejected,
                message: "creator signature does not verify".to_string(),
                payload: Vec::new(),
                endorsement: None,
            }),
            PeerScript::Endorse(payload) => {
                let mut signed = proposal.proposal.digest().to_vec();
                signed.extend_from_slice(&payload);
                Ok(ProposalResponse {
                    peer: self.name.clone(),
                    status: EndorsementStatus::Success,
                    message: String::new(),
                    endorsement: Some(Endorsement {
                        endorser: self.name.clone(),
                        signature: self.signer.sign(&signed),
                    }),
                    payload,
                })
            }
        }
    }
}

/// How a [`MockOrderer`] answers.
#[derive(Debug, Clone)]
pub enum OrdererScript {
    Ack(OrderingStatus),
    Unreachable(String),
}

#[derive(Debug, Clone)]
struct ScriptedCommit {
    validity: ValidationCode,
    block_number: u64,
    delay: Duration,
}

/// Mock ordering service for testing.
///
/// When a commit is configured, a successful broadcast also delivers the
/// commit event to the hub, standing in for the network.
pub struct MockOrderer {
    script: Mutex<OrdererScript>,
    commit: Mutex<Option<(Arc<CommitEventHub>, ScriptedCommit)>>,
    calls: AtomicUsize,
    envelopes: Mutex<Vec<TransactionEnvelope>>,
}

impl MockOrderer {
    pub fn new(script: OrdererScript) -> Self {
        Self {
            script: Mutex::new(script),
            commit: Mutex::new(None),
            calls: AtomicUsize::new(0),
            envelopes: Mutex::new(Vec::new()),
        }
    }

    pub fn acking(status: OrderingStatus) -> Self {
        Self::new(OrdererScript::Ack(status))
    }

    pub fn unreachable() -> Self {
        Self::new(OrdererScript::Unreachable("connection refused".to_string()))
    }

    /// Commit every accepted envelope in `block_number` with `validity`.
    pub fn with_commit(
        self,
        hub: Arc<CommitEventHub>,
        validity: ValidationCode,
        block_number: u64,
    ) -> Self {
        *self.commit.lock() = Some((
            hub,
            ScriptedCommit {
                validity,
                block_number,
                delay: Duration::ZERO,
            },
        ));
        self
    }

    /// Deliver the configured commit event after `delay`.
    pub fn with_commit_delay(self, delay: Duration) -> Self {
        if let Some((_, commit)) = self.commit.lock().as_mut() {
            commit.delay = delay;
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn envelopes(&self) -> Vec<TransactionEnvelope> {
        self.envelopes.lock().clone()
    }

    fn schedule_commit(&self, envelope: &TransactionEnvelope) {
        let Some(tx_id) = envelope.tx_id().cloned() else {
            return;
        };
        let Some((hub, commit)) = self.commit.lock().clone() else {
            return;
        };
        let event = CommitEvent {
            tx_id,
            validity: commit.validity,
            block_number: commit.block_number,
        };
        if commit.delay.is_zero() {
            hub.dispatch(event);
        } else {
            tokio::spawn(async move {
                tokio::time::sleep(commit.delay).await;
                hub.dispatch(event);
            });
        }
    }
}

#[async_trait]
impl OrderingClient for MockOrderer {
    async fn broadcast(&self, envelope: &TransactionEnvelope) -> Result<OrderingAck, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.envelopes.lock().push(envelope.clone());

        let script = self.script.lock().clone();
        match script {
            OrdererScript::Unreachable(reason) => Err(TransportError::Unreachable(reason)),
            OrdererScript::Ack(status) => {
                if status.is_success() {
                    self.schedule_commit(envelope);
                }
                Ok(OrderingAck {
                    status,
                    info: String::new(),
                })
            }
        }
    }
}
