//! Commit Submitter - hands the signed envelope to the ordering service.
//!
//! A successful return only means the orderer accepted the envelope for
//! sequencing. Commit confirmation comes from the listener.

use crate::domain::{
    EndorsedProposal, LedgerIdentity, OrderingAck, PipelineError, TransactionEnvelope,
    TransactionId,
};
use crate::ports::OrderingClient;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CommitSubmitter {
    timeout: Duration,
}

impl CommitSubmitter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Build the envelope. Requires a proposal that passed quorum.
    pub fn assemble(&self, endorsed: EndorsedProposal, identity: &LedgerIdentity) -> TransactionEnvelope {
        TransactionEnvelope::assemble(endorsed, identity)
    }

    /// Broadcast the envelope and require a `SUCCESS` acknowledgment.
    pub async fn submit(
        &self,
        orderer: &dyn OrderingClient,
        envelope: &TransactionEnvelope,
        tx_id: &TransactionId,
    ) -> Result<OrderingAck, PipelineError> {
        let ack = match tokio::time::timeout(self.timeout, orderer.broadcast(envelope)).await {
            Ok(Ok(ack)) => ack,
            Ok(Err(e)) => {
                return Err(PipelineError::OrderingFailed {
                    tx_id: tx_id.clone(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(PipelineError::OrderingFailed {
                    tx_id: tx_id.clone(),
                    message: format!(
                        "no acknowledgment within {}ms",
                        self.timeout.as_millis()
                    ),
                })
            }
        };

        if !ack.status.is_success() {
            let message = if ack.info.is_empty() {
                format!("ordering service answered {}", ack.status)
            } else {
                format!("ordering service answered {}: {}", ack.status, ack.info)
            };
            return Err(PipelineError::OrderingFailed {
                tx_id: tx_id.clone(),
                message,
            });
        }

        debug!(tx_id = %tx_id, "Envelope accepted for ordering");
        Ok(ack)
    }
}
