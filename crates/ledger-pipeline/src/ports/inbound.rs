//! # Inbound Ports
//!
//! What the pipeline offers to the request-handling layer.

use crate::domain::{ChaincodeInvocation, CommitReceipt, PipelineError};
use async_trait::async_trait;

/// Transaction API - inbound port.
#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// Endorse, order and await the commit of a state change.
    async fn invoke(&self, invocation: ChaincodeInvocation) -> Result<CommitReceipt, PipelineError>;

    /// Evaluate a read-only proposal and return the peer's payload.
    async fn query(&self, invocation: ChaincodeInvocation) -> Result<Vec<u8>, PipelineError>;
}
