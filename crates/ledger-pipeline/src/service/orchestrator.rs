//! Transaction Orchestrator - composes the pipeline into `invoke` and `query`.
//!
//! `invoke` order of operations:
//! 1. Mint the transaction id
//! 2. Broadcast the proposal and evaluate the quorum
//! 3. Register the commit listener
//! 4. Submit the envelope while the listener waits
//! 5. Return once both the ordering ack and the commit event are in
//!
//! No step is retried. The first failure ends the request, and the
//! listener's registration is removed on every exit path.

use super::broadcaster::ProposalBroadcaster;
use super::channel::ChannelHandle;
use super::listener::CommitListener;
use super::query::QueryExecutor;
use super::quorum::QuorumEvaluator;
use super::submitter::CommitSubmitter;
use crate::domain::{
    ChaincodeInvocation, CommitReceipt, LedgerIdentity, PipelineConfig, PipelineError, Proposal,
    SignedProposal, TransactionId,
};
use crate::ports::TransactionApi;
use async_trait::async_trait;
use ledger_telemetry::log_tx_event;
use ledger_telemetry::metrics::INVOCATIONS_TOTAL;
use std::sync::Arc;
use tracing::{info_span, Instrument};

pub struct TransactionOrchestrator {
    identity: Arc<LedgerIdentity>,
    channel: Arc<ChannelHandle>,
    config: PipelineConfig,
    broadcaster: ProposalBroadcaster,
    evaluator: QuorumEvaluator,
    submitter: CommitSubmitter,
    query: QueryExecutor,
}

impl TransactionOrchestrator {
    pub fn new(
        identity: Arc<LedgerIdentity>,
        channel: Arc<ChannelHandle>,
        config: PipelineConfig,
    ) -> Self {
        let broadcaster = ProposalBroadcaster::new(config.proposal_timeout);
        Self {
            evaluator: QuorumEvaluator::new(config.require_consistent_endorsements),
            submitter: CommitSubmitter::new(config.ordering_timeout),
            query: QueryExecutor::new(broadcaster.clone()),
            broadcaster,
            identity,
            channel,
            config,
        }
    }

    pub fn channel(&self) -> &Arc<ChannelHandle> {
        &self.channel
    }

    pub fn identity(&self) -> &Arc<LedgerIdentity> {
        &self.identity
    }

    async fn run_invoke(
        &self,
        tx_id: TransactionId,
        nonce: Vec<u8>,
        invocation: ChaincodeInvocation,
    ) -> Result<CommitReceipt, PipelineError> {
        let proposal = SignedProposal::sign(
            Proposal::for_invoke(
                &self.identity,
                self.channel.name(),
                invocation,
                tx_id.clone(),
                nonce,
            ),
            &self.identity,
        );

        let outcomes = self
            .broadcaster
            .broadcast(self.channel.peers(), &proposal)
            .await;
        let endorsed = self.evaluator.evaluate(proposal, outcomes)?;
        log_tx_event!(
            debug,
            "proposal",
            "Proposal endorsed",
            tx_id,
            endorsements = endorsed.responses().len()
        );

        // Registered before submission so an early commit event is not lost.
        let listener =
            CommitListener::register(self.channel.events(), tx_id.clone(), self.config.commit_timeout)?;
        let envelope = self.submitter.assemble(endorsed, &self.identity);

        let ordering = self
            .submitter
            .submit(self.channel.orderer().as_ref(), &envelope, &tx_id);
        let (_ack, receipt) = tokio::try_join!(ordering, listener.wait())?;
        Ok(receipt)
    }
}

#[async_trait]
impl TransactionApi for TransactionOrchestrator {
    async fn invoke(&self, invocation: ChaincodeInvocation) -> Result<CommitReceipt, PipelineError> {
        let (tx_id, nonce) = self.identity.mint_transaction_id();
        let span = info_span!(
            "invoke",
            tx_id = %tx_id,
            chaincode = %invocation.chaincode_id,
            function = %invocation.function,
        );

        let result = self
            .run_invoke(tx_id.clone(), nonce, invocation)
            .instrument(span.clone())
            .await;

        span.in_scope(|| match &result {
            Ok(receipt) => {
                INVOCATIONS_TOTAL.with_label_values(&["invoke", "success"]).inc();
                log_tx_event!(
                    info,
                    "commit-wait",
                    "Transaction committed",
                    tx_id,
                    block_number = receipt.block_number
                );
            }
            Err(e) => {
                INVOCATIONS_TOTAL
                    .with_label_values(&["invoke", e.kind().as_str()])
                    .inc();
                log_tx_event!(warn, e.phase(), "Invoke failed", tx_id, error = %e);
            }
        });
        result
    }

    async fn query(&self, invocation: ChaincodeInvocation) -> Result<Vec<u8>, PipelineError> {
        let span = info_span!(
            "query",
            chaincode = %invocation.chaincode_id,
            function = %invocation.function,
        );
        let proposal = SignedProposal::sign(
            Proposal::for_query(&self.identity, self.channel.name(), invocation),
            &self.identity,
        );

        let result = self
            .query
            .execute(self.channel.peers(), &proposal)
            .instrument(span.clone())
            .await;

        span.in_scope(|| match &result {
            Ok(payload) => {
                INVOCATIONS_TOTAL.with_label_values(&["query", "success"]).inc();
                tracing::debug!(bytes = payload.len(), "Query answered");
            }
            Err(e) => {
                INVOCATIONS_TOTAL
                    .with_label_values(&["query", e.kind().as_str()])
                    .inc();
                tracing::warn!(phase = %e.phase(), error = %e, "Query failed");
            }
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{CommitEventHub, MockOrderer, MockPeer};
    use crate::domain::{OrderingStatus, ValidationCode};
    use crate::ports::PeerClient;

    #[tokio::test]
    async fn test_invoke_happy_path() {
        let hub = Arc::new(CommitEventHub::new());
        let peers: Vec<Arc<dyn PeerClient>> = vec![Arc::new(MockPeer::endorsing("peer0", b"".to_vec()))];
        let orderer = Arc::new(
            MockOrderer::acking(OrderingStatus::Success).with_commit(hub.clone(), ValidationCode::Valid, 11),
        );
        let channel = Arc::new(ChannelHandle::new("mychannel", peers, orderer.clone(), hub.clone()));
        let identity = Arc::new(LedgerIdentity::from_seed("user1", "Org1MSP", "", [1u8; 32]));
        let orchestrator = TransactionOrchestrator::new(identity, channel, PipelineConfig::default());

        let receipt = orchestrator
            .invoke(ChaincodeInvocation::new("mycc", "deleteCitizen", vec!["1".into()]))
            .await
            .unwrap();
        assert_eq!(receipt.block_number, 11);
        assert_eq!(orderer.calls(), 1);
        assert_eq!(hub.active_count(), 0);
    }
}
