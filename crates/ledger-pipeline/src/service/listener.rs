//! Commit Listener - waits for one transaction's commit event.
//!
//! The event wait and the deadline are raced with `tokio::time::timeout`.
//! Whoever removes the hub registration first decides the outcome: the feed
//! by dispatching, the listener by unregistering on timeout. An event whose
//! registration was claimed before the unregister still counts, even if it
//! is sent after the deadline.

use crate::adapters::{CommitEventHub, CommitNotification, CommitSubscription};
use crate::domain::{duration_millis, CommitEvent, CommitReceipt, PipelineError, TransactionId};
use ledger_telemetry::metrics::COMMIT_WAIT_SECONDS;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

pub struct CommitListener {
    subscription: CommitSubscription,
    deadline: Duration,
}

impl CommitListener {
    /// Register for `tx_id`. Must happen before the envelope is submitted.
    pub fn register(
        hub: &Arc<CommitEventHub>,
        tx_id: TransactionId,
        deadline: Duration,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            subscription: hub.register(tx_id)?,
            deadline,
        })
    }

    pub fn tx_id(&self) -> &TransactionId {
        self.subscription.tx_id()
    }

    /// Wait for the commit event or the deadline.
    pub async fn wait(mut self) -> Result<CommitReceipt, PipelineError> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.deadline, self.subscription.recv()).await;
        COMMIT_WAIT_SECONDS.observe(started.elapsed().as_secs_f64());

        let tx_id = self.subscription.tx_id().clone();
        let received = match outcome {
            Ok(received) => received,
            Err(_) => {
                if self.subscription.unregister() {
                    self.subscription.hub().record_timeout();
                    let waited_ms = duration_millis(self.deadline);
                    warn!(
                        tx_id = %tx_id,
                        timeout_ms = waited_ms,
                        "No commit event before deadline"
                    );
                    return Err(PipelineError::CommitTimeout { tx_id, waited_ms });
                }
                // The registration was claimed at the deadline; its sender
                // sends right after removing it.
                self.subscription.recv().await
            }
        };

        let Ok(notification) = received else {
            return Err(PipelineError::CommitListenerFailed {
                tx_id,
                reason: "registration was removed before the event arrived".to_string(),
            });
        };

        match notification {
            CommitNotification::Committed(event) => resolve(tx_id, event),
            CommitNotification::Failed(reason) => {
                Err(PipelineError::CommitListenerFailed { tx_id, reason })
            }
        }
    }
}

fn resolve(tx_id: TransactionId, event: CommitEvent) -> Result<CommitReceipt, PipelineError> {
    if event.validity.is_valid() {
        debug!(tx_id = %tx_id, block_number = event.block_number, "Transaction committed");
        Ok(CommitReceipt {
            tx_id,
            block_number: event.block_number,
        })
    } else {
        Err(PipelineError::CommitInvalid {
            tx_id,
            code: event.validity,
            block_number: event.block_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationCode;
    use std::sync::atomic::Ordering;

    fn event(tx_id: &TransactionId, validity: ValidationCode, block: u64) -> CommitEvent {
        CommitEvent {
            tx_id: tx_id.clone(),
            validity,
            block_number: block,
        }
    }

    #[tokio::test]
    async fn test_valid_event_resolves_with_block() {
        let hub = Arc::new(CommitEventHub::new());
        let tx = TransactionId::new("tx1");
        let listener = CommitListener::register(&hub, tx.clone(), Duration::from_secs(20)).unwrap();
        hub.dispatch(event(&tx, ValidationCode::Valid, 42));

        let receipt = listener.wait().await.unwrap();
        assert_eq!(receipt.block_number, 42);
        assert_eq!(receipt.tx_id, tx);
    }

    #[tokio::test]
    async fn test_invalid_event_carries_code() {
        let hub = Arc::new(CommitEventHub::new());
        let tx = TransactionId::new("tx1");
        let listener = CommitListener::register(&hub, tx.clone(), Duration::from_secs(20)).unwrap();
        hub.dispatch(event(&tx, ValidationCode::EndorsementPolicyFailure, 8));

        match listener.wait().await.unwrap_err() {
            PipelineError::CommitInvalid { code, block_number, .. } => {
                assert_eq!(code, ValidationCode::EndorsementPolicyFailure);
                assert_eq!(block_number, 8);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_unregisters_once() {
        let hub = Arc::new(CommitEventHub::new());
        let tx = TransactionId::new("tx1");
        let listener = CommitListener::register(&hub, tx.clone(), Duration::from_secs(20)).unwrap();

        let err = listener.wait().await.unwrap_err();
        assert!(matches!(err, PipelineError::CommitTimeout { waited_ms: 20_000, .. }));
        assert!(!hub.is_registered(&tx));
        assert_eq!(hub.stats().total_timeouts.load(Ordering::Relaxed), 1);

        // A late event finds nobody.
        assert!(!hub.dispatch(event(&tx, ValidationCode::Valid, 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_before_deadline_wins() {
        let hub = Arc::new(CommitEventHub::new());
        let tx = TransactionId::new("tx1");
        let listener = CommitListener::register(&hub, tx.clone(), Duration::from_secs(20)).unwrap();

        let feed_hub = hub.clone();
        let feed_tx = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(19)).await;
            feed_hub.dispatch(event(&feed_tx, ValidationCode::Valid, 3));
        });

        assert_eq!(listener.wait().await.unwrap().block_number, 3);
        assert_eq!(hub.stats().total_timeouts.load(Ordering::Relaxed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_claimed_at_deadline_still_wins() {
        let hub = Arc::new(CommitEventHub::new());
        let tx = TransactionId::new("tx1");
        let listener = CommitListener::register(&hub, tx.clone(), Duration::from_secs(20)).unwrap();

        // The feed has removed the registration but not sent yet.
        let sender = hub.take_sender(&tx).unwrap();
        let feed_tx = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(21)).await;
            let _ = sender.send(CommitNotification::Committed(event(
                &feed_tx,
                ValidationCode::Valid,
                4,
            )));
        });

        let receipt = listener.wait().await.unwrap();
        assert_eq!(receipt.block_number, 4);
        assert_eq!(hub.stats().total_timeouts.load(Ordering::Relaxed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_claimed_but_dropped_registration_fails_listener() {
        let hub = Arc::new(CommitEventHub::new());
        let tx = TransactionId::new("tx1");
        let listener = CommitListener::register(&hub, tx.clone(), Duration::from_secs(20)).unwrap();
        let sender = hub.take_sender(&tx).unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(25)).await;
            drop(sender);
        });

        let err = listener.wait().await.unwrap_err();
        assert!(matches!(err, PipelineError::CommitListenerFailed { .. }));
    }

    #[tokio::test]
    async fn test_error_callback_fails_listener() {
        let hub = Arc::new(CommitEventHub::new());
        let tx = TransactionId::new("tx1");
        let listener = CommitListener::register(&hub, tx.clone(), Duration::from_secs(20)).unwrap();
        hub.fail_all("stream lost");

        let err = listener.wait().await.unwrap_err();
        assert!(matches!(err, PipelineError::CommitListenerFailed { .. }));
        assert!(err.to_string().contains("stream lost"));
    }

    #[test]
    fn test_drop_before_wait_unregisters() {
        let hub = Arc::new(CommitEventHub::new());
        let tx = TransactionId::new("tx1");
        let listener = CommitListener::register(&hub, tx.clone(), Duration::from_secs(20)).unwrap();
        drop(listener);
        assert!(!hub.is_registered(&tx));
    }
}
