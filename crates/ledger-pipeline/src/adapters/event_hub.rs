//! Commit Event Hub - registry of live commit subscriptions.
//!
//! Maps transaction ids to the listener waiting for their commit event.
//!
//! Flow:
//! 1. The orchestrator calls `register()` before submitting the envelope
//! 2. The commit feed calls `dispatch()` for every event it receives
//! 3. The listener awaits its subscription or times out
//! 4. Dropping the subscription removes any registration still present

use crate::domain::{duration_millis, CommitEvent, PipelineError, TransactionId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ledger_telemetry::metrics::COMMIT_LISTENERS_ACTIVE;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

/// What a subscription resolves with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitNotification {
    /// The commit event for the transaction.
    Committed(CommitEvent),
    /// The event source failed before the event arrived.
    Failed(String),
}

struct Registration {
    sender: oneshot::Sender<CommitNotification>,
    registered_at: Instant,
}

/// Counters for the hub.
#[derive(Debug, Default)]
pub struct HubStats {
    pub total_registered: AtomicU64,
    pub total_resolved: AtomicU64,
    pub total_failed: AtomicU64,
    pub total_timeouts: AtomicU64,
    pub total_cancelled: AtomicU64,
    pub total_unmatched: AtomicU64,
}

/// Registry of commit subscriptions keyed by transaction id.
#[derive(Default)]
pub struct CommitEventHub {
    registrations: DashMap<TransactionId, Registration>,
    stats: HubStats,
}

impl CommitEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a subscription for `tx_id`.
    ///
    /// A second registration for the same id is refused.
    pub fn register(self: &Arc<Self>, tx_id: TransactionId) -> Result<CommitSubscription, PipelineError> {
        let (sender, receiver) = oneshot::channel();

        match self.registrations.entry(tx_id.clone()) {
            Entry::Occupied(_) => {
                warn!(tx_id = %tx_id, "Commit listener already registered");
                return Err(PipelineError::CommitListenerFailed {
                    tx_id,
                    reason: "a listener is already registered for this transaction".to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(Registration {
                    sender,
                    registered_at: Instant::now(),
                });
            }
        }

        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
        self.update_gauge();
        debug!(tx_id = %tx_id, "Registered commit listener");

        Ok(CommitSubscription {
            tx_id,
            receiver,
            hub: Arc::clone(self),
        })
    }

    /// Deliver a commit event to its subscription.
    ///
    /// Returns false when nobody is waiting for the transaction.
    pub fn dispatch(&self, event: CommitEvent) -> bool {
        let Some((tx_id, registration)) = self.registrations.remove(&event.tx_id) else {
            self.stats.total_unmatched.fetch_add(1, Ordering::Relaxed);
            debug!(
                tx_id = %event.tx_id,
                block_number = event.block_number,
                "Commit event for unknown or expired transaction"
            );
            return false;
        };
        self.update_gauge();

        let waited = registration.registered_at.elapsed();
        match registration.sender.send(CommitNotification::Committed(event)) {
            Ok(()) => {
                self.stats.total_resolved.fetch_add(1, Ordering::Relaxed);
                debug!(
                    tx_id = %tx_id,
                    waited_ms = duration_millis(waited),
                    "Delivered commit event"
                );
                true
            }
            Err(_) => {
                // Listener went away between lookup and send.
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Remove a registration without resolving it.
    ///
    /// Returns false if it was already resolved or removed.
    pub fn unregister(&self, tx_id: &TransactionId) -> bool {
        let removed = self.registrations.remove(tx_id).is_some();
        if removed {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            self.update_gauge();
            debug!(tx_id = %tx_id, "Unregistered commit listener");
        }
        removed
    }

    /// Fire the error callback on every live registration.
    ///
    /// Returns the number of listeners failed.
    pub fn fail_all(&self, reason: &str) -> usize {
        let tx_ids: Vec<TransactionId> = self
            .registrations
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        let mut failed = 0;
        for tx_id in tx_ids {
            if let Some((_, registration)) = self.registrations.remove(&tx_id) {
                if registration
                    .sender
                    .send(CommitNotification::Failed(reason.to_string()))
                    .is_ok()
                {
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            self.stats
                .total_failed
                .fetch_add(failed as u64, Ordering::Relaxed);
            warn!(listeners = failed, reason = reason, "Failed all commit listeners");
        }
        self.update_gauge();
        failed
    }

    /// Remove a registration and hand back its sender unresolved.
    #[cfg(test)]
    pub(crate) fn take_sender(
        &self,
        tx_id: &TransactionId,
    ) -> Option<oneshot::Sender<CommitNotification>> {
        let (_, registration) = self.registrations.remove(tx_id)?;
        self.update_gauge();
        Some(registration.sender)
    }

    pub(crate) fn record_timeout(&self) {
        self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_registered(&self, tx_id: &TransactionId) -> bool {
        self.registrations.contains_key(tx_id)
    }

    pub fn active_count(&self) -> usize {
        self.registrations.len()
    }

    pub fn stats(&self) -> &HubStats {
        &self.stats
    }

    fn update_gauge(&self) {
        COMMIT_LISTENERS_ACTIVE.set(self.registrations.len() as f64);
    }
}

/// Handle to one registration. Dropping it unregisters.
pub struct CommitSubscription {
    tx_id: TransactionId,
    receiver: oneshot::Receiver<CommitNotification>,
    hub: Arc<CommitEventHub>,
}

impl CommitSubscription {
    pub fn tx_id(&self) -> &TransactionId {
        &self.tx_id
    }

    /// Wait for the notification.
    ///
    /// Errors if the registration was removed without being resolved.
    pub async fn recv(&mut self) -> Result<CommitNotification, oneshot::error::RecvError> {
        (&mut self.receiver).await
    }

    /// Remove the registration now. Returns false if it was already resolved.
    pub fn unregister(&self) -> bool {
        self.hub.unregister(&self.tx_id)
    }

    pub fn hub(&self) -> &Arc<CommitEventHub> {
        &self.hub
    }
}

impl Drop for CommitSubscription {
    fn drop(&mut self) {
        self.hub.unregister(&self.tx_id);
    }
}
