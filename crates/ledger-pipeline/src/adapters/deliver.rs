//! Commit Feed - pumps ledger commit events into the hub.
//!
//! Polls a [`CommitEventSource`] on an interval, keeps a block cursor, and
//! dispatches every event it sees. Repeated transport failures fire the
//! error callback on all waiting listeners.

use super::event_hub::CommitEventHub;
use crate::domain::{duration_millis, TransportError};
use crate::ports::CommitEventSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Commit feed settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFeedConfig {
    /// Delay between polls.
    pub poll_interval: Duration,
    /// Failures in a row before waiting listeners are failed.
    pub max_consecutive_failures: u32,
}

impl Default for CommitFeedConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_consecutive_failures: 5,
        }
    }
}

/// Background task feeding the [`CommitEventHub`].
pub struct CommitFeed {
    source: Arc<dyn CommitEventSource>,
    hub: Arc<CommitEventHub>,
    config: CommitFeedConfig,
    cursor: Option<u64>,
    consecutive_failures: u32,
}

impl CommitFeed {
    pub fn new(
        source: Arc<dyn CommitEventSource>,
        hub: Arc<CommitEventHub>,
        config: CommitFeedConfig,
    ) -> Self {
        Self {
            source,
            hub,
            config,
            cursor: None,
            consecutive_failures: 0,
        }
    }

    /// Last block the source has answered for.
    pub fn cursor(&self) -> Option<u64> {
        self.cursor
    }

    /// Run one poll. Returns how many events reached a listener.
    ///
    /// A long-poll that times out on a quiet chain counts as an empty
    /// answer, not as a failure.
    pub async fn poll_once(&mut self) -> Result<usize, TransportError> {
        match self.source.poll_commits(self.cursor).await {
            Ok(batch) => {
                self.mark_healthy();

                let covered = batch.covered_height();
                let mut delivered = 0;
                for event in batch.events {
                    if self.hub.dispatch(event) {
                        delivered += 1;
                    }
                }
                self.cursor = Some(self.cursor.map_or(covered, |c| c.max(covered)));
                if delivered > 0 {
                    debug!(delivered, cursor = ?self.cursor, "Dispatched commit events");
                }
                Ok(delivered)
            }
            Err(TransportError::Timeout(waited_ms)) => {
                self.mark_healthy();
                debug!(waited_ms, cursor = ?self.cursor, "Commit long-poll idle");
                Ok(0)
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                warn!(
                    error = %e,
                    failures = self.consecutive_failures,
                    "Commit event poll failed"
                );
                if self.consecutive_failures >= self.config.max_consecutive_failures {
                    self.hub
                        .fail_all(&format!("commit event stream lost: {e}"));
                }
                Err(e)
            }
        }
    }

    fn mark_healthy(&mut self) {
        if self.consecutive_failures >= self.config.max_consecutive_failures {
            info!(cursor = ?self.cursor, "Commit event stream recovered");
        }
        self.consecutive_failures = 0;
    }

    /// Poll until `shutdown` flips or its sender is dropped.
    ///
    /// Listeners still waiting at shutdown are failed.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            poll_interval_ms = duration_millis(self.config.poll_interval),
            "Commit feed started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Commit feed shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    // Errors are logged and counted inside.
                    let _ = self.poll_once().await;
                }
            }
        }

        self.hub.fail_all("commit feed shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::event_hub::CommitNotification;
    use crate::domain::{CommitBatch, CommitEvent, TransactionId, ValidationCode};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::Ordering;

    /// Scripted source: pops one answer per poll, records the cursor asked for.
    #[derive(Default)]
    struct ScriptedSource {
        answers: Mutex<VecDeque<Result<CommitBatch, TransportError>>>,
        asked: Mutex<Vec<Option<u64>>>,
    }

    #[async_trait]
    impl CommitEventSource for ScriptedSource {
        async fn poll_commits(&self, after: Option<u64>) -> Result<CommitBatch, TransportError> {
            self.asked.lock().push(after);
            self.answers
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(CommitBatch::new(Vec::new(), after.unwrap_or(0))))
        }
    }

    /// Source backed by an in-memory chain. Block `n` is `blocks[n - 1]`.
    #[derive(Default)]
    struct ChainSource {
        blocks: Mutex<Vec<Vec<CommitEvent>>>,
        asked: Mutex<Vec<Option<u64>>>,
    }

    impl ChainSource {
        fn append(&self, tx: &str) -> u64 {
            let mut blocks = self.blocks.lock();
            let number = blocks.len() as u64 + 1;
            blocks.push(vec![event(tx, number)]);
            number
        }
    }

    #[async_trait]
    impl CommitEventSource for ChainSource {
        async fn poll_commits(&self, after: Option<u64>) -> Result<CommitBatch, TransportError> {
            self.asked.lock().push(after);
            let blocks = self.blocks.lock();
            let height = blocks.len() as u64;
            let from = after.unwrap_or(height) as usize;
            let events = blocks[from..].iter().flatten().cloned().collect();
            Ok(CommitBatch::new(events, height))
        }
    }

    fn event(tx: &str, block: u64) -> CommitEvent {
        CommitEvent {
            tx_id: TransactionId::new(tx),
            validity: ValidationCode::Valid,
            block_number: block,
        }
    }

    #[tokio::test]
    async fn test_poll_dispatches_and_advances_cursor() {
        let source = Arc::new(ScriptedSource::default());
        source
            .answers
            .lock()
            .push_back(Ok(CommitBatch::new(vec![event("a", 4), event("b", 5)], 5)));
        let hub = Arc::new(CommitEventHub::new());
        let mut sub = hub.register(TransactionId::new("b")).unwrap();

        let mut feed = CommitFeed::new(source.clone(), hub.clone(), CommitFeedConfig::default());
        assert_eq!(feed.poll_once().await.unwrap(), 1);
        assert_eq!(feed.cursor(), Some(5));

        feed.poll_once().await.unwrap();
        assert_eq!(*source.asked.lock(), vec![None, Some(5)]);
        assert!(matches!(sub.recv().await.unwrap(), CommitNotification::Committed(_)));
    }

    #[tokio::test]
    async fn test_blocks_between_polls_are_not_skipped() {
        let source = Arc::new(ChainSource::default());
        let hub = Arc::new(CommitEventHub::new());
        let mut sub = hub.register(TransactionId::new("mine")).unwrap();
        let mut feed = CommitFeed::new(source.clone(), hub.clone(), CommitFeedConfig::default());

        assert_eq!(feed.poll_once().await.unwrap(), 0);
        assert_eq!(feed.cursor(), Some(0));

        source.append("mine");
        source.append("other");
        assert_eq!(feed.poll_once().await.unwrap(), 1);
        assert_eq!(feed.cursor(), Some(2));
        assert_eq!(*source.asked.lock(), vec![None, Some(0)]);
        assert!(!hub.is_registered(sub.tx_id()));
        match sub.recv().await.unwrap() {
            CommitNotification::Committed(e) => assert_eq!(e.block_number, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_answer_still_advances_cursor() {
        let source = Arc::new(ScriptedSource::default());
        source.answers.lock().push_back(Ok(CommitBatch::new(Vec::new(), 12)));
        let hub = Arc::new(CommitEventHub::new());
        let mut feed = CommitFeed::new(source.clone(), hub, CommitFeedConfig::default());

        assert_eq!(feed.poll_once().await.unwrap(), 0);
        assert_eq!(feed.cursor(), Some(12));
        feed.poll_once().await.unwrap();
        assert_eq!(*source.asked.lock(), vec![None, Some(12)]);
    }

    #[tokio::test]
    async fn test_idle_long_polls_do_not_fail_listeners() {
        let source = Arc::new(ScriptedSource::default());
        for _ in 0..6 {
            source
                .answers
                .lock()
                .push_back(Err(TransportError::Timeout(10_000)));
        }
        let hub = Arc::new(CommitEventHub::new());
        let mut feed = CommitFeed::new(source.clone(), hub.clone(), CommitFeedConfig::default());

        for _ in 0..5 {
            assert_eq!(feed.poll_once().await.unwrap(), 0);
        }
        let mut sub = hub.register(TransactionId::new("fresh")).unwrap();
        assert_eq!(feed.poll_once().await.unwrap(), 0);
        assert!(hub.is_registered(sub.tx_id()));
        assert_eq!(hub.stats().total_failed.load(Ordering::Relaxed), 0);

        source
            .answers
            .lock()
            .push_back(Ok(CommitBatch::new(vec![event("fresh", 3)], 3)));
        assert_eq!(feed.poll_once().await.unwrap(), 1);
        assert!(matches!(sub.recv().await.unwrap(), CommitNotification::Committed(_)));
    }

    #[tokio::test]
    async fn test_repeated_failures_fail_listeners() {
        let source = Arc::new(ScriptedSource::default());
        for _ in 0..2 {
            source
                .answers
                .lock()
                .push_back(Err(TransportError::Unreachable("peer0".into())));
        }
        let hub = Arc::new(CommitEventHub::new());
        let mut sub = hub.register(TransactionId::new("tx")).unwrap();
        let config = CommitFeedConfig {
            poll_interval: Duration::from_millis(10),
            max_consecutive_failures: 2,
        };
        let mut feed = CommitFeed::new(source, hub.clone(), config);

        assert!(feed.poll_once().await.is_err());
        assert!(hub.is_registered(sub.tx_id()));
        assert!(feed.poll_once().await.is_err());
        assert!(!hub.is_registered(sub.tx_id()));
        assert!(matches!(sub.recv().await.unwrap(), CommitNotification::Failed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown_and_fails_waiters() {
        let source = Arc::new(ScriptedSource::default());
        let hub = Arc::new(CommitEventHub::new());
        let mut sub = hub.register(TransactionId::new("tx")).unwrap();
        let feed = CommitFeed::new(source, hub.clone(), CommitFeedConfig::default());

        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(feed.run(rx));
        tokio::time::sleep(Duration::from_secs(2)).await;
        tx.send(true).unwrap();
        task.await.unwrap();

        assert_eq!(
            sub.recv().await.unwrap(),
            CommitNotification::Failed("commit feed shut down".into())
        );
    }
}
