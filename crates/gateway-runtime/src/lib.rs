//! # Gateway Runtime
//!
//! Wires the ledger pipeline to the HTTP gateway and runs both.
//!
//! ## Startup Sequence
//!
//! 1. Load and validate configuration
//! 2. Initialize telemetry (`main.rs`)
//! 3. Load the enrolled identity; a missing enrollment is fatal
//! 4. Build the channel handle (peers, orderer, commit event hub) once
//! 5. Spawn the commit feed
//! 6. Serve HTTP until the shutdown future resolves or the server exits
//!
//! On shutdown the commit feed stops and fails any listener still waiting.

pub mod config;

pub use config::{ConfigError, RuntimeConfig};

use anyhow::{Context, Result};
use citizen_gateway::{GatewayService, LedgerStatus};
use ledger_pipeline::{
    ChannelHandle, CommitEventHub, CommitEventSource, CommitFeed, FileIdentityStore,
    HttpOrderingClient, HttpPeerClient, IdentityStore, LedgerIdentity, PeerClient, PipelinePhase,
    TransactionOrchestrator,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// The assembled process.
pub struct GatewayRuntime {
    config: RuntimeConfig,
    channel: Arc<ChannelHandle>,
    orchestrator: Arc<TransactionOrchestrator>,
    commit_source: Arc<dyn CommitEventSource>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayRuntime {
    /// Load the identity named in the configuration and build the runtime.
    pub fn build(config: RuntimeConfig) -> Result<Self> {
        let store = FileIdentityStore::new(&config.ledger.identity.dir);
        let identity = store
            .load_enrolled_identity(&config.ledger.identity.name)
            .map_err(|e| {
                error!(
                    phase = %PipelinePhase::Startup,
                    identity = %config.ledger.identity.name,
                    error = %e,
                    "Identity is not enrolled; run the enrollment step first"
                );
                e
            })
            .with_context(|| {
                format!(
                    "cannot start without an enrolled identity in {}",
                    config.ledger.identity.dir.display()
                )
            })?;

        Self::with_identity(config, identity)
    }

    /// Build the runtime around an already loaded identity.
    pub fn with_identity(config: RuntimeConfig, identity: LedgerIdentity) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        let ledger = &config.ledger;
        let proposal_timeout = Duration::from_millis(ledger.proposal_timeout_ms);
        let long_poll_timeout = Duration::from_millis(ledger.events.long_poll_timeout_ms);

        let mut peers: Vec<Arc<dyn PeerClient>> = Vec::with_capacity(ledger.peers.len());
        let mut commit_source: Option<Arc<dyn CommitEventSource>> = None;
        let event_peer = ledger.event_peer().map(|p| p.name.as_str());

        for peer in &ledger.peers {
            let client = Arc::new(
                HttpPeerClient::new(&peer.name, &peer.endpoint, proposal_timeout)
                    .with_context(|| format!("cannot create client for peer {}", peer.name))?
                    .with_poll_timeout(long_poll_timeout),
            );
            if event_peer == Some(peer.name.as_str()) {
                commit_source = Some(client.clone() as Arc<dyn CommitEventSource>);
            }
            peers.push(client);
        }
        let commit_source = commit_source.context("no peer configured for commit events")?;

        let orderer = Arc::new(
            HttpOrderingClient::new(
                &ledger.orderer.endpoint,
                Duration::from_millis(ledger.ordering_timeout_ms),
            )
            .context("cannot create ordering client")?,
        );

        let channel = Arc::new(ChannelHandle::new(
            &ledger.channel,
            peers,
            orderer,
            Arc::new(CommitEventHub::new()),
        ));
        let orchestrator = Arc::new(TransactionOrchestrator::new(
            Arc::new(identity),
            Arc::clone(&channel),
            ledger.pipeline_config(),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            config,
            channel,
            orchestrator,
            commit_source,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn channel(&self) -> &Arc<ChannelHandle> {
        &self.channel
    }

    /// Run until `shutdown` resolves or the HTTP server exits.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let feed = CommitFeed::new(
            Arc::clone(&self.commit_source),
            Arc::clone(self.channel.events()),
            self.config.ledger.feed_config(),
        );
        let feed_task = tokio::spawn(feed.run(self.shutdown_rx.clone()));

        let mut gateway = GatewayService::new(
            self.config.gateway.clone(),
            self.orchestrator.clone(),
            LedgerStatus::from_channel(&self.channel),
        )
        .context("invalid gateway configuration")?;

        let server = match gateway.bind().await {
            Ok(server) => server,
            Err(e) => {
                let _ = self.shutdown_tx.send(true);
                return Err(e).context("failed to start HTTP server");
            }
        };

        info!(
            addr = %server.local_addr(),
            channel = %self.channel.name(),
            peers = ?self.channel.peer_names(),
            "Citizen ledger gateway running"
        );

        let wait = server.wait();
        tokio::pin!(wait);
        let served = tokio::select! {
            result = &mut wait => {
                warn!("HTTP server exited on its own");
                result
            }
            _ = shutdown => {
                info!("Initiating graceful shutdown...");
                gateway.shutdown();
                wait.await
            }
        };

        if let Err(e) = self.shutdown_tx.send(true) {
            error!(error = %e, "Failed to signal commit feed shutdown");
        }
        if let Err(e) = feed_task.await {
            warn!(error = %e, "Commit feed task ended abnormally");
        }

        info!("Shutdown complete");
        served.context("HTTP server failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.ledger.identity.dir = dir.path().to_path_buf();
        config.gateway.http.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.gateway.http.port = 0;
        config
    }

    #[test]
    fn test_missing_identity_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = GatewayRuntime::build(config_in(&dir)).err().unwrap();
        let chain = format!("{err:#}");
        assert!(chain.contains("enrolled identity"), "{chain}");
        assert!(chain.contains("user1"), "{chain}");
    }

    #[test]
    fn test_build_wires_channel() {
        let dir = TempDir::new().unwrap();
        FileIdentityStore::new(dir.path())
            .save("user1", "Org1MSP", "cert", &[9u8; 32])
            .unwrap();

        let mut config = config_in(&dir);
        config.ledger.peers.push(config::PeerConfig {
            name: "peer1".into(),
            endpoint: "http://localhost:8051".into(),
        });

        let runtime = GatewayRuntime::build(config).unwrap();
        assert_eq!(runtime.channel().name(), "mychannel");
        assert_eq!(runtime.channel().peer_names(), vec!["peer0", "peer1"]);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let identity = LedgerIdentity::from_seed("user1", "Org1MSP", "", [2u8; 32]);
        let runtime = GatewayRuntime::with_identity(config_in(&dir), identity).unwrap();
        let hub = Arc::clone(runtime.channel().events());

        runtime
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();
        assert_eq!(hub.active_count(), 0);
    }
}
