//! Gateway service - binds the listener and serves the router until told
//! to stop.

use crate::adapters::{CommandProofVerifier, StaticTokenAuthenticator};
use crate::domain::{GatewayConfig, GatewayError};
use crate::ports::{Authenticator, ProofVerifier};
use crate::router::{build_router, AppState, LedgerStatus};
use axum::Router;
use ledger_pipeline::TransactionApi;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// HTTP gateway in front of a [`TransactionApi`].
pub struct GatewayService {
    config: GatewayConfig,
    router: Router,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl GatewayService {
    /// Gateway with the configured token table and proof command.
    pub fn new(
        config: GatewayConfig,
        api: Arc<dyn TransactionApi>,
        ledger: LedgerStatus,
    ) -> Result<Self, GatewayError> {
        let authenticator = Arc::new(StaticTokenAuthenticator::new(config.tokens.clone()));
        let verifier = Arc::new(CommandProofVerifier::from_config(&config.proof));
        Self::with_ports(config, api, ledger, authenticator, verifier)
    }

    /// Gateway with explicit authenticator and verifier.
    pub fn with_ports(
        config: GatewayConfig,
        api: Arc<dyn TransactionApi>,
        ledger: LedgerStatus,
        authenticator: Arc<dyn Authenticator>,
        verifier: Arc<dyn ProofVerifier>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        if config.tokens.is_empty() {
            warn!("No API tokens configured; every citizen route will answer 403");
        }

        let state = AppState::new(api, verifier, &config.chaincode_id, ledger);
        let router = build_router(state, &config, authenticator);

        Ok(Self {
            config,
            router,
            shutdown_tx: None,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn addr(&self) -> SocketAddr {
        self.config.http_addr()
    }

    /// Bind and serve until [`GatewayService::shutdown`] or the
    /// returned handle's sender fires.
    pub async fn bind(&mut self) -> Result<ServerHandle, GatewayError> {
        let addr = self.addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let router = self.router.clone();
        info!(addr = %local_addr, "Citizen gateway listening");
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Ok(ServerHandle { local_addr, task })
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A running server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the server to stop.
    pub async fn wait(self) -> Result<(), GatewayError> {
        match self.task.await {
            Ok(result) => {
                result?;
                info!("Citizen gateway stopped");
                Ok(())
            }
            Err(e) => Err(GatewayError::Server(std::io::Error::other(e))),
        }
    }
}
