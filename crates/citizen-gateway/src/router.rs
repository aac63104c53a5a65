//! HTTP routes.
//!
//! | Method | Path | Role |
//! |--------|------|------|
//! | GET | `/api/getCitizen` | reader |
//! | POST | `/api/createCitizen` | writer |
//! | PUT | `/api/updateCitizen` | writer |
//! | DELETE | `/api/deleteCitizen` | writer |
//! | POST | `/api/verifyProof` | none |
//! | GET | `/health`, `/metrics` | none |

use crate::domain::{GatewayConfig, Role};
use crate::handlers::{citizen, health, proof};
use crate::middleware::{create_cors_layer, RequireRoleLayer, TracingLayer};
use crate::ports::{Authenticator, ProofVerifier};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use ledger_pipeline::{ChannelHandle, CommitEventHub, TransactionApi};
use std::sync::Arc;
use tower::ServiceBuilder;

/// Channel facts reported by `/health`.
#[derive(Clone)]
pub struct LedgerStatus {
    pub channel: String,
    pub peers: Vec<String>,
    pub events: Arc<CommitEventHub>,
}

impl LedgerStatus {
    pub fn from_channel(channel: &ChannelHandle) -> Self {
        Self {
            channel: channel.name().to_string(),
            peers: channel.peer_names(),
            events: Arc::clone(channel.events()),
        }
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn TransactionApi>,
    pub verifier: Arc<dyn ProofVerifier>,
    pub chaincode_id: Arc<str>,
    pub ledger: LedgerStatus,
}

impl AppState {
    pub fn new(
        api: Arc<dyn TransactionApi>,
        verifier: Arc<dyn ProofVerifier>,
        chaincode_id: &str,
        ledger: LedgerStatus,
    ) -> Self {
        Self {
            api,
            verifier,
            chaincode_id: Arc::from(chaincode_id),
            ledger,
        }
    }
}

/// Build the full router with middleware.
pub fn build_router(
    state: AppState,
    config: &GatewayConfig,
    authenticator: Arc<dyn Authenticator>,
) -> Router {
    let reader = Router::new()
        .route("/getCitizen", get(citizen::get_citizen))
        .route_layer(RequireRoleLayer::new(Arc::clone(&authenticator), Role::Reader));

    let writer = Router::new()
        .route("/createCitizen", post(citizen::create_citizen))
        .route("/updateCitizen", put(citizen::update_citizen))
        .route("/deleteCitizen", delete(citizen::delete_citizen))
        .route_layer(RequireRoleLayer::new(authenticator, Role::Writer));

    let api = Router::new()
        .route("/verifyProof", post(proof::verify_proof))
        .merge(reader)
        .merge(writer);

    let middleware = ServiceBuilder::new()
        .layer(create_cors_layer(&config.cors))
        .layer(TracingLayer::new());

    Router::new()
        .nest("/api", api)
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .layer(middleware)
        .with_state(state)
}
