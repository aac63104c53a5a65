//! Liveness and metrics.

use crate::domain::ApiError;
use crate::router::AppState;
use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "channel": state.ledger.channel,
        "peers": state.ledger.peers,
        "activeCommitListeners": state.ledger.events.active_count(),
    }))
}

/// `GET /metrics`
pub async fn metrics() -> Result<Response, ApiError> {
    let body = ledger_telemetry::encode_metrics().map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}
