//! Range proof verification.

use super::json_body;
use crate::domain::{ApiError, VerifyProofRequest};
use crate::router::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};
use tracing::warn;

/// `POST /api/verifyProof`
pub async fn verify_proof(
    State(state): State<AppState>,
    body: Result<Json<VerifyProofRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(body)?;
    let (proof, commitment, range) = request.verifier_args();

    let answer = state
        .verifier
        .verify(&proof, &commitment, &range)
        .await
        .map_err(|e| {
            warn!(error = %e, "Proof verification failed");
            ApiError::internal(e.to_string())
        })?;

    Ok(Json(json!({ "answer": answer })))
}
