//! Citizen record endpoints.

use super::json_body;
use crate::domain::{
    ApiError, CitizenQuery, CreateCitizenRequest, DeleteCitizenRequest, Principal,
    UpdateCitizenRequest,
};
use crate::router::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Extension, Json,
};
use ledger_pipeline::{ChaincodeInvocation, PipelineError};
use serde_json::{json, Value};
use tracing::{info, warn};

fn log_failure(invocation: &str, err: &PipelineError) {
    warn!(
        invocation,
        phase = %err.phase(),
        kind = err.kind().as_str(),
        error = %err,
        "Ledger call failed"
    );
}

async fn submit(
    state: &AppState,
    principal: &Principal,
    invocation: ChaincodeInvocation,
) -> Result<Json<Value>, ApiError> {
    let label = invocation.to_string();
    match state.api.invoke(invocation).await {
        Ok(receipt) => {
            info!(
                invocation = %label,
                user = %principal.username,
                tx_id = %receipt.tx_id,
                block_number = receipt.block_number,
                "Citizen record written"
            );
            Ok(Json(json!({ "status": "success" })))
        }
        Err(err) => {
            log_failure(&label, &err);
            Err(err.into())
        }
    }
}

/// `GET /api/getCitizen`
pub async fn get_citizen(
    State(state): State<AppState>,
    query: Result<Query<CitizenQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let invocation = query.into_invocation(&state.chaincode_id)?;
    let label = invocation.to_string();

    let payload = state.api.query(invocation).await.map_err(|err| {
        log_failure(&label, &err);
        ApiError::from(err)
    })?;

    let record: Value = serde_json::from_slice(&payload).map_err(|e| {
        warn!(invocation = %label, error = %e, "Ledger returned a non-JSON record");
        ApiError::internal(format!("ledger returned a malformed record: {e}"))
    })?;
    Ok(Json(record))
}

/// `POST /api/createCitizen`
pub async fn create_citizen(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<CreateCitizenRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let invocation = json_body(body)?.into_invocation(&state.chaincode_id)?;
    submit(&state, &principal, invocation).await
}

/// `PUT /api/updateCitizen`
pub async fn update_citizen(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<UpdateCitizenRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let invocation = json_body(body)?.into_invocation(&state.chaincode_id)?;
    submit(&state, &principal, invocation).await
}

/// `DELETE /api/deleteCitizen`
pub async fn delete_citizen(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<DeleteCitizenRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let invocation = json_body(body)?.into_invocation(&state.chaincode_id)?;
    submit(&state, &principal, invocation).await
}
