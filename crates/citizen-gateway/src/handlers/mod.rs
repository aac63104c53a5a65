//! Request handlers.

pub mod citizen;
pub mod health;
pub mod proof;

use crate::domain::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::Json;

/// Unwrap a JSON body, turning a rejection into a 400 with the usual body.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}
