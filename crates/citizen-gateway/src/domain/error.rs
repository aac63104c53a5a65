//! Gateway errors and their HTTP mapping.
//!
//! Every error leaves the gateway as `{"message": "..."}` with an explicit
//! status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_pipeline::{ErrorKind, PipelineError};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Error returned by a request handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Malformed or incomplete request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Missing token, unknown token or wrong role
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

/// HTTP status for a pipeline failure.
///
/// Only a chaincode "not found" rejection is a 404; the caller cannot act on
/// the difference between the other kinds, which stays in the logs.
pub fn status_for(err: &PipelineError) -> StatusCode {
    match err.kind() {
        ErrorKind::ProposalRejected if err.is_not_found() => StatusCode::NOT_FOUND,
        ErrorKind::ProposalRejected
        | ErrorKind::OrderingFailed
        | ErrorKind::CommitTimeout
        | ErrorKind::CommitInvalid
        | ErrorKind::CommitListenerFailed
        | ErrorKind::IdentityNotEnrolled => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self::new(status_for(&err), err.to_string())
    }
}

/// Gateway lifecycle errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_pipeline::{EndorsementStatus, RejectionCause, TransactionId, ValidationCode};

    fn tx() -> TransactionId {
        TransactionId::new("abc")
    }

    #[test]
    fn test_not_found_rejection_maps_to_404() {
        let err = PipelineError::rejected(
            RejectionCause::Endorsement(EndorsementStatus::NotFound),
            "transaction returned with failure: Error 404: citizen not found",
        );
        let api: ApiError = err.into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert!(api.message.contains("citizen not found"));
    }

    #[test]
    fn test_every_other_kind_maps_to_500() {
        let errors = vec![
            PipelineError::rejected(RejectionCause::Inconsistent, "peers disagree"),
            PipelineError::rejected(
                RejectionCause::Endorsement(EndorsementStatus::Failed),
                "chaincode error",
            ),
            PipelineError::OrderingFailed {
                tx_id: tx(),
                message: "BAD_REQUEST".into(),
            },
            PipelineError::CommitTimeout {
                tx_id: tx(),
                waited_ms: 20_000,
            },
            PipelineError::CommitInvalid {
                tx_id: tx(),
                code: ValidationCode::MvccReadConflict,
                block_number: 3,
            },
            PipelineError::CommitListenerFailed {
                tx_id: tx(),
                reason: "stream lost".into(),
            },
            PipelineError::IdentityNotEnrolled {
                name: "user1".into(),
                reason: "missing".into(),
            },
        ];
        for err in errors {
            assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR, "{err}");
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::forbidden("No token provided.").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"message": "No token provided."}));
    }
}
