//! Gateway domain: configuration, request DTOs, roles and errors.

pub mod auth;
pub mod citizen;
pub mod config;
pub mod correlation;
pub mod error;
pub mod proof;

pub use auth::{Principal, Role};
pub use citizen::{
    CitizenQuery, CreateCitizenRequest, DeleteCitizenRequest, FieldValue, UpdateCitizenRequest,
};
pub use config::{ConfigError, CorsConfig, GatewayConfig, HttpConfig, ProofConfig, TokenConfig};
pub use correlation::{RequestId, REQUEST_ID_HEADER};
pub use error::{status_for, ApiError, GatewayError};
pub use proof::VerifyProofRequest;
