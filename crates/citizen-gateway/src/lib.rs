//! # Citizen Gateway
//!
//! REST surface for citizen records kept on the ledger. Reads go through
//! `TransactionApi::query`, writes through `TransactionApi::invoke`.
//!
//! ## Security
//!
//! | Route group | Required role | Token source |
//! |-------------|---------------|--------------|
//! | `GET /api/getCitizen` | reader | `Authorization: Bearer <token>` |
//! | create / update / delete | writer | `Authorization: Bearer <token>` |
//! | `/api/verifyProof`, `/health`, `/metrics` | none | |
//!
//! ## Module Structure
//!
//! ```text
//! citizen-gateway/
//! ├── domain/          # Config, request DTOs, roles, ApiError
//! ├── ports/           # Authenticator, ProofVerifier
//! ├── adapters/        # Static token table, proof command
//! ├── middleware/      # Role check, request span, CORS
//! ├── handlers/        # Citizen, proof, health
//! ├── router.rs
//! └── service.rs
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod router;
pub mod service;

pub use adapters::{CommandProofVerifier, StaticTokenAuthenticator};
pub use domain::{
    ApiError, ConfigError, CorsConfig, GatewayConfig, GatewayError, HttpConfig, Principal,
    ProofConfig, Role, TokenConfig,
};
pub use ports::{Authenticator, ProofError, ProofVerifier};
pub use router::{build_router, AppState, LedgerStatus};
pub use service::{GatewayService, ServerHandle};
