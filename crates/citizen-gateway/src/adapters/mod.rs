//! Adapters for the gateway's outbound ports.

pub mod proof_command;
pub mod static_auth;

pub use proof_command::CommandProofVerifier;
pub use static_auth::StaticTokenAuthenticator;
