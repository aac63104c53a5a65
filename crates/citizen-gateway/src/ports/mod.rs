//! Ports the gateway depends on.
//!
//! The ledger side is `ledger_pipeline::TransactionApi`; the ports here cover
//! what the gateway needs beyond the ledger.

pub mod outbound;

pub use outbound::{Authenticator, ProofError, ProofVerifier};
