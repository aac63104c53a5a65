//! Outbound ports.

use crate::domain::Principal;
use async_trait::async_trait;
use thiserror::Error;

/// Resolves a bearer token to a caller.
pub trait Authenticator: Send + Sync {
    /// `None` when the token belongs to nobody.
    fn authenticate(&self, token: &str) -> Option<Principal>;
}

/// Proof verifier failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("proof verifier could not be started: {0}")]
    Spawn(String),
    #[error("proof verifier exited with {0}")]
    Failed(String),
    #[error("proof verifier answered '{0}', expected true or false")]
    UnexpectedOutput(String),
    #[error("proof verifier did not answer within {0}ms")]
    Timeout(u64),
}

/// Checks a range proof against a commitment.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    async fn verify(&self, proof: &str, commitment: &str, range: &str) -> Result<bool, ProofError>;
}
