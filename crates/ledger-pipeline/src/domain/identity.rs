//! Enrolled client identity.
//!
//! The gateway signs every proposal and envelope with a single ed25519 key
//! loaded at startup. The key never leaves this type.

use super::value_objects::{TransactionId, NONCE_LEN};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Public part of the identity, embedded in proposal headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub msp_id: String,
    #[serde(with = "hex::serde")]
    pub public_key: Vec<u8>,
}

impl Creator {
    /// Check a signature made by this creator.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(key_bytes) = <[u8; 32]>::try_from(self.public_key.as_slice()) else {
            return false;
        };
        let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        key.verify(message, &signature).is_ok()
    }
}

/// The enrolled user the gateway acts as.
pub struct LedgerIdentity {
    name: String,
    msp_id: String,
    certificate: String,
    signing_key: SigningKey,
}

impl LedgerIdentity {
    /// Build an identity from a 32-byte ed25519 seed.
    pub fn from_seed(
        name: impl Into<String>,
        msp_id: impl Into<String>,
        certificate: impl Into<String>,
        seed: [u8; 32],
    ) -> Self {
        Self {
            name: name.into(),
            msp_id: msp_id.into(),
            certificate: certificate.into(),
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    pub fn certificate(&self) -> &str {
        &self.certificate
    }

    pub fn creator(&self) -> Creator {
        Creator {
            msp_id: self.msp_id.clone(),
            public_key: self.signing_key.verifying_key().to_bytes().to_vec(),
        }
    }

    /// Sign arbitrary bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    /// Draw a fresh nonce and derive the transaction id for it.
    pub fn mint_transaction_id(&self) -> (TransactionId, Vec<u8>) {
        let nonce: [u8; NONCE_LEN] = rand::random();
        let tx_id = TransactionId::derive(&nonce, &self.creator());
        (tx_id, nonce.to_vec())
    }
}

impl fmt::Debug for LedgerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerIdentity")
            .field("name", &self.name)
            .field("msp_id", &self.msp_id)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> LedgerIdentity {
        LedgerIdentity::from_seed("user1", "Org1MSP", "cert", [9u8; 32])
    }

    #[test]
    fn test_signature_verifies_against_creator() {
        let id = identity();
        let sig = id.sign(b"payload");
        assert!(id.creator().verify(b"payload", &sig));
        assert!(!id.creator().verify(b"tampered", &sig));
    }

    #[test]
    fn test_mint_produces_unique_ids() {
        let id = identity();
        let (a, nonce_a) = id.mint_transaction_id();
        let (b, _) = id.mint_transaction_id();
        assert_ne!(a, b);
        assert_eq!(nonce_a.len(), NONCE_LEN);
        assert_eq!(a, TransactionId::derive(&nonce_a, &id.creator()));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", identity());
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("user1"));
    }

    #[test]
    fn test_creator_rejects_malformed_key() {
        let creator = Creator {
            msp_id: "Org1MSP".into(),
            public_key: vec![1, 2, 3],
        };
        assert!(!creator.verify(b"x", &[0u8; 64]));
    }
}
