//! Range proof verification request.

use serde::Deserialize;
use serde_json::{json, Value};

/// `POST /api/verifyProof`
///
/// Each value is whatever JSON the prover produced; it is handed to the
/// verifier wrapped in a single-key object.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyProofRequest {
    pub commitment: Value,
    pub range: Value,
    pub proof: Value,
}

impl VerifyProofRequest {
    /// `(proof, commitment, range)` as the verifier expects them.
    pub fn verifier_args(&self) -> (String, String, String) {
        (
            json!({ "proof": self.proof }).to_string(),
            json!({ "commitment": self.commitment }).to_string(),
            json!({ "range": self.range }).to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_args_wrap_and_order() {
        let request: VerifyProofRequest = serde_json::from_str(
            r#"{"commitment":"0xabc","range":[0,18],"proof":{"a":1}}"#,
        )
        .unwrap();
        let (proof, commitment, range) = request.verifier_args();
        assert_eq!(proof, r#"{"proof":{"a":1}}"#);
        assert_eq!(commitment, r#"{"commitment":"0xabc"}"#);
        assert_eq!(range, r#"{"range":[0,18]}"#);
    }
}
