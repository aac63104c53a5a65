//! Proof verification by an external program.
//!
//! The program gets the proof, the commitment and the range as its last
//! three arguments and prints `true` or `false`.

use crate::domain::ProofConfig;
use crate::ports::{ProofError, ProofVerifier};
use async_trait::async_trait;
use ledger_pipeline::duration_millis;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs the configured verifier command once per request.
#[derive(Debug, Clone)]
pub struct CommandProofVerifier {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandProofVerifier {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &ProofConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone(), config.timeout())
    }
}

fn parse_answer(stdout: &[u8]) -> Result<bool, ProofError> {
    let answer = String::from_utf8_lossy(stdout);
    match answer.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ProofError::UnexpectedOutput(other.to_string())),
    }
}

#[async_trait]
impl ProofVerifier for CommandProofVerifier {
    async fn verify(&self, proof: &str, commitment: &str, range: &str) -> Result<bool, ProofError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(proof)
            .arg(commitment)
            .arg(range)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|e| ProofError::Spawn(e.to_string()))?,
            Err(_) => return Err(ProofError::Timeout(duration_millis(self.timeout))),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "Proof verifier failed");
            return Err(ProofError::Failed(output.status.to_string()));
        }

        let answer = parse_answer(&output.stdout)?;
        debug!(answer, "Proof verified");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer(b"true\n"), Ok(true));
        assert_eq!(parse_answer(b"  false "), Ok(false));
        assert!(matches!(
            parse_answer(b"maybe"),
            Err(ProofError::UnexpectedOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let verifier = CommandProofVerifier::new(
            "/nonexistent/proof-verifier",
            vec![],
            Duration::from_secs(1),
        );
        let err = verifier.verify("p", "c", "r").await.unwrap_err();
        assert!(matches!(err, ProofError::Spawn(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_verifier_answers() {
        // `sh -c script $0 proof commitment range`
        let verifier = CommandProofVerifier::new(
            "sh",
            vec![
                "-c".into(),
                r#"[ "$2" = "{\"commitment\":\"c\"}" ] && echo true || echo false"#.into(),
                "verify".into(),
            ],
            Duration::from_secs(5),
        );
        assert_eq!(
            verifier
                .verify("{\"proof\":\"p\"}", "{\"commitment\":\"c\"}", "{\"range\":\"r\"}")
                .await,
            Ok(true)
        );
        assert_eq!(verifier.verify("x", "y", "z").await, Ok(false));
    }
}
