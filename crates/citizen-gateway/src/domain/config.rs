//! Gateway configuration.
//!
//! Every field has a default so a partial TOML section is enough.

use super::auth::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub http: HttpConfig,
    /// Chaincode holding the citizen records
    pub chaincode_id: String,
    pub cors: CorsConfig,
    /// Bearer tokens accepted by the API
    pub tokens: Vec<TokenConfig>,
    pub proof: ProofConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            chaincode_id: "mycc".to_string(),
            cors: CorsConfig::default(),
            tokens: Vec::new(),
            proof: ProofConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chaincode_id.trim().is_empty() {
            return Err(ConfigError::EmptyChaincodeId);
        }

        let mut seen = HashSet::new();
        for entry in &self.tokens {
            if entry.token.is_empty() {
                return Err(ConfigError::EmptyToken(entry.username.clone()));
            }
            if !seen.insert(entry.token.as_str()) {
                return Err(ConfigError::DuplicateToken(entry.username.clone()));
            }
        }

        if self.proof.command.trim().is_empty() {
            return Err(ConfigError::EmptyProofCommand);
        }
        if self.proof.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("proof.timeout_ms"));
        }

        Ok(())
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

/// CORS switch. When on, any origin may call the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// One accepted bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub token: String,
    pub username: String,
    pub role: Role,
}

/// External proof verifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    /// Program to run; receives proof, commitment and range as arguments
    pub command: String,
    /// Arguments placed before the three proof arguments
    pub args: Vec<String>,
    pub timeout_ms: u64,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: vec!["verify.js".to_string()],
            timeout_ms: 10_000,
        }
    }
}

impl ProofConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("chaincode_id must not be empty")]
    EmptyChaincodeId,
    #[error("token for user '{0}' is empty")]
    EmptyToken(String),
    #[error("token for user '{0}' is already assigned to another user")]
    DuplicateToken(String),
    #[error("proof.command must not be empty")]
    EmptyProofCommand,
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}
