//! # Runtime Configuration
//!
//! One TOML file configures the whole process:
//!
//! ```toml
//! [ledger]
//! channel = "mychannel"
//! commit_timeout_ms = 20000
//!
//! [ledger.identity]
//! name = "user1"
//! dir = "hfc-key-store"
//!
//! [[ledger.peers]]
//! name = "peer0"
//! endpoint = "http://localhost:7051"
//!
//! [ledger.orderer]
//! endpoint = "http://localhost:7050"
//!
//! [gateway.http]
//! port = 8080
//! ```
//!
//! Missing keys take their defaults.

use citizen_gateway::GatewayConfig;
use ledger_pipeline::{CommitFeedConfig, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Complete process configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub ledger: LedgerConfig,
    pub gateway: GatewayConfig,
}

/// Ledger network and pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub channel: String,
    pub identity: IdentityConfig,
    pub commit_timeout_ms: u64,
    pub proposal_timeout_ms: u64,
    pub ordering_timeout_ms: u64,
    pub require_consistent_endorsements: bool,
    pub peers: Vec<PeerConfig>,
    pub orderer: OrdererConfig,
    pub events: EventsConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            channel: "mychannel".to_string(),
            identity: IdentityConfig::default(),
            commit_timeout_ms: 20_000,
            proposal_timeout_ms: 10_000,
            ordering_timeout_ms: 10_000,
            require_consistent_endorsements: true,
            peers: vec![PeerConfig {
                name: "peer0".to_string(),
                endpoint: "http://localhost:7051".to_string(),
            }],
            orderer: OrdererConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

/// Which enrolled user the gateway acts as.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub name: String,
    pub dir: PathBuf,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: "user1".to_string(),
            dir: PathBuf::from("hfc-key-store"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    pub name: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdererConfig {
    pub endpoint: String,
}

impl Default for OrdererConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:7050".to_string(),
        }
    }
}

/// Commit event feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Peer serving commit events; the first peer when unset.
    pub peer: Option<String>,
    pub poll_interval_ms: u64,
    /// How long one `/commits` long-poll may stay open.
    pub long_poll_timeout_ms: u64,
    pub max_consecutive_failures: u32,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            peer: None,
            poll_interval_ms: 500,
            long_poll_timeout_ms: 30_000,
            max_consecutive_failures: 5,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("[ledger] {0}")]
    Ledger(String),

    #[error("[gateway] {0}")]
    Gateway(#[from] citizen_gateway::ConfigError),
}

impl RuntimeConfig {
    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ledger.validate()?;
        self.gateway.validate()?;
        Ok(())
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Ledger(msg));

        if self.peers.is_empty() {
            return invalid("at least one peer is required".into());
        }
        let mut names = HashSet::new();
        for peer in &self.peers {
            if peer.name.trim().is_empty() || peer.endpoint.trim().is_empty() {
                return invalid("every peer needs a name and an endpoint".into());
            }
            if !names.insert(peer.name.as_str()) {
                return invalid(format!("peer '{}' is listed twice", peer.name));
            }
        }
        if self.orderer.endpoint.trim().is_empty() {
            return invalid("orderer.endpoint must not be empty".into());
        }
        if self.identity.name.trim().is_empty() {
            return invalid("identity.name must not be empty".into());
        }
        if let Some(peer) = &self.events.peer {
            if !names.contains(peer.as_str()) {
                return invalid(format!("events.peer '{peer}' is not a configured peer"));
            }
        }
        if self.events.poll_interval_ms == 0 {
            return invalid("events.poll_interval_ms must be greater than zero".into());
        }
        if self.events.long_poll_timeout_ms == 0 {
            return invalid("events.long_poll_timeout_ms must be greater than zero".into());
        }
        if self.events.max_consecutive_failures == 0 {
            return invalid("events.max_consecutive_failures must be greater than zero".into());
        }

        self.pipeline_config()
            .validate()
            .map_err(|e| ConfigError::Ledger(e.to_string()))
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            channel: self.channel.clone(),
            commit_timeout: Duration::from_millis(self.commit_timeout_ms),
            proposal_timeout: Duration::from_millis(self.proposal_timeout_ms),
            ordering_timeout: Duration::from_millis(self.ordering_timeout_ms),
            require_consistent_endorsements: self.require_consistent_endorsements,
        }
    }

    pub fn feed_config(&self) -> CommitFeedConfig {
        CommitFeedConfig {
            poll_interval: Duration::from_millis(self.events.poll_interval_ms),
            max_consecutive_failures: self.events.max_consecutive_failures,
        }
    }

    /// Peer serving commit events.
    pub fn event_peer(&self) -> Option<&PeerConfig> {
        match &self.events.peer {
            Some(name) => self.peers.iter().find(|p| &p.name == name),
            None => self.peers.first(),
        }
    }
}
