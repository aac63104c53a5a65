//! Pipeline configuration.

use std::time::Duration;
use thiserror::Error;

/// Default deadline for a commit event after submission.
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(20);

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Tunables for the transaction pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Ledger channel the gateway operates on.
    pub channel: String,
    /// How long `invoke` waits for a commit event.
    pub commit_timeout: Duration,
    /// Per-peer deadline for a proposal round-trip.
    pub proposal_timeout: Duration,
    /// Deadline for the ordering service acknowledgment.
    pub ordering_timeout: Duration,
    /// Compare every successful response with the first one.
    pub require_consistent_endorsements: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel: "mychannel".to_string(),
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
            proposal_timeout: Duration::from_secs(10),
            ordering_timeout: Duration::from_secs(10),
            require_consistent_endorsements: true,
        }
    }
}

impl PipelineConfig {
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), PipelineConfigError> {
        if self.channel.trim().is_empty() {
            return Err(PipelineConfigError::EmptyChannel);
        }
        for (name, value) in [
            ("commit_timeout", self.commit_timeout),
            ("proposal_timeout", self.proposal_timeout),
            ("ordering_timeout", self.ordering_timeout),
        ] {
            if value.is_zero() {
                return Err(PipelineConfigError::ZeroTimeout(name));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineConfigError {
    #[error("channel name must not be empty")]
    EmptyChannel,

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.commit_timeout, Duration::from_secs(20));
        assert!(config.require_consistent_endorsements);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = PipelineConfig::default().with_commit_timeout(Duration::ZERO);
        assert_eq!(
            config.validate(),
            Err(PipelineConfigError::ZeroTimeout("commit_timeout"))
        );
    }

    #[test]
    fn test_empty_channel_rejected() {
        let config = PipelineConfig::default().with_channel(" ");
        assert_eq!(config.validate(), Err(PipelineConfigError::EmptyChannel));
    }

    #[test]
    fn test_duration_millis_saturates() {
        assert_eq!(duration_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_millis(Duration::MAX), u64::MAX);
    }
}
