//! Reconnect budget configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::connection::ReconnectPolicy;

/// How often and how many times a lost channel is retried
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    /// Failed attempts before the channel gives up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed pause between attempts, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl ReconnectConfig {
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(self.max_attempts, Duration::from_millis(self.delay_ms))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        if self.delay_ms == 0 || self.delay_ms > 60_000 {
            return Err(ValidationError::InvalidReconnectDelay);
        }
        Ok(())
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    ReconnectPolicy::DEFAULT_MAX_ATTEMPTS
}

fn default_delay_ms() -> u64 {
    ReconnectPolicy::DEFAULT_DELAY.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy_defaults() {
        assert_eq!(ReconnectConfig::default().policy(), ReconnectPolicy::default());
    }

    #[test]
    fn zero_attempts_is_invalid() {
        let config = ReconnectConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxAttempts));
    }

    #[test]
    fn delay_must_be_bounded() {
        let config = ReconnectConfig {
            delay_ms: 120_000,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidReconnectDelay));
    }
}
