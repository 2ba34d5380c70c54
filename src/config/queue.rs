//! Outbound queue configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::queue::QueuePolicy;

/// Limits on messages buffered while offline. Unset means unlimited.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueConfig {
    /// Drop queued messages older than this many seconds
    pub max_age_secs: Option<u64>,

    /// Keep at most this many messages, dropping the oldest
    pub capacity: Option<usize>,
}

impl QueueConfig {
    pub fn policy(&self) -> QueuePolicy {
        QueuePolicy {
            max_age: self.max_age_secs.map(Duration::from_secs),
            capacity: self.capacity,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.capacity == Some(0) {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        if self.max_age_secs == Some(0) {
            return Err(ValidationError::InvalidQueueMaxAge);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded() {
        let config = QueueConfig::default();
        assert_eq!(config.policy(), QueuePolicy::unbounded());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn limits_map_to_policy() {
        let config = QueueConfig {
            max_age_secs: Some(60),
            capacity: Some(100),
        };
        let policy = config.policy();
        assert_eq!(policy.max_age, Some(Duration::from_secs(60)));
        assert_eq!(policy.capacity, Some(100));
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let config = QueueConfig {
            capacity: Some(0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidQueueCapacity));
    }
}
