//! Backend server configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where the realtime backend lives and how the client logs
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the realtime backend (`http(s)://` or `ws(s)://`)
    #[serde(default = "default_url")]
    pub url: String,

    /// Environment name
    #[serde(default = "default_environment")]
    pub environment: Environment,

    /// Seconds to wait for the handshake acknowledgement
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,

    /// Rust log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,
}

/// Application environment
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl ServerConfig {
    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    fn scheme(&self) -> Option<&str> {
        self.url.split_once("://").map(|(scheme, _)| scheme)
    }

    /// Validate server configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let host = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or_default();
        match self.scheme() {
            Some("http" | "https" | "ws" | "wss") if !host.is_empty() => {}
            _ => return Err(ValidationError::InvalidServerUrl(self.url.clone())),
        }
        if self.is_production() && !matches!(self.scheme(), Some("https" | "wss")) {
            return Err(ValidationError::ServerUrlMustBeSecure);
        }
        if self.handshake_timeout_secs == 0 || self.handshake_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            environment: default_environment(),
            handshake_timeout_secs: default_handshake_timeout(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_environment() -> Environment {
    Environment::Development
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info,guardian_realtime=debug".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.url, "http://localhost:5000");
        assert_eq!(config.handshake_timeout(), Duration::from_secs(10));
        assert!(!config.json_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_unknown_scheme() {
        let config = ServerConfig {
            url: "ftp://example.org".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidServerUrl(_))
        ));

        let config = ServerConfig {
            url: "localhost:5000".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_requires_tls() {
        let mut config = ServerConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::ServerUrlMustBeSecure));

        config.url = "wss://realtime.example.org".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_timeout() {
        let config = ServerConfig {
            handshake_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }
}
