//! Client configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `GUARDIAN_REALTIME` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use guardian_realtime::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Connecting to {}", config.server.url);
//! ```

mod error;
mod queue;
mod reconnect;
mod server;
mod session;

pub use error::{ConfigError, ValidationError};
pub use queue::QueueConfig;
pub use reconnect::ReconnectConfig;
pub use server::{Environment, ServerConfig};
pub use session::SessionConfig;

use serde::Deserialize;

use crate::adapters::connection::ConnectionOptions;

/// Root client configuration
///
/// Every section has defaults, so an empty environment yields a client
/// pointed at a local development backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Backend URL, handshake timeout and logging
    #[serde(default)]
    pub server: ServerConfig,

    /// Reconnect budget
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Offline queue limits
    #[serde(default)]
    pub queue: QueueConfig,

    /// Token and role for the monitor binary
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `GUARDIAN_REALTIME` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `GUARDIAN_REALTIME__SERVER__URL=https://...` -> `server.url`
    /// - `GUARDIAN_REALTIME__RECONNECT__MAX_ATTEMPTS=10` -> `reconnect.max_attempts`
    /// - `GUARDIAN_REALTIME__SESSION__ROLE=responder` -> `session.role`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GUARDIAN_REALTIME")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.reconnect.validate()?;
        self.queue.validate()?;
        self.session.validate()?;
        Ok(())
    }

    /// Options handed to every connection manager the client builds.
    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            reconnect: self.reconnect.policy(),
            queue: self.queue.policy(),
        }
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
