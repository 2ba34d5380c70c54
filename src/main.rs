//! guardian-realtime monitor
//!
//! Connects to the realtime backend as the configured role and logs every
//! event it receives until Ctrl-C or until the reconnect budget runs out.

use std::sync::Arc;

use guardian_realtime::adapters::WebSocketConnector;
use guardian_realtime::application::RoleChannel;
use guardian_realtime::config::AppConfig;
use guardian_realtime::domain::connection::ConnectionState;
use guardian_realtime::domain::foundation::RealtimeError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.server.log_level))?;
    if config.server.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Already installed is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let provider = config.session.provider()?;
    let role = config.session.role()?;
    let connector = Arc::new(WebSocketConnector::new(
        config.server.url.clone(),
        config.server.handshake_timeout(),
    ));
    let channel = RoleChannel::new(role, connector, config.connection_options());

    channel.subscribe_all(|event| {
        tracing::info!(event = event.name(), payload = %event.payload_json(), "Received event");
        Ok(())
    });
    channel.manager().router().on_fault(|fault| {
        tracing::error!(handler = %fault.handler, event = %fault.event, "{}", fault.message);
    });

    tracing::info!(url = %config.server.url, role = %role, "Starting monitor");
    if let Err(error) = channel.connect_with(&provider).await {
        tracing::warn!(%error, "Initial connection failed");
        if channel.state() == ConnectionState::Disconnected {
            return Err(error.into());
        }
    }

    let mut state = channel.watch_state();
    let outcome = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Interrupted, closing channel");
            Ok(())
        }
        _ = state.wait_for(|s| *s == ConnectionState::Failed) => {
            Err(RealtimeError::ReconnectExhausted {
                max_attempts: config.reconnect.max_attempts,
            })
        }
    };

    channel.disconnect();
    outcome.map_err(Into::into)
}
