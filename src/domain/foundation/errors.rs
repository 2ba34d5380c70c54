//! Error types for the real-time client.

use std::fmt;
use thiserror::Error;

use crate::domain::connection::ConnectionState;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Stable codes for every [`RealtimeError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    TransportError,
    AuthRejected,
    ReconnectExhausted,
    CallbackFault,
    AlreadyActive,
    Unauthenticated,
    CodecError,
    Disconnected,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::TransportError => "TRANSPORT_ERROR",
            ErrorCode::AuthRejected => "AUTH_REJECTED",
            ErrorCode::ReconnectExhausted => "RECONNECT_EXHAUSTED",
            ErrorCode::CallbackFault => "CALLBACK_FAULT",
            ErrorCode::AlreadyActive => "ALREADY_ACTIVE",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::CodecError => "CODEC_ERROR",
            ErrorCode::Disconnected => "DISCONNECTED",
        };
        write!(f, "{}", s)
    }
}

/// Failures of the connection, buffering and dispatch engine.
///
/// Transport and handshake failures are normally observed through the
/// `connect_error` / `reconnect_failed` events. Only `connect` returns
/// them directly, for the first handshake of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeError {
    /// Low-level connect or send failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend refused the handshake credentials.
    #[error("handshake rejected: {0}")]
    AuthRejected(String),

    /// The reconnect budget ran out.
    #[error("reconnect budget of {max_attempts} attempts exhausted")]
    ReconnectExhausted { max_attempts: u32 },

    /// A subscriber failed while handling an event.
    #[error("handler '{handler}' failed on '{event}': {message}")]
    CallbackFault {
        handler: String,
        event: String,
        message: String,
    },

    /// `connect` was called on a channel that is already live.
    #[error("channel is already {state}")]
    AlreadyActive { state: ConnectionState },

    /// No authenticated session is available to open a channel.
    #[error("no authenticated session")]
    Unauthenticated,

    /// A frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// The channel was torn down while the caller was waiting on it.
    #[error("channel disconnected")]
    Disconnected,
}

impl RealtimeError {
    /// Returns the stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            RealtimeError::Transport(_) => ErrorCode::TransportError,
            RealtimeError::AuthRejected(_) => ErrorCode::AuthRejected,
            RealtimeError::ReconnectExhausted { .. } => ErrorCode::ReconnectExhausted,
            RealtimeError::CallbackFault { .. } => ErrorCode::CallbackFault,
            RealtimeError::AlreadyActive { .. } => ErrorCode::AlreadyActive,
            RealtimeError::Unauthenticated => ErrorCode::Unauthenticated,
            RealtimeError::Codec(_) => ErrorCode::CodecError,
            RealtimeError::Disconnected => ErrorCode::Disconnected,
        }
    }

    /// Whether an automatic retry may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RealtimeError::Transport(_) | RealtimeError::AuthRejected(_)
        )
    }
}

impl From<serde_json::Error> for RealtimeError {
    fn from(err: serde_json::Error) -> Self {
        RealtimeError::Codec(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("token");
        assert_eq!(format!("{}", err), "Field 'token' cannot be empty");
    }

    #[test]
    fn validation_error_invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("role", "unknown role 'admin'");
        assert_eq!(
            format!("{}", err),
            "Field 'role' has invalid format: unknown role 'admin'"
        );
    }

    #[test]
    fn realtime_error_maps_to_code() {
        assert_eq!(
            RealtimeError::Transport("refused".into()).code(),
            ErrorCode::TransportError
        );
        assert_eq!(
            RealtimeError::ReconnectExhausted { max_attempts: 5 }.code(),
            ErrorCode::ReconnectExhausted
        );
        assert_eq!(
            RealtimeError::AlreadyActive {
                state: ConnectionState::Connected
            }
            .code(),
            ErrorCode::AlreadyActive
        );
    }

    #[test]
    fn already_active_names_the_state() {
        let err = RealtimeError::AlreadyActive {
            state: ConnectionState::Connecting,
        };
        assert_eq!(err.to_string(), "channel is already connecting");
    }

    #[test]
    fn only_transport_and_auth_failures_are_recoverable() {
        assert!(RealtimeError::Transport("x".into()).is_recoverable());
        assert!(RealtimeError::AuthRejected("x".into()).is_recoverable());
        assert!(!RealtimeError::ReconnectExhausted { max_attempts: 5 }.is_recoverable());
        assert!(!RealtimeError::Unauthenticated.is_recoverable());
    }

    #[test]
    fn json_errors_become_codec_errors() {
        let err: RealtimeError = serde_json::from_str::<u32>("\"nope\"").unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::CodecError);
    }

    #[test]
    fn error_code_display_formats_correctly() {
        assert_eq!(format!("{}", ErrorCode::AuthRejected), "AUTH_REJECTED");
        assert_eq!(format!("{}", ErrorCode::CallbackFault), "CALLBACK_FAULT");
    }
}
