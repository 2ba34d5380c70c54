//! Channel identity: roles, credentials, handshake and per-channel state.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

use super::ConnectionState;
use crate::domain::events::{Frame, HANDSHAKE_EVENT};
use crate::domain::foundation::{StateMachine, ValidationError};

/// The three client roles, each with its own backend namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Responder,
    Hospital,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Responder => "responder",
            Role::Hospital => "hospital",
        }
    }

    /// Namespace path the role's channel is opened on.
    pub fn namespace(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "citizen" => Ok(Role::Citizen),
            "responder" => Ok(Role::Responder),
            "hospital" => Ok(Role::Hospital),
            "" => Err(ValidationError::empty_field("role")),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// Session credentials presented when a channel is opened.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: SecretString,
    pub role: Role,
}

impl Credentials {
    pub fn new(token: impl Into<String>, role: Role) -> Self {
        Self {
            token: SecretString::new(token.into()),
            role,
        }
    }

    pub fn handshake(&self) -> Handshake {
        Handshake {
            token: self.token.clone(),
            role: self.role,
        }
    }
}

/// The `{token, role}` payload sent once per connection attempt.
#[derive(Debug, Clone)]
pub struct Handshake {
    pub token: SecretString,
    pub role: Role,
}

impl Handshake {
    /// Wire form of the handshake, the only place it exposes the token.
    pub fn to_frame(&self) -> Frame {
        Frame::new(
            HANDSHAKE_EVENT,
            json!({
                "token": self.token.expose_secret(),
                "role": self.role,
            }),
        )
    }
}

/// One logical, authenticated connection scoped to a namespace.
///
/// Owned by exactly one connection manager; never shared across roles.
#[derive(Debug, Clone)]
pub struct Channel {
    namespace: String,
    credentials: Option<Credentials>,
    state: ConnectionState,
    reconnect_attempts: u32,
}

impl Channel {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            credentials: None,
            state: ConnectionState::Disconnected,
            reconnect_attempts: 0,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.credentials.as_ref().map(|c| c.role)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Moves to `target`, returning the previous state.
    ///
    /// Staying in the current state is accepted as a no-op.
    pub fn transition(&mut self, target: ConnectionState) -> Result<ConnectionState, ValidationError> {
        let previous = self.state;
        if previous != target {
            self.state = previous.transition_to(target)?;
        }
        Ok(previous)
    }

    /// Starts a fresh handshake cycle with `credentials` (from Disconnected or Failed).
    pub fn begin(&mut self, credentials: Credentials) -> Result<ConnectionState, ValidationError> {
        let previous = self.transition(ConnectionState::Connecting)?;
        self.credentials = Some(credentials);
        self.reconnect_attempts = 0;
        Ok(previous)
    }

    /// Marks the handshake as accepted. Returns the previous state and the
    /// number of failed attempts that preceded it.
    pub fn accept(&mut self) -> Result<(ConnectionState, u32), ValidationError> {
        let previous = self.transition(ConnectionState::Connected)?;
        let attempts = std::mem::take(&mut self.reconnect_attempts);
        Ok((previous, attempts))
    }

    /// Records a failed attempt or a lost link. Returns the previous state and
    /// the updated attempt count.
    pub fn fail(&mut self) -> Result<(ConnectionState, u32), ValidationError> {
        let previous = self.transition(ConnectionState::Reconnecting)?;
        self.reconnect_attempts += 1;
        Ok((previous, self.reconnect_attempts))
    }

    /// Tears the channel down, forgetting its credentials. Legal from any state.
    pub fn reset(&mut self) -> ConnectionState {
        let previous = self.state;
        self.state = ConnectionState::Disconnected;
        self.credentials = None;
        self.reconnect_attempts = 0;
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Responder".parse::<Role>().unwrap(), Role::Responder);
        assert_eq!(" hospital ".parse::<Role>().unwrap(), Role::Hospital);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!("".parse::<Role>(), Err(ValidationError::empty_field("role")));
    }

    #[test]
    fn namespace_follows_role() {
        assert_eq!(Role::Citizen.namespace(), "citizen");
        assert_eq!(Role::Hospital.namespace(), "hospital");
    }

    #[test]
    fn handshake_frame_carries_token_and_role() {
        let frame = Credentials::new("t1", Role::Responder).handshake().to_frame();
        assert_eq!(frame.event, HANDSHAKE_EVENT);
        assert_eq!(frame.data["token"], "t1");
        assert_eq!(frame.data["role"], "responder");
    }

    #[test]
    fn credentials_debug_does_not_leak_token() {
        let creds = Credentials::new("super-secret", Role::Citizen);
        assert!(!format!("{:?}", creds).contains("super-secret"));
    }

    #[test]
    fn channel_counts_failures_until_accepted() {
        let mut channel = Channel::new("responder");
        channel.begin(Credentials::new("t", Role::Responder)).unwrap();

        assert_eq!(channel.fail().unwrap(), (ConnectionState::Connecting, 1));
        assert_eq!(channel.fail().unwrap(), (ConnectionState::Reconnecting, 2));
        assert_eq!(channel.accept().unwrap(), (ConnectionState::Reconnecting, 2));
        assert_eq!(channel.reconnect_attempts(), 0);
        assert_eq!(channel.state(), ConnectionState::Connected);
    }

    #[test]
    fn channel_refuses_to_skip_connecting() {
        let mut channel = Channel::new("citizen");
        assert!(channel.accept().is_err());
        assert_eq!(channel.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn reset_forgets_credentials() {
        let mut channel = Channel::new("hospital");
        channel.begin(Credentials::new("t", Role::Hospital)).unwrap();
        assert_eq!(channel.reset(), ConnectionState::Connecting);
        assert!(channel.credentials().is_none());
        assert_eq!(channel.role(), None);
    }
}
