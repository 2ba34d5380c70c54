//! Connection health state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Health of a channel. Exactly one value is current per channel.
///
/// ```text
/// Disconnected ──connect──▶ Connecting ──accepted──▶ Connected
///       ▲                       │                       │
///       │                    failure                  loss
///       │                       ▼                       │
///       │                 Reconnecting ◀────────────────┘
///       │                   │       │
///       │              accepted   budget spent
///       │                   │       ▼
///       │          Connected◀┘    Failed ──connect/reconnect──▶ Connecting
///       └───────── disconnect (from every state)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Reconnect budget exhausted. No automatic attempts until an explicit reconnect.
    Failed,
}

impl ConnectionState {
    pub const ALL: [ConnectionState; 5] = [
        ConnectionState::Disconnected,
        ConnectionState::Connecting,
        ConnectionState::Connected,
        ConnectionState::Reconnecting,
        ConnectionState::Failed,
    ];

    /// True while a background task owns the channel and may touch the transport.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Reconnecting
        )
    }

    pub fn is_connected(&self) -> bool {
        *self == ConnectionState::Connected
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Reconnecting)
                | (Connected, Reconnecting)
                | (Reconnecting, Connected)
                | (Reconnecting, Failed)
                | (Failed, Connecting)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
                | (Reconnecting, Disconnected)
                | (Failed, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Connected, Reconnecting, Disconnected],
            Connected => vec![Reconnecting, Disconnected],
            Reconnecting => vec![Connected, Failed, Disconnected],
            Failed => vec![Connecting, Disconnected],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};

    use ConnectionState::*;

    fn reachable_from(start: ConnectionState, skip: Option<ConnectionState>) -> HashSet<ConnectionState> {
        let mut seen = HashSet::from([start]);
        let mut frontier = VecDeque::from([start]);
        while let Some(state) = frontier.pop_front() {
            for next in state.valid_transitions() {
                if Some(next) == skip {
                    continue;
                }
                if seen.insert(next) {
                    frontier.push_back(next);
                }
            }
        }
        seen
    }

    #[test]
    fn every_state_is_reachable_from_disconnected() {
        let reachable = reachable_from(Disconnected, None);
        for state in ConnectionState::ALL {
            assert!(reachable.contains(&state), "{state} unreachable");
        }
    }

    #[test]
    fn connected_is_unreachable_without_connecting() {
        let reachable = reachable_from(Disconnected, Some(Connecting));
        assert!(!reachable.contains(&Connected));
        assert!(!Disconnected.can_transition_to(&Connected));
    }

    #[test]
    fn disconnect_is_legal_from_every_live_state() {
        for state in [Connecting, Connected, Reconnecting, Failed] {
            assert!(state.can_transition_to(&Disconnected), "{state}");
        }
    }

    #[test]
    fn failed_only_leaves_through_explicit_actions() {
        assert_eq!(Failed.valid_transitions(), vec![Connecting, Disconnected]);
        assert!(!Failed.can_transition_to(&Reconnecting));
        assert!(!Failed.can_transition_to(&Connected));
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for from in ConnectionState::ALL {
            for to in ConnectionState::ALL {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn active_states_are_the_task_owned_ones() {
        assert!(Connecting.is_active());
        assert!(Connected.is_active());
        assert!(Reconnecting.is_active());
        assert!(!Disconnected.is_active());
        assert!(!Failed.is_active());
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Reconnecting).unwrap(), "\"reconnecting\"");
    }
}
