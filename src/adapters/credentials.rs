//! Fixed credential provider, for the monitor binary and tests.

use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};

use crate::domain::connection::Role;
use crate::ports::CredentialProvider;

struct Session {
    token: SecretString,
    role: Role,
}

/// Holds one session in memory until it is revoked.
pub struct StaticCredentials {
    session: RwLock<Option<Session>>,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>, role: Role) -> Self {
        Self {
            session: RwLock::new(Some(Session {
                token: SecretString::new(token.into()),
                role,
            })),
        }
    }

    /// A provider with no session.
    pub fn anonymous() -> Self {
        Self {
            session: RwLock::new(None),
        }
    }

    /// Simulates a logout.
    pub fn revoke(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl CredentialProvider for StaticCredentials {
    fn token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.token.expose_secret().clone())
    }

    fn role(&self) -> Option<Role> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.role)
    }

    fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
