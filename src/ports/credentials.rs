//! CredentialProvider port - Where the session token and role come from.

use crate::domain::connection::{Credentials, Role};

/// Supplies the current session credentials synchronously.
///
/// Implemented by whatever owns the login session. The connection layer
/// reads it before connecting and whenever the session may have changed.
pub trait CredentialProvider: Send + Sync {
    /// Raw bearer token, if the user is logged in.
    fn token(&self) -> Option<String>;

    fn role(&self) -> Option<Role>;

    fn is_authenticated(&self) -> bool;

    /// Token and role together, when the session is authenticated.
    fn credentials(&self) -> Option<Credentials> {
        if !self.is_authenticated() {
            return None;
        }
        Some(Credentials::new(self.token()?, self.role()?))
    }
}
