//! Session configuration for the monitor binary

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::StaticCredentials;
use crate::domain::connection::Role;

/// Credentials the monitor connects with
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Bearer token presented in the handshake
    pub token: Option<SecretString>,

    /// Role channel to open: citizen, responder or hospital
    pub role: Option<String>,
}

impl SessionConfig {
    pub fn role(&self) -> Result<Role, ValidationError> {
        let raw = self
            .role
            .as_deref()
            .ok_or(ValidationError::MissingRequired("session.role"))?;
        raw.parse()
            .map_err(|_| ValidationError::InvalidRole(raw.to_string()))
    }

    /// Builds a credential provider, or an anonymous one when no token is set.
    pub fn provider(&self) -> Result<StaticCredentials, ValidationError> {
        let role = self.role()?;
        Ok(match &self.token {
            Some(token) => StaticCredentials::new(token.expose_secret().clone(), role),
            None => StaticCredentials::anonymous(),
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(role) = &self.role {
            role.parse::<Role>()
                .map_err(|_| ValidationError::InvalidRole(role.clone()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::CredentialProvider;

    #[test]
    fn missing_role_is_reported() {
        let config = SessionConfig::default();
        assert_eq!(
            config.role(),
            Err(ValidationError::MissingRequired("session.role"))
        );
    }

    #[test]
    fn provider_carries_token_and_role() {
        let config = SessionConfig {
            token: Some(SecretString::new("tok".to_string())),
            role: Some("hospital".to_string()),
        };
        let provider = config.provider().unwrap();
        assert_eq!(provider.token().as_deref(), Some("tok"));
        assert_eq!(provider.role(), Some(Role::Hospital));
    }

    #[test]
    fn unknown_role_fails_validation() {
        let config = SessionConfig {
            role: Some("dispatcher".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidRole("dispatcher".to_string()))
        );
    }
}
