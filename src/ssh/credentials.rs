//! Sources of the SSH password
//!
//! Connecting never reads the terminal directly; it asks a [`CredentialProvider`].
//! The binary uses [`TerminalPrompt`], tests and non-interactive runs use
//! [`StaticCredential`].

use secrecy::{ExposeSecret, SecretString};

use crate::error::{DeployError, Result};

/// Supplies the secret used for password authentication
pub trait CredentialProvider: Send + Sync {
    /// Return the password for `user@host`
    fn password(&self, user: &str, host: &str) -> Result<SecretString>;
}

/// Prompts on the controlling terminal without echoing input
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl CredentialProvider for TerminalPrompt {
    fn password(&self, user: &str, host: &str) -> Result<SecretString> {
        let prompt = format!("Enter SSH password for {}@{}: ", user, host);
        rpassword::prompt_password(prompt)
            .map(SecretString::from)
            .map_err(|e| DeployError::Credential(e.to_string()))
    }
}

/// A fixed password known up front
pub struct StaticCredential(SecretString);

impl StaticCredential {
    pub fn new(password: impl Into<String>) -> Self {
        Self(SecretString::from(password.into()))
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticCredential([REDACTED])")
    }
}

impl CredentialProvider for StaticCredential {
    fn password(&self, _user: &str, _host: &str) -> Result<SecretString> {
        Ok(SecretString::from(self.0.expose_secret()))
    }
}
