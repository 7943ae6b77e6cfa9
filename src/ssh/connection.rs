//! SSH session
//!
//! One authenticated connection to one host. A [`Session`] is created by
//! [`Session::connect`], hands out a fresh channel for every command or
//! transfer, and is released by [`Session::close`].

use std::sync::Arc;

use russh::client::{self, Handle};
use russh::Channel;
use secrecy::ExposeSecret;
use tokio::time::timeout;
use tracing::{debug, error, info};

use super::config::SshConfig;
use super::credentials::CredentialProvider;
use super::handler::SshHandler;
use crate::error::{DeployError, Result};

/// A live, authenticated SSH connection
pub struct Session {
    /// Parameters the session was opened with
    config: SshConfig,

    /// russh client handle
    handle: Handle<SshHandler>,
}

impl Session {
    /// Prompt for the password, dial the host and authenticate
    ///
    /// # Errors
    /// * `DeployError::Credential` - the provider could not produce a password
    /// * `DeployError::Network` - dial failure or connect timeout
    /// * `DeployError::HostKey` - the host key was refused by the policy
    /// * `DeployError::Authentication` - the password was rejected
    pub async fn connect(config: SshConfig, credentials: &dyn CredentialProvider) -> Result<Self> {
        let password = credentials.password(&config.username, &config.host)?;

        info!(
            "Connecting to SSH server {} (host key policy: {})...",
            config.address(),
            config.host_key_policy
        );

        let ssh_config = Arc::new(client::Config::default());
        let addr = config.address();
        let connect_result = timeout(
            config.connect_timeout,
            client::connect(ssh_config, addr.as_str(), SshHandler::new(&config)),
        )
        .await;

        let mut handle = match connect_result {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                error!("SSH connection failed: {}", e);
                return Err(e);
            }
            Err(_) => {
                error!("SSH connection timeout after {:?}", config.connect_timeout);
                return Err(DeployError::network(format!(
                    "Connection to {} timed out after {:?}",
                    addr, config.connect_timeout
                )));
            }
        };

        debug!(
            "Attempting password authentication for user '{}'",
            config.username
        );
        let auth_result = handle
            .authenticate_password(&config.username, password.expose_secret())
            .await
            .map_err(|e| DeployError::auth(e.to_string()))?;

        if !auth_result.success() {
            return Err(DeployError::auth(format!(
                "Password authentication rejected for {}@{}",
                config.username, config.host
            )));
        }

        info!(
            "Successfully connected to {}@{}:{}",
            config.username, config.host, config.port
        );

        Ok(Self { config, handle })
    }

    /// Parameters this session was opened with
    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    /// Open a new session channel
    pub(crate) async fn open_channel(&self) -> Result<Channel<client::Msg>> {
        self.handle
            .channel_open_session()
            .await
            .map_err(|e| DeployError::network(format!("Failed to open channel: {}", e)))
    }

    /// Disconnect from the server
    pub async fn close(self) {
        if let Err(e) = self
            .handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await
        {
            debug!("Disconnect reported an error: {}", e);
        }
        info!("SSH connection to {} closed", self.config.address());
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("username", &self.config.username)
            .finish_non_exhaustive()
    }
}
