//! SSH client handler implementation
//!
//! Implements the `russh::client::Handler` trait; its only job is host key
//! verification according to the configured [`HostKeyPolicy`].

use std::path::PathBuf;

use directories::BaseDirs;
use russh::keys::{self, HashAlg, PublicKey};
use tracing::{debug, info, warn};

use super::config::{HostKeyPolicy, SshConfig};
use crate::error::DeployError;

/// Default OpenSSH known_hosts location for the current user
pub fn default_known_hosts() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".ssh").join("known_hosts"))
}

/// SSH client handler for russh
#[derive(Debug, Clone)]
pub struct SshHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    known_hosts: Option<PathBuf>,
}

impl SshHandler {
    /// Create a handler verifying keys for the host described by `config`
    pub fn new(config: &SshConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            policy: config.host_key_policy,
            known_hosts: config.known_hosts.clone().or_else(default_known_hosts),
        }
    }

    /// Apply the policy to a presented server key
    pub fn verify(&self, key: &PublicKey) -> Result<bool, DeployError> {
        let fingerprint = key.fingerprint(HashAlg::Sha256);

        if self.policy == HostKeyPolicy::Insecure {
            warn!(
                "Host key verification disabled, accepting {} key {} for {}:{}",
                key.algorithm(),
                fingerprint,
                self.host,
                self.port
            );
            return Ok(true);
        }

        let path = self.known_hosts.as_ref().ok_or_else(|| {
            DeployError::host_key("no known_hosts file available (home directory not found)")
        })?;

        match keys::known_hosts::check_known_hosts_path(&self.host, self.port, key, path) {
            Ok(true) => {
                debug!("Host key {} for {} found in {}", fingerprint, self.host, path.display());
                Ok(true)
            }
            Ok(false) if self.policy == HostKeyPolicy::AcceptNew => {
                keys::known_hosts::learn_known_hosts_path(&self.host, self.port, key, path)
                    .map_err(|e| {
                        DeployError::host_key(format!(
                            "failed to record key in {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                info!(
                    "Learned new host key {} for {}:{} into {}",
                    fingerprint,
                    self.host,
                    self.port,
                    path.display()
                );
                Ok(true)
            }
            Ok(false) => Err(DeployError::host_key(format!(
                "host {}:{} is not in {} (key {}); add it or use --host-key-policy accept-new",
                self.host,
                self.port,
                path.display(),
                fingerprint
            ))),
            Err(keys::Error::KeyChanged { line }) => Err(DeployError::host_key(format!(
                "host key for {}:{} does not match {} line {} (presented {})",
                self.host,
                self.port,
                path.display(),
                line,
                fingerprint
            ))),
            Err(e) => Err(DeployError::host_key(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

impl russh::client::Handler for SshHandler {
    type Error = DeployError;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        self.verify(server_public_key)
    }
}
