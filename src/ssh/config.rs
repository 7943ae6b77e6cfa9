//! SSH connection parameters
//!
//! Everything needed to dial and verify one remote host. The password is not
//! part of this struct; it comes from a [`CredentialProvider`](super::CredentialProvider)
//! at connect time.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;

use crate::error::DeployError;

/// Connection timeout in seconds
pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// How the server's host key is checked against the known-hosts file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum HostKeyPolicy {
    /// Only hosts already present in known_hosts are accepted
    #[default]
    Strict,
    /// Unknown hosts are learned into known_hosts, changed keys are refused
    AcceptNew,
    /// Any key is accepted without verification
    Insecure,
}

impl fmt::Display for HostKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostKeyPolicy::Strict => "strict",
            HostKeyPolicy::AcceptNew => "accept-new",
            HostKeyPolicy::Insecure => "insecure",
        };
        f.write_str(name)
    }
}

impl FromStr for HostKeyPolicy {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(HostKeyPolicy::Strict),
            "accept-new" | "accept_new" => Ok(HostKeyPolicy::AcceptNew),
            "insecure" | "none" => Ok(HostKeyPolicy::Insecure),
            other => Err(DeployError::config(format!(
                "unknown host key policy '{}' (expected strict, accept-new or insecure)",
                other
            ))),
        }
    }
}

/// SSH connection configuration
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Remote hostname or IP address
    pub host: String,

    /// SSH port (default: 22)
    pub port: u16,

    /// Username for authentication
    pub username: String,

    /// Host key verification policy
    pub host_key_policy: HostKeyPolicy,

    /// known_hosts file consulted by the policy (None = ~/.ssh/known_hosts)
    pub known_hosts: Option<PathBuf>,

    /// Time allowed for the TCP dial and SSH handshake
    pub connect_timeout: Duration,
}

impl SshConfig {
    /// Create a new SSH configuration with minimal required fields
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            host_key_policy: HostKeyPolicy::default(),
            known_hosts: None,
            connect_timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Set the SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the host key policy
    pub fn with_host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    /// Use a specific known_hosts file
    pub fn with_known_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts = Some(path.into());
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// `host:port` address used for dialing
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
