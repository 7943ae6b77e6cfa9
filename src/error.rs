//! Error types for deployfast

use thiserror::Error;

/// Main error type for deployfast
#[derive(Debug, Error)]
pub enum DeployError {
    /// Dialing or talking to the SSH server failed
    #[error("SSH connection error: {0}")]
    Network(String),

    /// The server rejected the credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server's host key was refused by the host-key policy
    #[error("Host key verification failed: {0}")]
    HostKey(String),

    /// The secret could not be obtained from the credential provider
    #[error("Failed to read password: {0}")]
    Credential(String),

    /// SFTP upload failed on the remote side
    #[error("File transfer error: {0}")]
    Transfer(String),

    /// A remote command exited unsuccessfully or its channel failed
    #[error("Command `{command}` failed ({}): {output}", describe_exit(.exit_code))]
    Exec {
        command: String,
        exit_code: Option<u32>,
        output: String,
    },

    /// Invalid parameters provided
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using DeployError
pub type Result<T> = std::result::Result<T, DeployError>;

fn describe_exit(exit_code: &Option<u32>) -> String {
    match exit_code {
        Some(code) => format!("exit status {}", code),
        None => "no exit status".to_string(),
    }
}

impl DeployError {
    /// Create a network error from a string
    pub fn network(msg: impl Into<String>) -> Self {
        DeployError::Network(msg.into())
    }

    /// Create an authentication error from a string
    pub fn auth(msg: impl Into<String>) -> Self {
        DeployError::Authentication(msg.into())
    }

    /// Create a host key error from a string
    pub fn host_key(msg: impl Into<String>) -> Self {
        DeployError::HostKey(msg.into())
    }

    /// Create a transfer error from a string
    pub fn transfer(msg: impl Into<String>) -> Self {
        DeployError::Transfer(msg.into())
    }

    /// Create an invalid params error from a string
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        DeployError::InvalidParams(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        DeployError::Config(msg.into())
    }

    /// Create an execution error for a finished remote command
    pub fn exec(
        command: impl Into<String>,
        exit_code: Option<u32>,
        output: impl Into<String>,
    ) -> Self {
        DeployError::Exec {
            command: command.into(),
            exit_code,
            output: output.into(),
        }
    }

    /// Whether this error came from the remote command itself rather than the transport
    pub fn is_exec(&self) -> bool {
        matches!(self, DeployError::Exec { .. })
    }
}

impl From<russh::Error> for DeployError {
    fn from(e: russh::Error) -> Self {
        DeployError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeployError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "SSH connection error: connection refused");

        let err = DeployError::exec("bash /tmp/x.sh", Some(2), "boom");
        assert_eq!(
            err.to_string(),
            "Command `bash /tmp/x.sh` failed (exit status 2): boom"
        );

        let err = DeployError::exec("rm /tmp/x.sh", None, "");
        assert_eq!(err.to_string(), "Command `rm /tmp/x.sh` failed (no exit status): ");
    }

    #[test]
    fn test_is_exec() {
        assert!(DeployError::exec("false", Some(1), "").is_exec());
        assert!(!DeployError::network("reset").is_exec());
        assert!(!DeployError::transfer("denied").is_exec());
    }
}
