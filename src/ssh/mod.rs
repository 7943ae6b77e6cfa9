//! SSH session management module
//!
//! This module provides the authenticated connection, command execution,
//! output streaming and SFTP upload primitives used by the script runner.

pub mod command;
pub mod config;
pub mod connection;
pub mod credentials;
pub mod elevation;
pub mod handler;
pub mod sanitize;
pub mod stream;
pub mod transfer;

// Re-exports
pub use command::CommandOutput;
pub use config::{HostKeyPolicy, SshConfig};
pub use connection::Session;
pub use credentials::{CredentialProvider, StaticCredential, TerminalPrompt};
pub use elevation::{plain_command, sudo_command, sudo_or_plain_command};
pub use handler::SshHandler;
pub use sanitize::{staging_path_for, validate_remote_path};
pub use stream::{OutputStreams, OutputWriter};
