//! DeployFast - provision servers and publish applications over SSH
//!
//! This crate uploads a shell script to one remote host, runs it with `sudo`
//! when possible (falling back to plain `bash`), shows its output and removes
//! it again.
//!
//! # Components
//!
//! - [`ssh`] - authenticated [`Session`] with `run`, `run_streamed` and
//!   `transfer` primitives, host-key policy and credential providers
//! - [`runner`] - the transfer / chmod / execute / cleanup workflow
//! - [`config`] - CLI arguments and `deployfast.json`
//!
//! # Example Usage (CLI)
//!
//! ```bash
//! deployfast --host=192.168.1.100 --user=admin provision
//! deployfast run publish.sh --policy collected
//! ```

pub mod config;
pub mod error;
pub mod runner;
pub mod ssh;

// Re-exports for convenience
pub use config::{Args, Command, Config, FileConfig};
pub use error::{DeployError, Result};
pub use runner::{
    ExecutionOutcome, ExecutionPolicy, RemoteHost, ScriptJob, ScriptReport, ScriptRunner,
};
pub use ssh::{
    CommandOutput, CredentialProvider, HostKeyPolicy, OutputStreams, Session, SshConfig,
    StaticCredential, TerminalPrompt,
};
