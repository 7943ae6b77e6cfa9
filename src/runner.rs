//! Remote script runner
//!
//! Composes the session primitives into one workflow: upload the script,
//! mark it executable, execute it (sudo first, plain bash as fallback) and
//! remove it again. The steps are strictly sequential; a failed upload or
//! chmod aborts the run, while a failed cleanup only produces a warning.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clap::ValueEnum;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::ssh::{
    plain_command, sudo_command, sudo_or_plain_command, validate_remote_path, CommandOutput,
    OutputStreams, Session,
};

/// Operations the runner needs from a connected host
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Run a command and collect its output; non-zero exit is an `Exec` error
    async fn run(&self, command: &str) -> Result<CommandOutput>;

    /// Run a command while forwarding its output; returns the exit status
    async fn run_streamed(&self, command: &str, streams: OutputStreams) -> Result<u32>;

    /// Upload a local file, replacing any existing remote file
    async fn transfer(&self, local_path: &Path, remote_path: &str) -> Result<u64>;
}

#[async_trait]
impl RemoteHost for Session {
    async fn run(&self, command: &str) -> Result<CommandOutput> {
        Session::run(self, command).await
    }

    async fn run_streamed(&self, command: &str, streams: OutputStreams) -> Result<u32> {
        Session::run_streamed(self, command, streams).await
    }

    async fn transfer(&self, local_path: &Path, remote_path: &str) -> Result<u64> {
        Session::transfer(self, local_path, remote_path).await
    }
}

/// How the staged script is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExecutionPolicy {
    /// Run `sudo bash`, retry as `bash` on failure, return the captured output
    Collected,
    /// Run `sudo bash || bash` remotely and print output while it runs
    #[default]
    Streamed,
}

/// A script to upload and execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptJob {
    /// Script on the local machine
    pub local_path: PathBuf,
    /// Staging location on the remote host
    pub remote_path: String,
}

impl ScriptJob {
    pub fn new(local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_path: remote_path.into(),
        }
    }
}

/// What the execution step produced
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// Output captured from the successful attempt
    Collected(CommandOutput),
    /// Output went to the console; only the exit status is kept
    Streamed { exit_code: u32 },
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct ScriptReport {
    pub outcome: ExecutionOutcome,
    /// Set when the staged script could not be removed
    pub cleanup_warning: Option<String>,
}

/// Runs scripts on one remote host
pub struct ScriptRunner<'a, H: RemoteHost + ?Sized> {
    host: &'a H,
    output: Option<OutputStreams>,
}

impl<'a, H: RemoteHost + ?Sized> ScriptRunner<'a, H> {
    /// Runner that streams output to this process's console
    pub fn new(host: &'a H) -> Self {
        Self { host, output: None }
    }

    /// Send streamed output somewhere other than the console
    pub fn with_output(mut self, streams: OutputStreams) -> Self {
        self.output = Some(streams);
        self
    }

    /// Transfer, chmod, execute and clean up `job` on the remote host
    ///
    /// The result is the execution outcome; cleanup problems are reported
    /// through [`ScriptReport::cleanup_warning`] and never turn a success
    /// into a failure. The runner is consumed, along with its output streams.
    pub async fn run(mut self, job: &ScriptJob, policy: ExecutionPolicy) -> Result<ScriptReport> {
        let remote = validate_remote_path(&job.remote_path)?;

        info!("Transferring {} to {}", job.local_path.display(), remote);
        self.host.transfer(&job.local_path, remote).await?;

        self.host.run(&format!("chmod +x {}", remote)).await?;

        info!("Executing {} ({:?})", remote, policy);
        let outcome = self.execute(remote, policy).await;

        let cleanup_warning = self.cleanup(remote).await;

        match outcome {
            Ok(outcome) => Ok(ScriptReport {
                outcome,
                cleanup_warning,
            }),
            Err(e) => {
                if let Some(warning) = cleanup_warning {
                    warn!("{}", warning);
                }
                Err(e)
            }
        }
    }

    async fn execute(&mut self, remote: &str, policy: ExecutionPolicy) -> Result<ExecutionOutcome> {
        match policy {
            ExecutionPolicy::Collected => {
                let output = match self.host.run(&sudo_command(remote)).await {
                    Ok(output) => output,
                    Err(e) if e.is_exec() => {
                        info!("sudo execution failed, retrying without sudo");
                        debug!("sudo attempt: {}", e);
                        self.host.run(&plain_command(remote)).await?
                    }
                    Err(e) => return Err(e),
                };
                Ok(ExecutionOutcome::Collected(output))
            }
            ExecutionPolicy::Streamed => {
                let streams = self.output.take().unwrap_or_else(OutputStreams::console);
                let exit_code = self
                    .host
                    .run_streamed(&sudo_or_plain_command(remote), streams)
                    .await?;
                Ok(ExecutionOutcome::Streamed { exit_code })
            }
        }
    }

    /// Remove the staged script; failures are returned as a warning message
    async fn cleanup(&self, remote: &str) -> Option<String> {
        match self.host.run(&format!("rm {}", remote)).await {
            Ok(_) => {
                debug!("Removed {}", remote);
                None
            }
            Err(e) => {
                debug!("cleanup of {} failed: {}", remote, e);
                Some(format!("Failed to remove remote script {}: {}", remote, e))
            }
        }
    }
}
