//! Command execution over SSH
//!
//! Provides the `CommandOutput` struct and the `run` / `run_streamed`
//! primitives. Every call opens its own exec channel, so no shell state
//! (working directory, variables) carries over between commands.

use std::borrow::Cow;

use russh::ChannelMsg;
use tracing::debug;

use super::connection::Session;
use super::stream::{OutputStreams, StreamPump};
use crate::error::{DeployError, Result};

/// Output from a command execution
///
/// Channel data is kept as raw bytes and only decoded when read, so a
/// multi-byte character split across two packets survives intact.
#[derive(Clone, Default)]
pub struct CommandOutput {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    /// stdout and stderr merged in the order they arrived
    combined: Vec<u8>,

    /// Exit code of the command (if available)
    pub exit_code: Option<u32>,
}

impl CommandOutput {
    /// Create a new empty CommandOutput
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chunk of standard output
    pub fn push_stdout(&mut self, data: &[u8]) {
        self.stdout.extend_from_slice(data);
        self.combined.extend_from_slice(data);
    }

    /// Record a chunk of standard error
    pub fn push_stderr(&mut self, data: &[u8]) {
        self.stderr.extend_from_slice(data);
        self.combined.extend_from_slice(data);
    }

    /// Standard output from the command
    pub fn stdout(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Standard error from the command
    pub fn stderr(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Merged stdout and stderr
    pub fn combined_output(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.combined)
    }

    /// Check if the command succeeded (exit code reported and 0)
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turn a finished command into `Ok(self)` or an `Exec` error carrying the output
    pub fn into_result(self, command: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            let output = self.combined_output().into_owned();
            Err(DeployError::exec(command, self.exit_code, output))
        }
    }
}

impl std::fmt::Debug for CommandOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandOutput")
            .field("stdout", &self.stdout())
            .field("stderr", &self.stderr())
            .field("exit_code", &self.exit_code)
            .finish()
    }
}

impl Session {
    /// Run a command and collect its output
    ///
    /// # Returns
    /// * `Ok(CommandOutput)` - the command exited with status 0
    /// * `Err(DeployError::Exec)` - non-zero exit, exit by signal, or no exit status
    /// * `Err(DeployError::Network)` - the channel could not be opened
    pub async fn run(&self, command: &str) -> Result<CommandOutput> {
        debug!("Executing command: {}", command);

        let mut channel = self.open_channel().await?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| DeployError::network(format!("Failed to exec command: {}", e)))?;

        let mut output = CommandOutput::new();
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => output.push_stdout(&data),
                // ext == 1 is stderr
                ChannelMsg::ExtendedData { data, ext } => {
                    if ext == 1 {
                        output.push_stderr(&data);
                    } else {
                        output.push_stdout(&data);
                    }
                }
                ChannelMsg::ExitStatus { exit_status } => output.exit_code = Some(exit_status),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    debug!("Command killed by signal {:?}", signal_name);
                }
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        debug!(
            "Command completed: exit_code={:?}, stdout_len={}, stderr_len={}",
            output.exit_code,
            output.stdout.len(),
            output.stderr.len()
        );

        output.into_result(command)
    }

    /// Run a command, forwarding its output line by line while it runs
    ///
    /// Remote stdout goes to `streams.stdout` and remote stderr to
    /// `streams.stderr`, each through its own copy task. Returns once the
    /// remote process has exited and both copies have drained.
    pub async fn run_streamed(&self, command: &str, streams: OutputStreams) -> Result<u32> {
        debug!("Executing streamed command: {}", command);

        let mut channel = self.open_channel().await?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| DeployError::network(format!("Failed to exec command: {}", e)))?;

        // A failing destination stops forwarding but not draining: the remote
        // script runs to completion before the error is reported.
        let mut pump = StreamPump::start(streams);
        let mut exit_code = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => pump.stdout(&data).await,
                ChannelMsg::ExtendedData { data, ext } => {
                    if ext == 1 {
                        pump.stderr(&data).await;
                    } else {
                        pump.stdout(&data).await;
                    }
                }
                ChannelMsg::ExitStatus { exit_status } => exit_code = Some(exit_status),
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        let forwarded = pump.finish().await;
        debug!(
            "Streamed command completed: exit_code={:?}, forwarded={:?}",
            exit_code, forwarded
        );

        match exit_code {
            Some(0) => forwarded.map(|_| 0),
            code => Err(DeployError::exec(command, code, "")),
        }
    }
}
