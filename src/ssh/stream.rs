//! Line-by-line forwarding of remote output
//!
//! Remote stdout and stderr arrive interleaved on one SSH channel. A
//! [`StreamPump`] splits them into two pipes, each drained by its own task
//! that copies complete lines to a destination writer.

use tokio::io::{
    self, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream,
};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{DeployError, Result};

/// Capacity of each in-memory pipe between the channel and a copy task
const PIPE_CAPACITY: usize = 64 * 1024;

/// Boxed destination for forwarded output
pub type OutputWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Destinations for the remote command's standard output and standard error
pub struct OutputStreams {
    pub stdout: OutputWriter,
    pub stderr: OutputWriter,
}

impl OutputStreams {
    pub fn new(stdout: OutputWriter, stderr: OutputWriter) -> Self {
        Self { stdout, stderr }
    }

    /// Forward to this process's stdout and stderr
    pub fn console() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }
}

impl std::fmt::Debug for OutputStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputStreams").finish_non_exhaustive()
    }
}

/// Copy `src` to `dst` one line at a time until EOF
///
/// Lines are forwarded as raw bytes; `\r\n` endings become `\n` and a final
/// unterminated line gets a newline. Returns the number of lines copied.
pub async fn copy_lines<R, W>(src: R, dst: &mut W) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut reader = BufReader::new(src);
    let mut line = Vec::new();
    let mut count = 0;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        line.push(b'\n');
        dst.write_all(&line).await?;
        dst.flush().await?;
        count += 1;
    }
    Ok(count)
}

/// Feeds channel data to two concurrent line-copy tasks
///
/// Pushing never fails. Once a destination stops accepting data its chunks
/// are discarded, so the caller can keep draining the channel; the failure
/// is reported by [`StreamPump::finish`].
pub struct StreamPump {
    stdout: Option<DuplexStream>,
    stderr: Option<DuplexStream>,
    stdout_task: JoinHandle<io::Result<u64>>,
    stderr_task: JoinHandle<io::Result<u64>>,
}

impl StreamPump {
    /// Spawn the copy tasks; must be called inside a tokio runtime
    pub fn start(streams: OutputStreams) -> Self {
        let OutputStreams {
            stdout: mut stdout_dst,
            stderr: mut stderr_dst,
        } = streams;

        let (stdout, stdout_rx) = io::duplex(PIPE_CAPACITY);
        let (stderr, stderr_rx) = io::duplex(PIPE_CAPACITY);

        let stdout_task =
            tokio::spawn(async move { copy_lines(stdout_rx, &mut stdout_dst).await });
        let stderr_task =
            tokio::spawn(async move { copy_lines(stderr_rx, &mut stderr_dst).await });

        Self {
            stdout: Some(stdout),
            stderr: Some(stderr),
            stdout_task,
            stderr_task,
        }
    }

    /// Push a chunk of remote stdout
    pub async fn stdout(&mut self, data: &[u8]) {
        push(&mut self.stdout, data, "stdout").await;
    }

    /// Push a chunk of remote stderr
    pub async fn stderr(&mut self, data: &[u8]) {
        push(&mut self.stderr, data, "stderr").await;
    }

    /// Close both pipes and wait for the copy tasks to drain them
    ///
    /// Returns the number of (stdout, stderr) lines forwarded, or the first
    /// error a destination reported.
    pub async fn finish(self) -> Result<(u64, u64)> {
        let Self {
            stdout,
            stderr,
            stdout_task,
            stderr_task,
        } = self;
        drop(stdout);
        drop(stderr);

        let (out, err) = tokio::join!(stdout_task, stderr_task);
        let out = out.map_err(|e| DeployError::Io(io::Error::other(e)))??;
        let err = err.map_err(|e| DeployError::Io(io::Error::other(e)))??;
        Ok((out, err))
    }
}

/// Write to a pipe, closing it for good once its copy task has gone away
async fn push(pipe: &mut Option<DuplexStream>, data: &[u8], name: &str) {
    if let Some(writer) = pipe {
        if let Err(e) = writer.write_all(data).await {
            debug!("{} destination closed, discarding further output: {}", name, e);
            *pipe = None;
        }
    }
}
