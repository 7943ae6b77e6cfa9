//! File upload over SFTP
//!
//! The SFTP subsystem runs on its own channel of the existing session; one
//! call uploads one local file to one remote path.

use std::path::Path;

use russh_sftp::client::SftpSession;
use russh_sftp::protocol::OpenFlags;
use tokio::io::{self, AsyncWriteExt};
use tracing::debug;

use super::connection::Session;
use crate::error::{DeployError, Result};

impl Session {
    /// Upload `local_path` to `remote_path`, creating or truncating the remote file
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    /// * `DeployError::Io` - the local file cannot be opened or read
    /// * `DeployError::Transfer` - the SFTP subsystem, remote open or copy failed
    pub async fn transfer(&self, local_path: &Path, remote_path: &str) -> Result<u64> {
        let mut local = tokio::fs::File::open(local_path).await.map_err(|e| {
            DeployError::Io(io::Error::new(
                e.kind(),
                format!("Failed to open local file {}: {}", local_path.display(), e),
            ))
        })?;

        let channel = self.open_channel().await?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| DeployError::transfer(format!("Failed to start SFTP subsystem: {}", e)))?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| DeployError::transfer(format!("Failed to create SFTP client: {}", e)))?;

        let mut remote = sftp
            .open_with_flags(
                remote_path,
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            )
            .await
            .map_err(|e| {
                DeployError::transfer(format!(
                    "Failed to create remote file {}: {}",
                    remote_path, e
                ))
            })?;

        let bytes = io::copy(&mut local, &mut remote).await.map_err(|e| {
            DeployError::transfer(format!(
                "Failed to copy {} to {}: {}",
                local_path.display(),
                remote_path,
                e
            ))
        })?;

        remote.shutdown().await.map_err(|e| {
            DeployError::transfer(format!("Failed to close remote file {}: {}", remote_path, e))
        })?;

        debug!(
            "Transferred {} bytes from {} to {}",
            bytes,
            local_path.display(),
            remote_path
        );
        Ok(bytes)
    }
}
