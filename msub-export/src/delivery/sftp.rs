//! Secure-file-transfer writer
//!
//! The writer owns the transfer choreography: open a fresh session, make
//! sure the target directory exists, upload, close. The session itself sits
//! behind a trait; the shipped connector works against a drop directory
//! mounted into the local filesystem, and a network-backed session slots in
//! behind the same seam.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::delivery::{DeliveryLocation, PackageWriter, TransportKind};
use crate::error::ExportError;

/// One open transfer session
#[async_trait]
pub trait SftpSession: Send {
    async fn ensure_dir(&mut self, path: &str) -> Result<(), ExportError>;
    async fn upload(&mut self, path: &str, content: &[u8]) -> Result<(), ExportError>;
    async fn close(self: Box<Self>) -> Result<(), ExportError>;
}

/// Opens a fresh session per delivery
#[async_trait]
pub trait SftpConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn SftpSession>, ExportError>;
}

pub struct SftpPackageWriter {
    connector: Arc<dyn SftpConnector>,
    remote_dir: String,
}

impl SftpPackageWriter {
    pub fn new(connector: Arc<dyn SftpConnector>, remote_dir: &str) -> Self {
        Self {
            connector,
            remote_dir: remote_dir.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PackageWriter for SftpPackageWriter {
    async fn write(
        &self,
        submission_id: &str,
        package: &[u8],
    ) -> Result<DeliveryLocation, ExportError> {
        let remote_path = format!("{}/{}-meca.zip", self.remote_dir, submission_id);

        tracing::debug!(
            submission_id = %submission_id,
            remote_path = %remote_path,
            size_bytes = package.len(),
            "Uploading package over file transfer"
        );

        // On error the session drops with the connection; close is the
        // happy-path teardown.
        let mut session = self.connector.connect().await?;
        session.ensure_dir(&self.remote_dir).await?;
        session.upload(&remote_path, package).await?;
        session.close().await?;

        Ok(DeliveryLocation {
            kind: TransportKind::Sftp,
            key: remote_path,
            submission_id: submission_id.to_string(),
        })
    }
}

/// Connector for a drop directory mounted into the local filesystem
pub struct MountedDirConnector {
    root: PathBuf,
}

impl MountedDirConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl SftpConnector for MountedDirConnector {
    async fn connect(&self) -> Result<Box<dyn SftpSession>, ExportError> {
        Ok(Box::new(MountedDirSession {
            root: self.root.clone(),
        }))
    }
}

struct MountedDirSession {
    root: PathBuf,
}

impl MountedDirSession {
    fn local_path(&self, remote: &str) -> PathBuf {
        self.root.join(remote.trim_start_matches('/'))
    }
}

#[async_trait]
impl SftpSession for MountedDirSession {
    async fn ensure_dir(&mut self, path: &str) -> Result<(), ExportError> {
        tokio::fs::create_dir_all(self.local_path(path))
            .await
            .map_err(sftp_err)
    }

    async fn upload(&mut self, path: &str, content: &[u8]) -> Result<(), ExportError> {
        tokio::fs::write(self.local_path(path), content)
            .await
            .map_err(sftp_err)
    }

    async fn close(self: Box<Self>) -> Result<(), ExportError> {
        Ok(())
    }
}

fn sftp_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Delivery {
        kind: TransportKind::Sftp.as_str(),
        message: e.to_string(),
    }
}
