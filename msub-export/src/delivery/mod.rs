//! Package delivery
//!
//! One assembled package goes to every configured destination. The writers
//! run concurrently and the first failure fails the whole delivery; there is
//! no partial success and no retry here. The operator re-triggers the export
//! after fixing the destination.

pub mod s3;
pub mod sftp;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use msub_common::config::DeliveryConfig;

use crate::delivery::s3::S3PackageWriter;
use crate::delivery::sftp::{MountedDirConnector, SftpPackageWriter};
use crate::error::ExportError;

/// Transport that carried a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportKind {
    S3,
    Sftp,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::S3 => "S3",
            TransportKind::Sftp => "SFTP",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where one writer put a package
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryLocation {
    pub kind: TransportKind,
    pub key: String,
    pub submission_id: String,
}

/// One delivery destination
#[async_trait]
pub trait PackageWriter: Send + Sync {
    async fn write(
        &self,
        submission_id: &str,
        package: &[u8],
    ) -> Result<DeliveryLocation, ExportError>;
}

/// Fan-out over every configured transport
pub struct PackageStore {
    writers: Vec<Arc<dyn PackageWriter>>,
}

impl PackageStore {
    pub fn new(writers: Vec<Arc<dyn PackageWriter>>) -> Self {
        Self { writers }
    }

    /// One writer per present config section.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, ExportError> {
        let mut writers: Vec<Arc<dyn PackageWriter>> = Vec::new();
        if let Some(s3) = &config.s3 {
            writers.push(Arc::new(S3PackageWriter::new(s3)?));
        }
        if let Some(sftp) = &config.sftp {
            if sftp.mount.as_os_str().is_empty() {
                warn!(
                    host = %sftp.host,
                    "SFTP destination has no local mount configured; skipping"
                );
            } else {
                writers.push(Arc::new(SftpPackageWriter::new(
                    Arc::new(MountedDirConnector::new(&sftp.mount)),
                    &sftp.remote_dir,
                )));
            }
        }
        Ok(Self::new(writers))
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    /// Write the package everywhere at once; any failure aborts the whole
    /// delivery.
    pub async fn deliver(
        &self,
        submission_id: &str,
        package: &[u8],
    ) -> Result<Vec<DeliveryLocation>, ExportError> {
        let locations = try_join_all(
            self.writers
                .iter()
                .map(|writer| writer.write(submission_id, package)),
        )
        .await?;
        for location in &locations {
            info!(
                submission_id = %location.submission_id,
                transport = %location.kind,
                key = %location.key,
                "Package delivered"
            );
        }
        Ok(locations)
    }
}
