//! Object-storage writer
//!
//! Uploads the package with a single PUT against an S3-compatible HTTP
//! endpoint. The object is marked private and typed as a ZIP archive.

use async_trait::async_trait;
use std::time::Duration;

use msub_common::config::S3Config;

use crate::delivery::{DeliveryLocation, PackageWriter, TransportKind};
use crate::error::ExportError;

const USER_AGENT: &str = concat!("msub-export/", env!("CARGO_PKG_VERSION"));
const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

pub struct S3PackageWriter {
    http_client: reqwest::Client,
    endpoint: String,
    bucket: String,
    base_path: String,
    access_token: String,
}

impl S3PackageWriter {
    pub fn new(config: &S3Config) -> Result<Self, ExportError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| s3_err(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            base_path: config.base_path.trim_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    /// `{base_path}/{submission_id}-meca.zip`; no prefix when the base path
    /// is empty.
    fn object_key(&self, submission_id: &str) -> String {
        if self.base_path.is_empty() {
            format!("{}-meca.zip", submission_id)
        } else {
            format!("{}/{}-meca.zip", self.base_path, submission_id)
        }
    }
}

#[async_trait]
impl PackageWriter for S3PackageWriter {
    async fn write(
        &self,
        submission_id: &str,
        package: &[u8],
    ) -> Result<DeliveryLocation, ExportError> {
        let key = self.object_key(submission_id);
        let url = format!("{}/{}/{}", self.endpoint, self.bucket, key);

        tracing::debug!(
            submission_id = %submission_id,
            url = %url,
            size_bytes = package.len(),
            "Uploading package to object store"
        );

        let mut request = self
            .http_client
            .put(&url)
            .header("x-amz-acl", "private")
            .header(reqwest::header::CONTENT_TYPE, ARCHIVE_CONTENT_TYPE)
            .body(package.to_vec());
        if !self.access_token.is_empty() {
            request = request.bearer_auth(&self.access_token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| s3_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(s3_err(format!(
                "upload returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        Ok(DeliveryLocation {
            kind: TransportKind::S3,
            key,
            submission_id: submission_id.to_string(),
        })
    }
}

fn s3_err(message: String) -> ExportError {
    ExportError::Delivery {
        kind: TransportKind::S3.as_str(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str, base_path: &str) -> S3Config {
        S3Config {
            endpoint: endpoint.to_string(),
            bucket: "meca-packages".to_string(),
            base_path: base_path.to_string(),
            access_token: "test-token".to_string(),
        }
    }

    #[test]
    fn object_key_with_and_without_base_path() {
        let writer = S3PackageWriter::new(&config("http://localhost:9000", "exports")).unwrap();
        assert_eq!(writer.object_key("sub-1"), "exports/sub-1-meca.zip");

        let writer = S3PackageWriter::new(&config("http://localhost:9000", "")).unwrap();
        assert_eq!(writer.object_key("sub-1"), "sub-1-meca.zip");
    }

    #[tokio::test]
    async fn uploads_a_private_archive_object() {
        let _m = mockito::mock("PUT", "/meca-packages/exports/sub-1-meca.zip")
            .match_header("x-amz-acl", "private")
            .match_header("content-type", "application/zip")
            .with_status(200)
            .create();

        let writer = S3PackageWriter::new(&config(&mockito::server_url(), "exports")).unwrap();
        let location = writer.write("sub-1", b"zip bytes").await.unwrap();

        assert_eq!(location.kind, TransportKind::S3);
        assert_eq!(location.key, "exports/sub-1-meca.zip");
        assert_eq!(location.submission_id, "sub-1");
    }

    #[tokio::test]
    async fn failed_upload_reports_the_status() {
        let _m = mockito::mock("PUT", "/meca-packages/sub-2-meca.zip")
            .with_status(503)
            .with_body("backend unavailable")
            .create();

        let writer = S3PackageWriter::new(&config(&mockito::server_url(), "")).unwrap();
        let err = writer.write("sub-2", b"zip bytes").await.unwrap_err();

        match err {
            ExportError::Delivery { kind, message } => {
                assert_eq!(kind, "S3");
                assert!(message.contains("503"));
                assert!(message.contains("backend unavailable"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
