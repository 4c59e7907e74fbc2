//! Transfer authentication XML generator
//!
//! The receiving system authenticates an incoming package with a signed
//! token carried inside the archive. The token is an HS256 JWT whose
//! subject is the submission id; the issuer and lifetime come from
//! configuration.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use quick_xml::events::BytesStart;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use msub_common::config::TransferConfig;

use crate::error::ExportError;
use crate::export::xml::{document_writer, end, leaf, start};

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferClaims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Build the transfer document for one submission.
pub fn generate_transfer_xml(
    config: &TransferConfig,
    submission_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    let claims = TransferClaims {
        iss: config.issuer.clone(),
        sub: submission_id.to_string(),
        iat: now.timestamp(),
        exp: now.timestamp() + config.ttl_seconds as i64,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| ExportError::Token(e.to_string()))?;

    let mut writer = document_writer()?;

    let mut transfer = BytesStart::new("transfer");
    transfer.push_attribute(("version", "1.0"));
    start(&mut writer, transfer)?;

    start(&mut writer, BytesStart::new("service-provider"))?;
    leaf(&mut writer, "provider-name", &config.issuer)?;
    end(&mut writer, "service-provider")?;

    start(&mut writer, BytesStart::new("authentication"))?;
    leaf(&mut writer, "code", &token)?;
    end(&mut writer, "authentication")?;

    end(&mut writer, "transfer")?;

    Ok(writer.into_inner())
}
