//! Editor directory client
//!
//! Editors are referenced by id in a submission; the directory service holds
//! their names, addresses, and affiliations. Article generation resolves
//! every distinct editor id through [`PersonLookup`] and treats any failure
//! as fatal for the export attempt.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("msub-export/", env!("CARGO_PKG_VERSION"));

/// Person lookup errors
#[derive(Debug, Error)]
pub enum PeopleError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Person not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Resolved person record as article generation consumes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub affiliations: Vec<String>,
}

/// Directory lookup seam
#[async_trait]
pub trait PersonLookup: Send + Sync {
    async fn get_person(&self, id: &str) -> Result<Person, PeopleError>;
}

/// Wire format of the directory service
#[derive(Debug, Deserialize)]
struct PersonResponse {
    id: String,
    name: PersonNameResponse,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    affiliations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PersonNameResponse {
    surname: String,
    #[serde(rename = "given-names")]
    given_names: String,
}

/// HTTP client for the directory service
pub struct PeopleApiClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl PeopleApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, PeopleError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PeopleError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl PersonLookup for PeopleApiClient {
    async fn get_person(&self, id: &str) -> Result<Person, PeopleError> {
        let url = format!("{}/people/{}", self.base_url, id);

        tracing::debug!(person_id = %id, url = %url, "Querying people API");

        let mut request = self.http_client.get(&url);
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PeopleError::Network(e.to_string()))?;

        let status = response.status();

        if status == 404 {
            return Err(PeopleError::NotFound(id.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PeopleError::Api(status.as_u16(), error_text));
        }

        let person: PersonResponse = response
            .json()
            .await
            .map_err(|e| PeopleError::Parse(e.to_string()))?;

        Ok(Person {
            id: person.id,
            name: format!("{} {}", person.name.given_names, person.name.surname),
            email: person.email,
            affiliations: person.affiliations,
        })
    }
}
