use std::sync::Arc;
use std::time::Duration;

use recall_logging::{recall_debug, recall_info};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use url::Url;

use crate::credentials::CredentialStore;
use crate::{FailureKind, RetrievalError, RetrievedAnswer};

#[derive(Debug, Clone)]
pub struct RetrieveSettings {
    pub api_base_url: String,
    pub endpoint_path: String,
    pub top_k: u32,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for RetrieveSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            endpoint_path: "/api/memories/retrieve-answer/".to_string(),
            top_k: 5,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<RetrievedAnswer, RetrievalError>;
}

/// Looks up answers over HTTP, reading the credential fresh for every call.
pub struct ReqwestRetriever {
    settings: RetrieveSettings,
    credentials: Arc<dyn CredentialStore>,
    client: reqwest::Client,
}

impl ReqwestRetriever {
    pub fn new(
        settings: RetrieveSettings,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| RetrievalError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            credentials,
            client,
        })
    }

    fn endpoint(&self, query: &str) -> Result<Url, RetrievalError> {
        let mut url = Url::parse(&self.settings.api_base_url)
            .and_then(|base| base.join(&self.settings.endpoint_path))
            .map_err(|err| RetrievalError::new(FailureKind::InvalidUrl, err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("top_k", &self.settings.top_k.to_string());
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Retriever for ReqwestRetriever {
    async fn retrieve(&self, query: &str) -> Result<RetrievedAnswer, RetrievalError> {
        let credential = self.credentials.current();
        if !credential.is_valid {
            return Err(RetrievalError::new(
                FailureKind::Unauthenticated,
                "Not authenticated",
            ));
        }

        let url = self.endpoint(query)?;
        recall_info!("Retrieving memories for query of {} chars", query.chars().count());

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", credential.token))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::http_status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        recall_debug!("Retrieval response of {} bytes", body.len());
        serde_json::from_slice(&body)
            .map_err(|err| RetrievalError::new(FailureKind::Decode, err.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RetrievalError {
    if err.is_timeout() {
        return RetrievalError::new(FailureKind::Timeout, err.to_string());
    }
    RetrievalError::new(FailureKind::Network, err.to_string())
}
