//! Insight service client and backend selection.

use std::sync::Arc;

use reqwest::Client;

use crate::error::ServiceError;
use crate::http::{build_client, send_json};
use crate::llm::LlmInsightGenerator;
use crate::service::InsightService;
use crate::types::{InsightRequest, InsightResponse};

/// Client for a remote insight endpoint speaking `InsightRequest` / `InsightResponse`.
pub struct InsightClient {
    client: Client,
    url: String,
}

impl InsightClient {
    /// # Errors
    ///
    /// Returns [`ServiceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        url: &str,
        timeout_secs: Option<u64>,
        user_agent: &str,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            url: url.to_string(),
        })
    }
}

impl InsightService for InsightClient {
    async fn generate(&self, request: &InsightRequest) -> Result<String, ServiceError> {
        let response: InsightResponse = send_json(
            self.client.post(&self.url).json(request),
            "insight",
            "insight response",
        )
        .await?;
        Ok(response.text)
    }
}

/// Where insight text comes from: a remote insight service, or the LLM directly.
///
/// The generator is shared so the server can also expose it on its own
/// insight route.
pub enum InsightBackend {
    Remote(InsightClient),
    Llm(Arc<LlmInsightGenerator>),
}

impl InsightService for InsightBackend {
    async fn generate(&self, request: &InsightRequest) -> Result<String, ServiceError> {
        match self {
            Self::Remote(client) => client.generate(request).await,
            Self::Llm(generator) => generator.generate(request).await,
        }
    }
}
