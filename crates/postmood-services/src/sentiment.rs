//! Client for the sentiment classification service.

use reqwest::Client;

use crate::error::ServiceError;
use crate::http::{build_client, send_json};
use crate::service::SentimentService;
use crate::types::{SentimentPrediction, SentimentRequest, SentimentResponse};

pub struct SentimentClient {
    client: Client,
    url: String,
}

impl SentimentClient {
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

impl SentimentService for SentimentClient {
    /// Classifies one text. The label is the service's own and is not
    /// recomputed from the probabilities.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Upstream`] on any non-2xx, [`ServiceError::Http`] on
    /// network failure, [`ServiceError::Deserialize`] on an unexpected body.
    async fn analyze(&self, text: &str) -> Result<SentimentPrediction, ServiceError> {
        let response: SentimentResponse = send_json(
            self.client.post(&self.url).json(&SentimentRequest { tweet: text }),
            "sentiment",
            "sentiment response",
        )
        .await?;

        Ok(response.into())
    }
}
