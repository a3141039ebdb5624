//! Client for the scrape service.

use postmood_core::{FacebookCredentials, ItemKind, Platform, ScrapedItem, ScrapedPost};
use reqwest::Client;

use crate::error::ServiceError;
use crate::http::{build_client, send_json};
use crate::service::ScrapeService;
use crate::types::{ScrapeRequest, ScrapeResponse};

/// Client for the scrape service.
///
/// One POST per submitted URL. Credentials are attached only for platforms
/// that need authenticated scraping.
pub struct ScrapeClient {
    client: Client,
    url: String,
    credentials: Option<FacebookCredentials>,
}

impl ScrapeClient {
    /// Creates a client for the scrape endpoint at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        url: &str,
        credentials: Option<FacebookCredentials>,
        timeout_secs: Option<u64>,
        user_agent: &str,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            url: url.to_string(),
            credentials,
        })
    }

    fn credentials_for(
        &self,
        platform: Platform,
    ) -> Result<Option<&FacebookCredentials>, ServiceError> {
        if !platform.requires_credentials() {
            return Ok(None);
        }
        self.credentials
            .as_ref()
            .map(Some)
            .ok_or(ServiceError::MissingCredentials { platform })
    }
}

impl ScrapeService for ScrapeClient {
    /// Scrapes `post_url`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::MissingCredentials`] before any request when the
    ///   platform needs a login that is not configured.
    /// - [`ServiceError::Upstream`] on a non-2xx response, carrying the
    ///   service's `detail` message when present.
    /// - [`ServiceError::Http`] on network failure.
    /// - [`ServiceError::Deserialize`] if the payload has an unexpected shape.
    async fn scrape(
        &self,
        platform: Platform,
        post_url: &str,
    ) -> Result<ScrapedPost, ServiceError> {
        let credentials = self.credentials_for(platform)?;
        let body = ScrapeRequest {
            post_url,
            email: credentials.map(|c| c.email.as_str()),
            password: credentials.map(|c| c.password.as_str()),
        };

        tracing::info!(%platform, post_url, "requesting scrape");

        let response: ScrapeResponse = send_json(
            self.client.post(&self.url).json(&body),
            "scrape",
            "scrape response",
        )
        .await?;

        let post = ScrapedItem {
            kind: ItemKind::Post,
            content: response.post.content,
            author: response.post.author,
        };
        let comments: Vec<ScrapedItem> = response
            .comments
            .into_iter()
            .map(|c| ScrapedItem::comment(c.comment, c.author))
            .collect();

        tracing::info!(
            %platform,
            comments = comments.len(),
            "scrape complete"
        );

        Ok(ScrapedPost {
            platform,
            post,
            image_alt: response.post.image_alt,
            post_url: response
                .post
                .post_url
                .unwrap_or_else(|| post_url.to_string()),
            comments,
            metadata: response.metadata,
        })
    }
}
