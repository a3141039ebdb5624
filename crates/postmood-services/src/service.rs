//! Service seams used by the orchestration pipeline.
//!
//! The HTTP clients in this crate implement these traits; tests substitute
//! in-memory doubles.

use std::future::Future;
use std::sync::Arc;

use postmood_core::{Platform, ScrapedPost};

use crate::error::ServiceError;
use crate::types::{InsightRequest, SentimentPrediction};

/// Extracts a post and its comments from a social-media URL.
pub trait ScrapeService: Send + Sync {
    fn scrape(
        &self,
        platform: Platform,
        post_url: &str,
    ) -> impl Future<Output = Result<ScrapedPost, ServiceError>> + Send;
}

/// Classifies the sentiment of a single text.
pub trait SentimentService: Send + Sync {
    fn analyze(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<SentimentPrediction, ServiceError>> + Send;
}

/// Produces a markdown summary for an analyzed result set.
pub trait InsightService: Send + Sync {
    fn generate(
        &self,
        request: &InsightRequest,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;
}

impl<T: ScrapeService> ScrapeService for Arc<T> {
    fn scrape(
        &self,
        platform: Platform,
        post_url: &str,
    ) -> impl Future<Output = Result<ScrapedPost, ServiceError>> + Send {
        (**self).scrape(platform, post_url)
    }
}

impl<T: SentimentService> SentimentService for Arc<T> {
    fn analyze(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<SentimentPrediction, ServiceError>> + Send {
        (**self).analyze(text)
    }
}

impl<T: InsightService> InsightService for Arc<T> {
    fn generate(
        &self,
        request: &InsightRequest,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send {
        (**self).generate(request)
    }
}
