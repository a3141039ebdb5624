use postmood_core::ValidationError;
use postmood_services::ServiceError;
use thiserror::Error;

/// Failures that abort an analysis run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("scrape failed: {0}")]
    Scrape(#[source] ServiceError),

    #[error("post sentiment analysis failed: {0}")]
    PostAnalysis(#[source] ServiceError),
}

impl PipelineError {
    pub(crate) fn from_scrape(error: ServiceError) -> Self {
        if error.is_configuration() {
            Self::Configuration(error.to_string())
        } else {
            Self::Scrape(error)
        }
    }
}

/// A comment whose sentiment call failed. Non-fatal: the comment is dropped
/// from the result set and the run continues.
#[derive(Debug)]
pub struct ItemFailure {
    /// Position of the comment in the scraped payload.
    pub index: usize,
    pub content: String,
    pub error: ServiceError,
}
