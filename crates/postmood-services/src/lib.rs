//! Typed HTTP clients for the external services postmood depends on.
//!
//! The scrape service extracts a post and its comments, the sentiment service
//! classifies one text at a time, and insights come either from a remote
//! insight endpoint or straight from an OpenAI-compatible chat-completions API.
//! Each concern is also exposed as a trait so the pipeline can be driven by
//! in-memory doubles.

pub mod error;
pub mod insight;
pub mod llm;
pub mod scrape;
pub mod sentiment;
pub mod service;
pub mod types;

mod http;

pub use error::ServiceError;
pub use insight::{InsightBackend, InsightClient};
pub use llm::{ChatCompletionsClient, LlmInsightGenerator};
pub use scrape::ScrapeClient;
pub use sentiment::SentimentClient;
pub use service::{InsightService, ScrapeService, SentimentService};
pub use types::{InsightComment, InsightPost, InsightRequest, InsightResponse, SentimentPrediction};
