//! Shared domain types, configuration, and aggregation for postmood.

pub mod app_config;
pub mod config;
pub mod error;
pub mod platform;
pub mod stats;
pub mod types;

pub use app_config::{AppConfig, Environment, FacebookCredentials};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, ValidationError};
pub use platform::{validate_post_url, AnalysisRequest, Platform};
pub use stats::{compute_stats, AggregateStats, Distribution};
pub use types::{
    ItemKind, ResultSet, ScrapeMetadata, ScrapedItem, ScrapedPost, SentimentLabel,
    SentimentResult, SentimentScores,
};
