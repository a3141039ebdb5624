//! Analysis orchestration for postmood.
//!
//! Validates a submitted URL, scrapes it, classifies the post and its comments
//! in bounded batches, aggregates the results, and publishes them into a
//! session. Insight text is fetched lazily per result set and cached in the
//! same session.

pub mod error;
pub mod insight;
pub mod pipeline;
pub mod session;

pub use error::{ItemFailure, PipelineError};
pub use insight::{fetch_insight, InsightView};
pub use pipeline::{AnalysisOutcome, AnalysisPipeline, RunReport, DEFAULT_BATCH_SIZE};
pub use session::{
    AnalysisSession, InsightState, SessionSnapshot, SessionStore, DEFAULT_SESSION_TTL,
};
