//! Lazy, per-result-set insight fetching.

use std::sync::Arc;

use postmood_services::{InsightRequest, InsightService, ServiceError};
use serde::Serialize;

use crate::session::{AnalysisSession, InsightState};

/// What the insight view should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsightView {
    /// Still generating, or the last attempt failed. `warning` is set on failure.
    Loading {
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },
    Ready {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        result_key: Option<String>,
    },
    /// The session has no analyzed results to summarize.
    NoResults,
}

impl InsightView {
    fn loading() -> Self {
        Self::Loading { warning: None }
    }
}

/// Returns the insight for the session's current result set, generating it
/// on first request.
///
/// At most one generation is in flight per result set: callers arriving while
/// it runs get [`InsightView::Loading`]. A failure resets the session so the
/// next request retries. The service call runs on its own task, so dropping
/// the returned future does not leave the session stuck in the pending state.
/// Text produced for a result set that has since been replaced is discarded.
pub async fn fetch_insight<I>(session: Arc<AnalysisSession>, service: Arc<I>) -> InsightView
where
    I: InsightService + 'static,
{
    let (generation, result_key, request) = {
        let mut state = session.state.write().await;
        match &state.insight {
            InsightState::Ready(text) => {
                return InsightView::Ready {
                    text: text.clone(),
                    result_key: state.result_key.clone(),
                };
            }
            InsightState::Pending => return InsightView::loading(),
            InsightState::Idle => {}
        }

        let Some(stats) = state.stats else {
            return InsightView::NoResults;
        };
        let request = InsightRequest::from_results(
            stats.distribution,
            &state.results,
            state.scraped.as_ref().map(|s| &s.post),
        );
        state.insight = InsightState::Pending;
        (state.generation, state.result_key.clone(), request)
    };

    tracing::debug!(session = %session.id(), generation, "requesting insight");

    let task_session = Arc::clone(&session);
    let task_key = result_key.clone();
    let handle = tokio::spawn(async move {
        let outcome = service.generate(&request).await;
        settle(&task_session, generation, task_key, outcome).await
    });

    match handle.await {
        Ok(view) => view,
        Err(join_error) => {
            tracing::error!(session = %session.id(), error = %join_error, "insight task aborted");
            let mut state = session.state.write().await;
            if state.generation == generation && state.insight == InsightState::Pending {
                state.insight = InsightState::Idle;
            }
            InsightView::Loading {
                warning: Some("insight generation was interrupted".to_string()),
            }
        }
    }
}

async fn settle(
    session: &AnalysisSession,
    generation: u64,
    result_key: Option<String>,
    outcome: Result<String, ServiceError>,
) -> InsightView {
    let mut state = session.state.write().await;
    if state.generation != generation {
        tracing::debug!(
            session = %session.id(),
            generation,
            "discarding insight for superseded results"
        );
        return InsightView::loading();
    }

    match outcome {
        Ok(text) => {
            tracing::info!(session = %session.id(), chars = text.chars().count(), "insight ready");
            state.insight = InsightState::Ready(text.clone());
            InsightView::Ready { text, result_key }
        }
        Err(error) => {
            tracing::warn!(session = %session.id(), error = %error, "insight generation failed");
            state.insight = InsightState::Idle;
            InsightView::Loading {
                warning: Some(format!("insight unavailable: {error}")),
            }
        }
    }
}
