//! Per-session tab views: post, comments, stats and insight.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use postmood_core::{
    AggregateStats, Platform, ScrapeMetadata, SentimentLabel, SentimentResult, SentimentScores,
};
use postmood_pipeline::{fetch_insight, AnalysisSession, InsightView};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct PostView {
    pub platform: Platform,
    pub post_url: String,
    pub content: String,
    pub author: Option<String>,
    pub image_alt: Option<String>,
    /// Present when post-level sentiment ran.
    pub sentiment: Option<SentimentView>,
    pub metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Serialize)]
pub(super) struct SentimentView {
    pub label: SentimentLabel,
    pub scores: SentimentScores,
    /// Score of the assigned label, as a rounded percentage.
    pub confidence: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct CommentView {
    pub content: String,
    pub author: Option<String>,
    #[serde(flatten)]
    pub sentiment: SentimentView,
}

#[derive(Debug, Serialize)]
pub(super) struct CommentsData {
    pub comments: Vec<CommentView>,
    /// Comments dropped because their sentiment call failed.
    pub skipped_count: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedData {
    pub session_id: Uuid,
    pub deleted: bool,
}

impl From<&SentimentResult> for SentimentView {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(result: &SentimentResult) -> Self {
        Self {
            label: result.label.clone(),
            scores: result.scores,
            confidence: (result.confidence() * 100.0).round().clamp(0.0, 100.0) as u32,
        }
    }
}

async fn find_session(
    state: &AppState,
    id: Uuid,
    request_id: &str,
) -> Result<Arc<AnalysisSession>, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::session_not_found(request_id))
}

pub(super) async fn get_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PostView>>, ApiError> {
    let snapshot = find_session(&state, id, &req_id.0).await?.snapshot().await;
    let Some(scraped) = snapshot.scraped else {
        return Err(ApiError::no_results(req_id.0, snapshot.last_error.as_deref()));
    };

    Ok(ApiResponse::new(
        req_id.0,
        PostView {
            platform: scraped.platform,
            post_url: scraped.post_url,
            content: scraped.post.content,
            author: scraped.post.author,
            image_alt: scraped.image_alt,
            sentiment: snapshot.results.post().map(SentimentView::from),
            metadata: scraped.metadata,
        },
    ))
}

pub(super) async fn get_comments(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CommentsData>>, ApiError> {
    let snapshot = find_session(&state, id, &req_id.0).await?.snapshot().await;
    if snapshot.scraped.is_none() {
        return Err(ApiError::no_results(
            req_id.0,
            snapshot.last_error.as_deref(),
        ));
    }

    let comments = snapshot
        .results
        .comments()
        .map(|r| CommentView {
            content: r.source.content.clone(),
            author: r.source.author.clone(),
            sentiment: SentimentView::from(r),
        })
        .collect();

    Ok(ApiResponse::new(
        req_id.0,
        CommentsData {
            comments,
            skipped_count: snapshot.skipped,
        },
    ))
}

pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AggregateStats>>, ApiError> {
    let snapshot = find_session(&state, id, &req_id.0).await?.snapshot().await;
    let Some(stats) = snapshot.stats else {
        return Err(ApiError::no_results(req_id.0, snapshot.last_error.as_deref()));
    };
    Ok(ApiResponse::new(req_id.0, stats))
}

pub(super) async fn get_insight(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InsightView>>, ApiError> {
    let session = find_session(&state, id, &req_id.0).await?;
    match fetch_insight(Arc::clone(&session), Arc::clone(&state.insight)).await {
        InsightView::NoResults => {
            let last_error = session.snapshot().await.last_error;
            Err(ApiError::no_results(req_id.0, last_error.as_deref()))
        }
        view => Ok(ApiResponse::new(req_id.0, view)),
    }
}

pub(super) async fn delete_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedData>>, ApiError> {
    if !state.sessions.remove(id).await {
        return Err(ApiError::session_not_found(req_id.0));
    }
    tracing::debug!(session = %id, "session discarded");
    Ok(ApiResponse::new(
        req_id.0,
        DeletedData {
            session_id: id,
            deleted: true,
        },
    ))
}
