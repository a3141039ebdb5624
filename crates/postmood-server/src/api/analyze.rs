use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use postmood_core::{validate_post_url, AggregateStats, AnalysisRequest, Platform};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_pipeline_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeBody {
    pub post_url: String,
    /// Re-run inside an existing session instead of starting a new one.
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeData {
    pub session_id: Uuid,
    pub platform: Platform,
    pub result_count: usize,
    pub skipped_count: usize,
    pub stats: Option<AggregateStats>,
}

pub(super) async fn run_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<ApiResponse<AnalyzeData>>, ApiError> {
    let Json(body) =
        body.map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.body_text()))?;

    // Rejected URLs never allocate a session.
    if body.session_id.is_none() {
        validate_post_url(&body.post_url)
            .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;
    }

    let (session, created) = match body.session_id {
        Some(id) => {
            let session = state
                .sessions
                .get(id)
                .await
                .ok_or_else(|| ApiError::session_not_found(req_id.0.clone()))?;
            (session, false)
        }
        None => (state.sessions.create().await, true),
    };

    let request = AnalysisRequest::new(body.post_url);
    let report = match state.pipeline.run_analysis(&session, &request).await {
        Ok(report) => report,
        Err(e) => {
            // The caller never learns the id of a session created for a failed run.
            if created {
                state.sessions.remove(session.id()).await;
            }
            return Err(map_pipeline_error(req_id.0.clone(), &e));
        }
    };

    Ok(ApiResponse::new(
        req_id.0,
        AnalyzeData {
            session_id: session.id(),
            platform: report.platform,
            result_count: report.result_count,
            skipped_count: report.skipped_count,
            stats: report.stats,
        },
    ))
}
