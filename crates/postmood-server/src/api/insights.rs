use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use postmood_services::{InsightRequest, InsightResponse, InsightService};

use crate::middleware::RequestId;

use super::{map_service_error, ApiError, AppState};

/// LLM-backed insight endpoint.
///
/// Speaks the same `InsightRequest` / `InsightResponse` shapes as a remote
/// insight service, unwrapped, so one deployment can serve as another's
/// `POSTMOOD_INSIGHT_URL`.
pub(super) async fn generate_insight(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<InsightRequest>, JsonRejection>,
) -> Result<Json<InsightResponse>, ApiError> {
    let Json(request) =
        body.map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.body_text()))?;

    let Some(generator) = &state.generator else {
        return Err(ApiError::new(
            req_id.0,
            "configuration_error",
            "insight generation requires POSTMOOD_LLM_API_KEY",
        ));
    };

    let text = generator.generate(&request).await.map_err(|e| {
        map_service_error(
            req_id.0.clone(),
            &e,
            &format!("insight generation failed: {e}"),
        )
    })?;

    Ok(Json(InsightResponse { text }))
}
