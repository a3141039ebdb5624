mod analyze;
mod insights;
mod sessions;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use postmood_core::AppConfig;
use postmood_pipeline::{AnalysisPipeline, PipelineError, SessionStore};
use postmood_services::{
    ChatCompletionsClient, InsightBackend, InsightClient, LlmInsightGenerator, ScrapeClient,
    SentimentClient, ServiceError,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

pub type Pipeline = AnalysisPipeline<ScrapeClient, SentimentClient>;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Backend used by the insight tab.
    pub insight: Arc<InsightBackend>,
    /// Backs `POST /api/v1/insights`; absent when no LLM key is configured.
    pub generator: Option<Arc<LlmInsightGenerator>>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Builds the service clients described by `config`.
    ///
    /// The insight tab uses `POSTMOOD_INSIGHT_URL` when set, otherwise the LLM
    /// generator directly.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let timeout = config.upstream_timeout_secs;
        let ua = config.user_agent.as_str();

        let scraper = ScrapeClient::new(
            &config.scrape_url,
            config.facebook_credentials.clone(),
            timeout,
            ua,
        )?;
        let analyzer = SentimentClient::new(&config.sentiment_url, timeout, ua)?;
        let pipeline = AnalysisPipeline::new(scraper, analyzer)
            .with_batch_size(config.analyze_batch_size)
            .with_post_analysis(config.analyze_post);

        let generator = match &config.llm_api_key {
            Some(key) => {
                let chat = ChatCompletionsClient::new(
                    &config.llm_base_url,
                    key,
                    &config.llm_model,
                    timeout,
                    ua,
                )?;
                Some(Arc::new(LlmInsightGenerator::new(
                    chat,
                    &config.insight_language,
                )))
            }
            None => None,
        };

        let insight = match (&config.insight_url, &generator) {
            (Some(url), _) => InsightBackend::Remote(InsightClient::new(url, timeout, ua)?),
            (None, Some(generator)) => InsightBackend::Llm(Arc::clone(generator)),
            (None, None) => anyhow::bail!(
                "no insight backend: set POSTMOOD_INSIGHT_URL or POSTMOOD_LLM_API_KEY"
            ),
        };

        Ok(Self {
            pipeline: Arc::new(pipeline),
            insight: Arc::new(insight),
            generator,
            sessions: SessionStore::with_ttl(Duration::from_secs(config.session_ttl_secs)),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    sessions: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub(super) fn session_not_found(request_id: impl Into<String>) -> Self {
        Self::new(request_id, "not_found", "session not found")
    }

    /// `last_error` is the failure of the session's latest run, if any.
    pub(super) fn no_results(request_id: impl Into<String>, last_error: Option<&str>) -> Self {
        let message = match last_error {
            Some(error) => {
                format!("no analysis results in this session; last analysis failed: {error}")
            }
            None => "no analysis results in this session".to_string(),
        };
        Self::new(request_id, "no_results", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" | "no_results" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_pipeline_error(request_id: String, error: &PipelineError) -> ApiError {
    match error {
        PipelineError::Validation(e) => {
            ApiError::new(request_id, "validation_error", e.to_string())
        }
        PipelineError::Configuration(message) => {
            tracing::error!(error = %message, "analysis misconfigured");
            ApiError::new(request_id, "configuration_error", message.clone())
        }
        PipelineError::Scrape(e) | PipelineError::PostAnalysis(e) => {
            map_service_error(request_id, e, &error.to_string())
        }
    }
}

pub(super) fn map_service_error(
    request_id: String,
    error: &ServiceError,
    message: &str,
) -> ApiError {
    if error.is_configuration() {
        tracing::error!(error = %error, "upstream call misconfigured");
        return ApiError::new(request_id, "configuration_error", message);
    }
    tracing::warn!(error = %error, "upstream service failed");
    ApiError::new(request_id, "upstream_error", message)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

/// Routes that call upstream services sit behind the rate limit.
fn upstream_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/analyze", post(analyze::run_analysis))
        .route(
            "/api/v1/sessions/{id}/insight",
            get(sessions::get_insight),
        )
        .route("/api/v1/insights", post(insights::generate_insight))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let session_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/sessions/{id}",
            axum::routing::delete(sessions::delete_session),
        )
        .route("/api/v1/sessions/{id}/post", get(sessions::get_post))
        .route(
            "/api/v1/sessions/{id}/comments",
            get(sessions::get_comments),
        )
        .route("/api/v1/sessions/{id}/stats", get(sessions::get_stats));

    Router::new()
        .merge(session_routes)
        .merge(upstream_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    ApiResponse::new(
        req_id.0,
        HealthData {
            status: "ok",
            sessions: state.sessions.len().await,
        },
    )
}

#[cfg(test)]
mod tests;
