use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use postmood_core::{AppConfig, Environment, FacebookCredentials};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

const TWEET_URL: &str = "https://x.com/someone/status/42";
const FB_URL: &str = "https://www.facebook.com/share/p/abc123";

fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("addr"),
        log_level: "info".to_string(),
        scrape_url: format!("{}/scrape", server.uri()),
        sentiment_url: format!("{}/predict", server.uri()),
        insight_url: None,
        llm_api_key: Some("groq-key".to_string()),
        llm_base_url: format!("{}/v1", server.uri()),
        llm_model: "llama-3.3-70b-versatile".to_string(),
        insight_language: "Marathi".to_string(),
        facebook_credentials: None,
        analyze_batch_size: 5,
        analyze_post: false,
        upstream_timeout_secs: Some(5),
        user_agent: "postmood-test/0.1".to_string(),
        rate_limit_per_minute: 60,
        session_ttl_secs: 3600,
    }
}

fn app_with(config: &AppConfig) -> (Router, AppState) {
    let state = AppState::from_config(config).expect("state");
    let app = build_app(
        state.clone(),
        RateLimitState::new(config.rate_limit_per_minute, Duration::from_secs(60)),
    );
    (app, state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn mount_prediction(server: &MockServer, text: &str, label: &str, scores: [f64; 3]) {
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_json(json!({ "tweet": text })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Sentiment_Analysis": label,
            "cleaned_tweet": text,
            "original_tweet": text,
            "predicted_probabilities": {
                "Positive": scores[0],
                "Negative": scores[1],
                "Neutral": scores[2]
            }
        })))
        .mount(server)
        .await;
}

/// Scrape payload with three Marathi comments: two positive, one negative.
async fn mount_marathi_post(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post": { "content": "छान पोस्ट", "image_alt": "photo" },
            "comments": [
                { "comment": "खूप छान", "author": "Asha" },
                { "comment": "मस्त आहे" },
                { "comment": "वाईट" }
            ],
            "metadata": { "total_comments": 3 }
        })))
        .mount(server)
        .await;

    mount_prediction(server, "खूप छान", "Positive", [0.9, 0.05, 0.05]).await;
    mount_prediction(server, "मस्त आहे", "Positive", [0.7, 0.2, 0.1]).await;
    mount_prediction(server, "वाईट", "Negative", [0.1, 0.8, 0.1]).await;
}

async fn analyze(app: &Router, post_url: &str) -> (StatusCode, Value) {
    send(app, "POST", "/api/v1/analyze", Some(json!({ "post_url": post_url }))).await
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("no_results", StatusCode::NOT_FOUND),
        ("upstream_error", StatusCode::BAD_GATEWAY),
        ("configuration_error", StatusCode::INTERNAL_SERVER_ERROR),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[tokio::test]
async fn health_reports_session_count() {
    let server = MockServer::start().await;
    let (app, state) = app_with(&test_config(&server));
    state.sessions.create().await;

    let (status, json) = send(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["sessions"], 1);
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn analysis_flow_populates_every_tab() {
    let server = MockServer::start().await;
    mount_marathi_post(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "## सारांश" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = app_with(&test_config(&server));

    let (status, json) = analyze(&app, TWEET_URL).await;
    assert_eq!(status, StatusCode::OK, "body: {json}");
    let data = &json["data"];
    assert_eq!(data["platform"], "twitter");
    assert_eq!(data["result_count"], 3);
    assert_eq!(data["skipped_count"], 0);
    assert_eq!(
        data["stats"]["distribution"],
        json!({ "positive": 67, "negative": 33, "neutral": 0 })
    );
    let session_id = data["session_id"].as_str().expect("session id").to_string();

    let (status, json) =
        send(&app, "GET", &format!("/api/v1/sessions/{session_id}/stats"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["positive_count"], 2);
    assert_eq!(json["data"]["avg_confidence"], 80);

    let (status, json) =
        send(&app, "GET", &format!("/api/v1/sessions/{session_id}/comments"), None).await;
    assert_eq!(status, StatusCode::OK);
    let comments = json["data"]["comments"].as_array().expect("comments");
    let texts: Vec<&str> = comments.iter().filter_map(|c| c["content"].as_str()).collect();
    assert_eq!(texts, ["खूप छान", "मस्त आहे", "वाईट"]);
    assert_eq!(comments[0]["author"], "Asha");
    assert_eq!(comments[0]["label"], "Positive");
    assert_eq!(comments[0]["confidence"], 90);
    assert_eq!(comments[2]["label"], "Negative");

    let (status, json) =
        send(&app, "GET", &format!("/api/v1/sessions/{session_id}/post"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["content"], "छान पोस्ट");
    assert_eq!(json["data"]["post_url"], TWEET_URL);
    assert!(json["data"]["sentiment"].is_null(), "post analysis is disabled");

    for _ in 0..2 {
        let (status, json) =
            send(&app, "GET", &format!("/api/v1/sessions/{session_id}/insight"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ready");
        assert_eq!(json["data"]["text"], "## सारांश");
    }
}

#[tokio::test]
async fn insight_failure_is_reported_as_loading_with_warning() {
    let server = MockServer::start().await;
    mount_marathi_post(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({ "error": { "message": "Rate limit reached" } })),
        )
        .mount(&server)
        .await;

    let (app, _) = app_with(&test_config(&server));
    let (_, json) = analyze(&app, TWEET_URL).await;
    let session_id = json["data"]["session_id"].as_str().expect("session id").to_string();

    let (status, json) =
        send(&app, "GET", &format!("/api/v1/sessions/{session_id}/insight"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "loading");
    assert!(json["data"]["warning"]
        .as_str()
        .expect("warning")
        .contains("Rate limit reached"));
}

#[tokio::test]
async fn invalid_url_is_rejected_without_upstream_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = app_with(&test_config(&server));
    let (status, json) = analyze(&app, "http://notfacebook.com/x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let server = MockServer::start().await;
    let (app, _) = app_with(&test_config(&server));

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/analyze",
        Some(json!({ "url": TWEET_URL })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn rejected_analyze_requests_leave_no_sessions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, state) = app_with(&test_config(&server));
    for url in ["", "   ", "http://notfacebook.com/x", "ftp://x.com/someone/status/1"] {
        let (status, json) = analyze(&app, url).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "url {url:?}");
        assert_eq!(json["error"]["code"], "validation_error");
    }
    assert_eq!(state.sessions.len().await, 0);
}

#[tokio::test]
async fn facebook_without_credentials_is_a_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, state) = app_with(&test_config(&server));
    let (status, json) = analyze(&app, FB_URL).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "configuration_error");
    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn scrape_failure_is_an_upstream_error_with_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Login failed - Please check credentials" })),
        )
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.facebook_credentials = Some(FacebookCredentials {
        email: "user@example.com".to_string(),
        password: "secret".to_string(),
    });
    let (app, state) = app_with(&config);

    let (status, json) = analyze(&app, FB_URL).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["code"], "upstream_error");
    assert!(json["error"]["message"]
        .as_str()
        .expect("message")
        .contains("Login failed"));
    assert_eq!(state.sessions.len().await, 0, "failed run must not keep its session");
}

#[tokio::test]
async fn failed_rerun_reports_last_error_on_every_tab() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "Scraper crashed" })),
        )
        .mount(&server)
        .await;

    let (app, state) = app_with(&test_config(&server));
    let id = state.sessions.create().await.id();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/analyze",
        Some(json!({ "post_url": TWEET_URL, "session_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(
        state.sessions.get(id).await.is_some(),
        "an existing session survives a failed run"
    );

    for tab in ["stats", "comments", "post", "insight"] {
        let (status, json) =
            send(&app, "GET", &format!("/api/v1/sessions/{id}/{tab}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "tab {tab}");
        assert_eq!(json["error"]["code"], "no_results", "tab {tab}");
        let message = json["error"]["message"].as_str().expect("message");
        assert!(message.contains("last analysis failed"), "tab {tab}: {message}");
        assert!(message.contains("Scraper crashed"), "tab {tab}: {message}");
    }
}

#[tokio::test]
async fn post_sentiment_counts_toward_stats() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post": { "content": "खूप छान!" },
            "comments": [
                { "comment": "मजा आली" },
                { "comment": "वाईट वाटले" }
            ]
        })))
        .mount(&server)
        .await;
    mount_prediction(&server, "खूप छान!", "Positive", [0.9, 0.05, 0.05]).await;
    mount_prediction(&server, "मजा आली", "Positive", [0.8, 0.1, 0.1]).await;
    mount_prediction(&server, "वाईट वाटले", "Negative", [0.2, 0.7, 0.1]).await;

    let mut config = test_config(&server);
    config.analyze_post = true;
    let (app, _) = app_with(&config);

    let (status, json) = analyze(&app, TWEET_URL).await;
    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["data"]["result_count"], 3);
    let stats = &json["data"]["stats"];
    assert_eq!(stats["total"], 3);
    assert_eq!(
        stats["distribution"],
        json!({ "positive": 67, "negative": 33, "neutral": 0 })
    );
    assert_eq!(stats["avg_confidence"], 80);
    let session_id = json["data"]["session_id"].as_str().expect("session id").to_string();

    let (status, json) =
        send(&app, "GET", &format!("/api/v1/sessions/{session_id}/post"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["content"], "खूप छान!");
    assert_eq!(json["data"]["sentiment"]["label"], "Positive");
    assert_eq!(json["data"]["sentiment"]["confidence"], 90);

    let (_, json) =
        send(&app, "GET", &format!("/api/v1/sessions/{session_id}/comments"), None).await;
    let comments = json["data"]["comments"].as_array().expect("comments");
    assert_eq!(comments.len(), 2, "the post is not listed as a comment");
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let server = MockServer::start().await;
    let (app, _) = app_with(&test_config(&server));
    let id = uuid::Uuid::new_v4();

    let (status, json) = send(&app, "GET", &format!("/api/v1/sessions/{id}/stats"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/analyze",
        Some(json!({ "post_url": TWEET_URL, "session_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_session_has_no_results() {
    let server = MockServer::start().await;
    let (app, state) = app_with(&test_config(&server));
    let session = state.sessions.create().await;
    let id = session.id();

    for tab in ["stats", "comments", "post", "insight"] {
        let (status, json) =
            send(&app, "GET", &format!("/api/v1/sessions/{id}/{tab}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "tab {tab}");
        assert_eq!(json["error"]["code"], "no_results", "tab {tab}");
        assert_eq!(
            json["error"]["message"], "no analysis results in this session",
            "tab {tab}"
        );
    }
}

#[tokio::test]
async fn delete_discards_the_session() {
    let server = MockServer::start().await;
    let (app, state) = app_with(&test_config(&server));
    let id = state.sessions.create().await.id();

    let (status, json) = send(&app, "DELETE", &format!("/api/v1/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["deleted"], true);
    assert!(state.sessions.is_empty().await);

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn analysis_routes_are_rate_limited() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    config.rate_limit_per_minute = 1;
    let (app, _) = app_with(&config);

    let (status, _) = analyze(&app, "http://notfacebook.com/x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, json) = analyze(&app, "http://notfacebook.com/x").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");

    let (status, _) = send(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK, "health is not rate limited");
}

#[tokio::test]
async fn insight_endpoint_returns_plain_text_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "**सारांश**" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = app_with(&test_config(&server));
    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/insights",
        Some(json!({
            "distribution": { "positive": 67, "negative": 33, "neutral": 0 },
            "comments": [{ "comment": "खूप छान", "sentiment": "Positive" }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "text": "**सारांश**" }));
}

#[tokio::test]
async fn insight_endpoint_without_llm_key_is_a_configuration_error() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    config.llm_api_key = None;
    config.insight_url = Some(format!("{}/api/insights", server.uri()));
    let (app, _) = app_with(&config);

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/insights",
        Some(json!({ "distribution": { "positive": 100, "negative": 0, "neutral": 0 } })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "configuration_error");
}

#[test]
fn state_requires_an_insight_backend() {
    let config = AppConfig {
        llm_api_key: None,
        insight_url: None,
        ..test_config_without_server()
    };
    assert!(AppState::from_config(&config).is_err());
}

fn test_config_without_server() -> AppConfig {
    AppConfig {
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("addr"),
        log_level: "info".to_string(),
        scrape_url: "http://127.0.0.1:9/scrape".to_string(),
        sentiment_url: "http://127.0.0.1:9/predict".to_string(),
        insight_url: None,
        llm_api_key: Some("k".to_string()),
        llm_base_url: "http://127.0.0.1:9/v1".to_string(),
        llm_model: "m".to_string(),
        insight_language: "Marathi".to_string(),
        facebook_credentials: None,
        analyze_batch_size: 5,
        analyze_post: true,
        upstream_timeout_secs: None,
        user_agent: "postmood-test/0.1".to_string(),
        rate_limit_per_minute: 60,
        session_ttl_secs: 3600,
    }
}
