//! Request plumbing shared by every service client.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::ServiceError;

/// Builds a `reqwest::Client` with a fixed connect timeout and the configured
/// `User-Agent`. A whole-request deadline is only applied when `timeout_secs`
/// is set.
pub(crate) fn build_client(
    timeout_secs: Option<u64>,
    user_agent: &str,
) -> Result<Client, ServiceError> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent);
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Sends `request`, maps non-2xx statuses to [`ServiceError::Upstream`], and
/// parses the body as `T`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    service: &'static str,
    context: &str,
) -> Result<T, ServiceError> {
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(upstream_error(service, response).await);
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ServiceError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

/// Converts a non-2xx response into [`ServiceError::Upstream`].
///
/// Prefers the service's own message (`{"detail": ...}` or
/// `{"error": {"message": ...}}`) and falls back to the status text.
async fn upstream_error(service: &'static str, response: Response) -> ServiceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = error_message_from_body(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .map_or_else(|| status.as_str().to_string(), str::to_string)
    });

    tracing::debug!(service, status = status.as_u16(), %message, "upstream returned error status");

    ServiceError::Upstream {
        service,
        status: status.as_u16(),
        message,
    }
}

fn error_message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let message = match value.get("detail") {
        Some(serde_json::Value::String(detail)) => Some(detail.clone()),
        // FastAPI validation failures carry a list of error objects.
        Some(serde_json::Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
    .or_else(|| {
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    });

    message.filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_used_verbatim() {
        assert_eq!(
            error_message_from_body(r#"{"detail": "Login failed - Please check credentials"}"#),
            Some("Login failed - Please check credentials".to_string())
        );
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let msg = error_message_from_body(r#"{"detail": [{"loc": ["body", "post_url"]}]}"#)
            .expect("message");
        assert!(msg.contains("post_url"));
    }

    #[test]
    fn openai_style_error_message_is_used() {
        assert_eq!(
            error_message_from_body(r#"{"error": {"message": "Invalid API Key"}}"#),
            Some("Invalid API Key".to_string())
        );
    }

    #[test]
    fn non_json_body_has_no_message() {
        assert_eq!(error_message_from_body("<html>bad gateway</html>"), None);
        assert_eq!(error_message_from_body(""), None);
    }

    #[test]
    fn blank_detail_is_ignored() {
        assert_eq!(error_message_from_body(r#"{"detail": "  "}"#), None);
    }
}
