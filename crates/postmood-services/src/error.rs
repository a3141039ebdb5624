use postmood_core::Platform;
use thiserror::Error;

/// Errors returned by the external service clients.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    ///
    /// `message` is the service's own error detail when it sent one, else the
    /// HTTP status text.
    #[error("{service} service returned {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON encoding error for {context}: {source}")]
    Encode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{platform} scraping requires credentials; set FACEBOOK_EMAIL and FACEBOOK_PASSWORD")]
    MissingCredentials { platform: Platform },

    #[error("LLM returned an empty completion")]
    EmptyCompletion,
}

impl ServiceError {
    /// `true` when the error stems from local configuration rather than the
    /// remote service.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredentials { .. })
    }
}
