use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Rejection of a submitted post URL. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("post URL is empty")]
    EmptyUrl,

    #[error(
        "unsupported post URL \"{url}\": expected a Facebook share link or an X/Twitter post link"
    )]
    UnsupportedUrl { url: String },
}
