//! Source-platform detection and post URL validation.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const FACEBOOK_PREFIXES: &[&str] = &[
    "https://www.facebook.com/share/",
    "https://facebook.com/share/",
    "https://m.facebook.com/share/",
];

const TWITTER_PREFIXES: &[&str] = &[
    "https://x.com/",
    "https://www.x.com/",
    "https://twitter.com/",
    "https://www.twitter.com/",
];

/// Social platform a post URL belongs to.
///
/// This is the only place platform-specific behaviour is decided; callers
/// match on the variant instead of inspecting URLs themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Twitter,
}

impl Platform {
    /// Detects the platform from a canonical share-link prefix.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        if FACEBOOK_PREFIXES.iter().any(|p| url.starts_with(p)) {
            Some(Self::Facebook)
        } else if TWITTER_PREFIXES.iter().any(|p| url.starts_with(p)) {
            Some(Self::Twitter)
        } else {
            None
        }
    }

    /// Whether the scrape service needs login credentials for this platform.
    #[must_use]
    pub fn requires_credentials(self) -> bool {
        matches!(self, Self::Facebook)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user submission: the URL of the post to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub post_url: String,
}

impl AnalysisRequest {
    #[must_use]
    pub fn new(post_url: impl Into<String>) -> Self {
        Self {
            post_url: post_url.into(),
        }
    }
}

/// Validates a submitted post URL and returns the trimmed URL with its platform.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyUrl`] for blank input and
/// [`ValidationError::UnsupportedUrl`] when no accepted prefix matches.
pub fn validate_post_url(raw: &str) -> Result<(Platform, &str), ValidationError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    Platform::from_url(url)
        .map(|platform| (platform, url))
        .ok_or_else(|| ValidationError::UnsupportedUrl {
            url: url.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facebook_share_link_is_accepted() {
        let (platform, url) =
            validate_post_url("https://www.facebook.com/share/p/abc123").expect("valid");
        assert_eq!(platform, Platform::Facebook);
        assert_eq!(url, "https://www.facebook.com/share/p/abc123");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let (_, url) = validate_post_url("  https://www.facebook.com/share/p/abc123\n").unwrap();
        assert_eq!(url, "https://www.facebook.com/share/p/abc123");
    }

    #[test]
    fn twitter_and_x_links_are_accepted() {
        for url in [
            "https://x.com/someone/status/1",
            "https://twitter.com/someone/status/1",
        ] {
            let (platform, _) = validate_post_url(url).expect("valid");
            assert_eq!(platform, Platform::Twitter, "{url}");
        }
    }

    #[test]
    fn foreign_domain_is_rejected() {
        let err = validate_post_url("http://notfacebook.com/x").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnsupportedUrl { ref url } if url == "http://notfacebook.com/x"
        ));
    }

    #[test]
    fn plain_http_facebook_is_rejected() {
        assert!(validate_post_url("http://www.facebook.com/share/p/abc").is_err());
    }

    #[test]
    fn facebook_profile_link_is_rejected() {
        assert!(validate_post_url("https://www.facebook.com/someone").is_err());
    }

    #[test]
    fn blank_url_is_rejected() {
        assert_eq!(validate_post_url("   "), Err(ValidationError::EmptyUrl));
    }

    #[test]
    fn only_facebook_requires_credentials() {
        assert!(Platform::Facebook.requires_credentials());
        assert!(!Platform::Twitter.requires_credentials());
    }

    #[test]
    fn platform_serializes_lowercase() {
        let json = serde_json::to_string(&Platform::Twitter).unwrap();
        assert_eq!(json, "\"twitter\"");
    }
}
