use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Login used by the scrape service for platforms that need authenticated scraping.
#[derive(Clone, PartialEq, Eq)]
pub struct FacebookCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for FacebookCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacebookCredentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub scrape_url: String,
    pub sentiment_url: String,
    pub insight_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub insight_language: String,
    pub facebook_credentials: Option<FacebookCredentials>,
    pub analyze_batch_size: usize,
    pub analyze_post: bool,
    pub upstream_timeout_secs: Option<u64>,
    pub user_agent: String,
    pub rate_limit_per_minute: usize,
    /// Idle sessions older than this are evicted.
    pub session_ttl_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("scrape_url", &self.scrape_url)
            .field("sentiment_url", &self.sentiment_url)
            .field("insight_url", &self.insight_url)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("insight_language", &self.insight_language)
            .field("facebook_credentials", &self.facebook_credentials)
            .field("analyze_batch_size", &self.analyze_batch_size)
            .field("analyze_post", &self.analyze_post)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}
