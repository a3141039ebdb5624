use crate::app_config::{AppConfig, Environment, FacebookCredentials};
use crate::ConfigError;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_USER_AGENT: &str = "postmood/0.1 (sentiment-analysis)";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let env = parse_environment(&or_default("POSTMOOD_ENV", "development"))?;

    let scrape_url = require("POSTMOOD_SCRAPE_URL")?;
    let sentiment_url = require("POSTMOOD_SENTIMENT_URL")?;
    let insight_url = optional("POSTMOOD_INSIGHT_URL");

    // Insights come either from a remote insight service or straight from the LLM.
    let llm_api_key = optional("POSTMOOD_LLM_API_KEY");
    if insight_url.is_none() && llm_api_key.is_none() {
        return Err(ConfigError::MissingEnvVar("POSTMOOD_LLM_API_KEY".to_string()));
    }
    let llm_base_url = or_default("POSTMOOD_LLM_BASE_URL", DEFAULT_LLM_BASE_URL);
    let llm_model = or_default("POSTMOOD_LLM_MODEL", DEFAULT_LLM_MODEL);
    let insight_language = or_default("POSTMOOD_INSIGHT_LANGUAGE", "Marathi");

    let facebook_credentials = match (optional("FACEBOOK_EMAIL"), optional("FACEBOOK_PASSWORD")) {
        (Some(email), Some(password)) => Some(FacebookCredentials { email, password }),
        (None, None) => None,
        (Some(_), None) => {
            return Err(ConfigError::MissingEnvVar("FACEBOOK_PASSWORD".to_string()));
        }
        (None, Some(_)) => {
            return Err(ConfigError::MissingEnvVar("FACEBOOK_EMAIL".to_string()));
        }
    };
    // Outside production, Facebook URLs fail per request instead.
    if env == Environment::Production && facebook_credentials.is_none() {
        return Err(ConfigError::MissingEnvVar("FACEBOOK_EMAIL".to_string()));
    }

    let bind_addr = parse_addr("POSTMOOD_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("POSTMOOD_LOG_LEVEL", "info");

    let analyze_batch_size = parse_usize("POSTMOOD_ANALYZE_BATCH_SIZE", "5")?;
    if analyze_batch_size == 0 {
        return Err(invalid(
            "POSTMOOD_ANALYZE_BATCH_SIZE",
            "must be at least 1".to_string(),
        ));
    }
    let analyze_post = parse_bool("POSTMOOD_ANALYZE_POST", "true")?;

    let upstream_timeout_secs = optional("POSTMOOD_UPSTREAM_TIMEOUT_SECS")
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|e| invalid("POSTMOOD_UPSTREAM_TIMEOUT_SECS", e.to_string()))
        })
        .transpose()?;

    let user_agent = or_default("POSTMOOD_USER_AGENT", DEFAULT_USER_AGENT);
    let rate_limit_per_minute = parse_usize("POSTMOOD_RATE_LIMIT_PER_MINUTE", "60")?;

    let session_ttl_secs = or_default("POSTMOOD_SESSION_TTL_SECS", "3600")
        .parse::<u64>()
        .map_err(|e| invalid("POSTMOOD_SESSION_TTL_SECS", e.to_string()))?;
    if session_ttl_secs == 0 {
        return Err(invalid(
            "POSTMOOD_SESSION_TTL_SECS",
            "must be at least 1".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        scrape_url,
        sentiment_url,
        insight_url,
        llm_api_key,
        llm_base_url,
        llm_model,
        insight_language,
        facebook_credentials,
        analyze_batch_size,
        analyze_post,
        upstream_timeout_secs,
        user_agent,
        rate_limit_per_minute,
        session_ttl_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "POSTMOOD_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
