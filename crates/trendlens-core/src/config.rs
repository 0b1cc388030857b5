use crate::app_config::AppConfig;
use crate::{ConfigError, Timeframe};

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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
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

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = parse_usize(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let twitter_bearer_token = require("TWITTER_BEARER_TOKEN")?;
    let firecrawl_api_key = require("FIRECRAWL_API_KEY")?;

    let twitter_api_base_url = or_default("TWITTER_API_BASE_URL", "https://api.twitter.com");
    let firecrawl_api_base_url =
        or_default("FIRECRAWL_API_BASE_URL", "https://api.firecrawl.dev");

    let max_tweets_per_search = positive_usize("MAX_TWEETS_PER_SEARCH", "100")?;
    let max_web_sources = positive_usize("MAX_WEB_SOURCES", "10")?;

    let raw_timeframe = or_default("DEFAULT_TIMEFRAME", "24h");
    let default_timeframe = Timeframe::parse(&raw_timeframe)
        .map_err(|e| invalid("DEFAULT_TIMEFRAME", e.to_string()))?;

    let cache_duration_minutes = parse_u64("CACHE_DURATION_MINUTES", "30")?;
    let cache_max_entries = positive_usize("TRENDLENS_CACHE_MAX_ENTRIES", "256")?;

    let debug = parse_bool(&or_default("DEBUG", "false"))
        .ok_or_else(|| invalid("DEBUG", "expected true or false".to_string()))?;
    let log_level = or_default("TRENDLENS_LOG_LEVEL", "info");

    let bind_addr = or_default("TRENDLENS_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("TRENDLENS_BIND_ADDR", e.to_string()))?;

    let source_timeout_secs = parse_u64("TRENDLENS_SOURCE_TIMEOUT_SECS", "20")?;
    let keyword_timeout_secs = parse_u64("TRENDLENS_KEYWORD_TIMEOUT_SECS", "60")?;
    let compare_concurrency = parse_usize("TRENDLENS_COMPARE_CONCURRENCY", "0")?;
    let sentiment_concurrency = positive_usize("TRENDLENS_SENTIMENT_CONCURRENCY", "8")?;
    let web_concurrency = positive_usize("TRENDLENS_WEB_CONCURRENCY", "4")?;
    let max_compare_keywords = positive_usize("TRENDLENS_MAX_COMPARE_KEYWORDS", "5")?;
    let topic_min_occurrences = positive_usize("TRENDLENS_TOPIC_MIN_OCCURRENCES", "2")?;

    let http_user_agent = or_default(
        "TRENDLENS_HTTP_USER_AGENT",
        "trendlens/0.1 (trend-analysis)",
    );
    let inter_request_delay_ms = parse_u64("TRENDLENS_INTER_REQUEST_DELAY_MS", "250")?;
    let max_retries = parse_u32("TRENDLENS_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("TRENDLENS_RETRY_BACKOFF_BASE_MS", "500")?;

    Ok(AppConfig {
        twitter_bearer_token,
        firecrawl_api_key,
        twitter_api_base_url,
        firecrawl_api_base_url,
        max_tweets_per_search,
        max_web_sources,
        default_timeframe,
        cache_duration_minutes,
        cache_max_entries,
        debug,
        log_level,
        bind_addr,
        source_timeout_secs,
        keyword_timeout_secs,
        compare_concurrency,
        sentiment_concurrency,
        web_concurrency,
        max_compare_keywords,
        topic_min_occurrences,
        http_user_agent,
        inter_request_delay_ms,
        max_retries,
        retry_backoff_base_ms,
    })
}

/// Parse a boolean flag. Unrecognized values return `None`.
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
