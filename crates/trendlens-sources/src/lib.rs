//! HTTP adapters behind the engine's collaborator traits: Twitter/X recent
//! search for the social feed and Firecrawl scraping for web content.

mod error;
mod firecrawl;
mod http;
mod retry;
mod twitter;

use std::time::Duration;

use trendlens_core::AppConfig;

pub use error::ClientError;
pub use firecrawl::{extract_keyword_sentences, FirecrawlClient};
pub use twitter::TwitterClient;

/// Transport settings shared by both clients.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: "trendlens/0.1 (trend-analysis)".to_string(),
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

impl From<&AppConfig> for ClientSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.source_timeout_secs),
            user_agent: config.http_user_agent.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        }
    }
}

/// Build both adapters from application config.
///
/// # Errors
///
/// Returns [`ClientError`] if an HTTP client cannot be constructed or a
/// configured base URL is invalid.
pub fn clients_from_config(config: &AppConfig) -> Result<(TwitterClient, FirecrawlClient), ClientError> {
    let settings = ClientSettings::from(config);
    let twitter = TwitterClient::with_base_url(
        &config.twitter_bearer_token,
        &settings,
        &config.twitter_api_base_url,
    )?;
    let firecrawl = FirecrawlClient::with_base_url(
        &config.firecrawl_api_key,
        &settings,
        &config.firecrawl_api_base_url,
    )?
    .with_inter_request_delay(Duration::from_millis(config.inter_request_delay_ms));
    Ok((twitter, firecrawl))
}
