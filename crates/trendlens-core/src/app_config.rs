use std::net::SocketAddr;

use crate::Timeframe;

#[derive(Clone)]
pub struct AppConfig {
    pub twitter_bearer_token: String,
    pub firecrawl_api_key: String,
    pub twitter_api_base_url: String,
    pub firecrawl_api_base_url: String,
    pub max_tweets_per_search: usize,
    pub max_web_sources: usize,
    pub default_timeframe: Timeframe,
    pub cache_duration_minutes: u64,
    pub cache_max_entries: usize,
    pub debug: bool,
    pub log_level: String,
    pub bind_addr: SocketAddr,
    pub source_timeout_secs: u64,
    pub keyword_timeout_secs: u64,
    /// `0` means unbounded.
    pub compare_concurrency: usize,
    pub sentiment_concurrency: usize,
    /// Concurrent web domain fetches per request.
    pub web_concurrency: usize,
    pub max_compare_keywords: usize,
    pub topic_min_occurrences: usize,
    pub http_user_agent: String,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl AppConfig {
    /// Default `EnvFilter` directive: `DEBUG=true` forces `debug`, otherwise
    /// the configured log level.
    #[must_use]
    pub fn log_directive(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("twitter_bearer_token", &"[redacted]")
            .field("firecrawl_api_key", &"[redacted]")
            .field("twitter_api_base_url", &self.twitter_api_base_url)
            .field("firecrawl_api_base_url", &self.firecrawl_api_base_url)
            .field("max_tweets_per_search", &self.max_tweets_per_search)
            .field("max_web_sources", &self.max_web_sources)
            .field("default_timeframe", &self.default_timeframe)
            .field("cache_duration_minutes", &self.cache_duration_minutes)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("debug", &self.debug)
            .field("log_level", &self.log_level)
            .field("bind_addr", &self.bind_addr)
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("keyword_timeout_secs", &self.keyword_timeout_secs)
            .field("compare_concurrency", &self.compare_concurrency)
            .field("sentiment_concurrency", &self.sentiment_concurrency)
            .field("web_concurrency", &self.web_concurrency)
            .field("max_compare_keywords", &self.max_compare_keywords)
            .field("topic_min_occurrences", &self.topic_min_occurrences)
            .field("http_user_agent", &self.http_user_agent)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .finish()
    }
}
