//! Firecrawl scrape client.
//!
//! Each domain's landing page is scraped as markdown and reduced to the
//! sentences that mention the keyword. Request starts are spaced by a
//! configurable delay, shared across concurrent callers.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio::time::Instant;
use trendlens_engine::{RawWebRecord, SourceError, WebSource};

use crate::error::ClientError;
use crate::http::{build_client, check_status, endpoint, parse_base_url};
use crate::retry::retry_with_backoff;
use crate::ClientSettings;

const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";
const SERVICE: &str = "firecrawl";
const SCRAPE_PATH: &str = "v1/scrape";
const MIN_SENTENCE_CHARS: usize = 20;
const MAX_SENTENCES_PER_PAGE: usize = 3;

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    data: Option<ScrapeData>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
    #[serde(default)]
    metadata: Option<PageMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct PageMetadata {
    #[serde(rename = "publishedTime")]
    published_time: Option<String>,
    #[serde(rename = "article:published_time")]
    article_published_time: Option<String>,
    #[serde(rename = "sourceURL")]
    source_url: Option<String>,
}

impl PageMetadata {
    fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_time
            .as_deref()
            .or(self.article_published_time.as_deref())
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// A scraped page reduced to what the web feed needs.
#[derive(Debug, Clone, Default)]
struct ScrapedPage {
    markdown: String,
    published_at: Option<DateTime<Utc>>,
    url: Option<String>,
}

pub struct FirecrawlClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
    inter_request_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl FirecrawlClient {
    /// Creates a client pointed at the hosted API.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, settings: &ClientSettings) -> Result<Self, ClientError> {
        Self::with_base_url(api_key, settings, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the client cannot be constructed, or
    /// [`ClientError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        settings: &ClientSettings,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_client(settings)?,
            api_key: api_key.to_owned(),
            base_url: parse_base_url(base_url)?,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
            inter_request_delay: Duration::ZERO,
            last_request: Mutex::new(None),
        })
    }

    /// Minimum spacing between the starts of consecutive scrapes.
    #[must_use]
    pub fn with_inter_request_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    /// Wait until `inter_request_delay` has passed since the previous scrape
    /// started. The lock is held while waiting so callers queue in order.
    async fn wait_turn(&self) {
        if self.inter_request_delay.is_zero() {
            return;
        }
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.inter_request_delay).await;
        }
        *last = Some(Instant::now());
    }

    async fn scrape(&self, domain: &str) -> Result<ScrapedPage, ClientError> {
        let url = endpoint(&self.base_url, SCRAPE_PATH)?;
        let body = serde_json::json!({
            "url": format!("https://{domain}"),
            "formats": ["markdown"],
            "onlyMainContent": true,
        });

        let text = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request = self
                .client
                .post(url.clone())
                .bearer_auth(&self.api_key)
                .json(&body);
            async move {
                let response = check_status(SERVICE, request.send().await?)?;
                Ok(response.text().await?)
            }
        })
        .await?;

        let parsed: ScrapeResponse =
            serde_json::from_str(&text).map_err(|e| ClientError::Deserialize {
                context: format!("scrape of {domain}"),
                source: e,
            })?;
        if !parsed.success {
            return Err(ClientError::Api {
                service: SERVICE,
                message: parsed
                    .error
                    .unwrap_or_else(|| format!("scrape of {domain} was not successful")),
            });
        }

        let data = parsed.data.ok_or_else(|| ClientError::Api {
            service: SERVICE,
            message: format!("scrape of {domain} returned no data"),
        })?;
        let metadata = data.metadata.unwrap_or_default();
        Ok(ScrapedPage {
            markdown: data.markdown.unwrap_or_default(),
            published_at: metadata.published_at(),
            url: metadata.source_url.clone(),
        })
    }

    /// Scrape up to `max_sources` domains and keep sentences mentioning `keyword`.
    ///
    /// A failing domain is logged and skipped. Credential rejection aborts the
    /// batch since every later request would fail the same way.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] on credential rejection, or the
    /// last error seen when every domain failed.
    pub async fn fetch_excerpts(
        &self,
        domains: &[String],
        keyword: &str,
        max_sources: usize,
    ) -> Result<Vec<RawWebRecord>, ClientError> {
        let mut records = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0usize;

        for domain in domains.iter().take(max_sources) {
            self.wait_turn().await;
            match self.scrape(domain).await {
                Ok(page) => {
                    succeeded += 1;
                    let sentences = extract_keyword_sentences(&page.markdown, keyword);
                    tracing::debug!(domain, sentences = sentences.len(), "scraped domain");
                    let url = page.url.unwrap_or_else(|| format!("https://{domain}"));
                    records.extend(sentences.into_iter().map(|sentence| RawWebRecord {
                        id: excerpt_id(domain, &sentence),
                        text: Some(sentence),
                        source_domain: domain.clone(),
                        published_at: page.published_at,
                        url: Some(url.clone()),
                    }));
                }
                Err(err @ ClientError::Unauthorized { .. }) => return Err(err),
                Err(err) => {
                    tracing::warn!(domain, error = %err, "scrape failed, skipping domain");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) if succeeded == 0 => Err(err),
            _ => Ok(records),
        }
    }
}

/// Sentences from `markdown` that mention `keyword`, case-insensitively.
///
/// Short fragments are dropped and at most three sentences are returned.
/// An empty keyword accepts every sentence.
#[must_use]
pub fn extract_keyword_sentences(markdown: &str, keyword: &str) -> Vec<String> {
    let needle = keyword.trim().to_lowercase();
    markdown
        .replace('\n', " ")
        .split(". ")
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .filter(|s| needle.is_empty() || s.to_lowercase().contains(&needle))
        .take(MAX_SENTENCES_PER_PAGE)
        .map(|s| {
            if s.ends_with('.') {
                s.to_string()
            } else {
                format!("{s}.")
            }
        })
        .collect()
}

/// Stable id: first 16 hex chars of `sha256(domain \n sentence)`.
fn excerpt_id(domain: &str, sentence: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(format!("{domain}\n{sentence}")));
    digest[..16].to_string()
}

#[async_trait]
impl WebSource for FirecrawlClient {
    async fn fetch(
        &self,
        domains: &[String],
        keyword: &str,
        max_sources: usize,
    ) -> Result<Vec<RawWebRecord>, SourceError> {
        Ok(self.fetch_excerpts(domains, keyword, max_sources).await?)
    }

    fn name(&self) -> &str {
        SERVICE
    }
}
