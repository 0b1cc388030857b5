//! Twitter/X API v2 recent-search client.
//!
//! Calls `GET /2/tweets/search/recent` with a bearer token, following
//! `next_token` pagination until enough posts are collected. Retweets and
//! non-English posts are excluded in the query itself.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use trendlens_engine::{RawSocialRecord, SocialSource, SourceError, Window};

use crate::error::ClientError;
use crate::http::{build_client, check_status, endpoint, parse_base_url};
use crate::retry::retry_with_backoff;
use crate::ClientSettings;

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";
const SERVICE: &str = "twitter";
const SEARCH_PATH: &str = "2/tweets/search/recent";
const MIN_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 10;
/// Recent search only reaches back seven days; stay a minute inside that.
const RETENTION: TimeDelta = TimeDelta::days(7);
const RETENTION_MARGIN: TimeDelta = TimeDelta::minutes(1);
/// `end_time` must be at least ten seconds before the request.
const END_TIME_LAG: TimeDelta = TimeDelta::seconds(10);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    includes: Option<Includes>,
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: Option<String>,
    created_at: Option<DateTime<Utc>>,
    author_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct Meta {
    next_token: Option<String>,
}

pub struct TwitterClient {
    client: Client,
    bearer_token: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl TwitterClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(bearer_token: &str, settings: &ClientSettings) -> Result<Self, ClientError> {
        Self::with_base_url(bearer_token, settings, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the client cannot be constructed, or
    /// [`ClientError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        bearer_token: &str,
        settings: &ClientSettings,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_client(settings)?,
            bearer_token: bearer_token.to_owned(),
            base_url: parse_base_url(base_url)?,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        })
    }

    /// Search recent posts matching `query` inside `window`.
    ///
    /// The window is clipped to the API's seven-day retention. Returns at
    /// most `max_results` records.
    ///
    /// # Errors
    ///
    /// - [`ClientError::RateLimited`] on HTTP 429.
    /// - [`ClientError::Unauthorized`] on HTTP 401/403.
    /// - [`ClientError::UnexpectedStatus`] or [`ClientError::Http`] on other
    ///   failures, after retries.
    /// - [`ClientError::Deserialize`] if a page does not match the expected shape.
    pub async fn search_recent(
        &self,
        query: &str,
        window: &Window,
        max_results: usize,
    ) -> Result<Vec<RawSocialRecord>, ClientError> {
        let now = Utc::now();
        let start = window.start.max(now - RETENTION + RETENTION_MARGIN);
        let end = window.end.min(now - END_TIME_LAG);
        if max_results == 0 || start >= end {
            return Ok(Vec::new());
        }

        let url = endpoint(&self.base_url, SEARCH_PATH)?;
        let full_query = format!("{query} -is:retweet lang:en");
        let start_time = start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let end_time = end.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut records = Vec::new();
        let mut next_token: Option<String> = None;
        for page in 0..MAX_PAGES {
            let page_size = (max_results - records.len()).clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
            let mut params = vec![
                ("query", full_query.clone()),
                ("max_results", page_size.to_string()),
                ("start_time", start_time.clone()),
                ("end_time", end_time.clone()),
                ("tweet.fields", "created_at,author_id".to_string()),
                ("expansions", "author_id".to_string()),
                ("user.fields", "username".to_string()),
            ];
            if let Some(token) = &next_token {
                params.push(("next_token", token.clone()));
            }

            let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                let request = self
                    .client
                    .get(url.clone())
                    .bearer_auth(&self.bearer_token)
                    .query(&params);
                async move {
                    let response = check_status(SERVICE, request.send().await?)?;
                    Ok(response.text().await?)
                }
            })
            .await?;

            let parsed: SearchResponse =
                serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                    context: format!("recent search page {page}"),
                    source: e,
                })?;

            records.extend(into_records(parsed.data, parsed.includes));
            next_token = parsed.meta.and_then(|m| m.next_token);
            if records.len() >= max_results || next_token.is_none() {
                break;
            }
        }

        records.truncate(max_results);
        tracing::debug!(query, count = records.len(), "twitter search complete");
        Ok(records)
    }
}

fn into_records(tweets: Vec<Tweet>, includes: Option<Includes>) -> Vec<RawSocialRecord> {
    let usernames: HashMap<String, String> = includes
        .map(|i| i.users.into_iter().map(|u| (u.id, u.username)).collect())
        .unwrap_or_default();
    tweets
        .into_iter()
        .map(|t| RawSocialRecord {
            author: t
                .author_id
                .as_ref()
                .and_then(|id| usernames.get(id))
                .cloned(),
            id: t.id,
            text: t.text,
            created_at: t.created_at,
        })
        .collect()
}

#[async_trait]
impl SocialSource for TwitterClient {
    async fn search(
        &self,
        query: &str,
        window: &Window,
        max_results: usize,
    ) -> Result<Vec<RawSocialRecord>, SourceError> {
        Ok(self.search_recent(query, window, max_results).await?)
    }

    fn name(&self) -> &str {
        SERVICE
    }
}
