//! The orchestrator behind every tool operation.
//!
//! A request is validated, looked up in the owned [`ResultCache`], and on a
//! miss runs selection, the concurrent social/web fetch, normalization,
//! annotation and aggregation. Collaborator failures never propagate; they
//! become [`SourceDiagnostic`] entries.
//!
//! The social feed is searched once per window half, each half capped at half
//! of `max_social_results`. Search endpoints return the newest posts first, so
//! a single capped search over the whole window would only ever see the latest
//! slice. The web feed is fetched one domain per call.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use trendlens_core::{AppConfig, Timeframe, Window};

use crate::aggregate::aggregate;
use crate::annotate::SentimentAnnotator;
use crate::cache::{canonical_keyword, CacheKey, ResultCache};
use crate::collaborators::{SentimentScorer, SocialSource, WebSource};
use crate::compare::{compare, validate_keywords};
use crate::discover::{discover_topics, seed_query};
use crate::error::{EngineError, SourceError};
use crate::normalize::normalize;
use crate::selector::SourceSelector;
use crate::types::{
    DegradeReason, KeywordComparison, Platform, RawSocialRecord, RawWebRecord, SourceDiagnostic,
    SourceFilter, TopicCount, TrendMetrics, TrendSummary,
};

pub const MAX_KEYWORD_CHARS: usize = 256;
pub const DEFAULT_TOPIC_LIMIT: usize = 10;
pub const MAX_TOPIC_LIMIT: usize = 50;
pub const DEFAULT_TOPIC_CATEGORY: &str = "general";

const OP_TRACK: &str = "track_trend";
const OP_ANALYZE: &str = "analyze_trend";
const OP_BREAKDOWN: &str = "sentiment_breakdown";
const OP_TOPICS: &str = "get_trending_topics";

/// Tunables for [`TrendEngine`]. Defaults mirror the documented config defaults.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub max_social_results: usize,
    pub max_web_sources: usize,
    pub default_timeframe: Timeframe,
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub source_timeout: Duration,
    pub keyword_timeout: Duration,
    /// `0` means unbounded.
    pub compare_concurrency: usize,
    pub sentiment_concurrency: usize,
    /// Domains fetched at once for one request.
    pub web_concurrency: usize,
    pub max_compare_keywords: usize,
    pub topic_min_occurrences: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_social_results: 100,
            max_web_sources: 10,
            default_timeframe: Timeframe::ONE_DAY,
            cache_ttl: Duration::from_secs(30 * 60),
            cache_max_entries: 256,
            source_timeout: Duration::from_secs(20),
            keyword_timeout: Duration::from_secs(60),
            compare_concurrency: 0,
            sentiment_concurrency: 8,
            web_concurrency: 4,
            max_compare_keywords: 5,
            topic_min_occurrences: 2,
        }
    }
}

impl From<&AppConfig> for EngineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_social_results: config.max_tweets_per_search,
            max_web_sources: config.max_web_sources,
            default_timeframe: config.default_timeframe,
            cache_ttl: Duration::from_secs(config.cache_duration_minutes.saturating_mul(60)),
            cache_max_entries: config.cache_max_entries,
            source_timeout: Duration::from_secs(config.source_timeout_secs),
            keyword_timeout: Duration::from_secs(config.keyword_timeout_secs),
            compare_concurrency: config.compare_concurrency,
            sentiment_concurrency: config.sentiment_concurrency,
            web_concurrency: config.web_concurrency,
            max_compare_keywords: config.max_compare_keywords,
            topic_min_occurrences: config.topic_min_occurrences,
        }
    }
}

pub struct TrendEngine {
    social: Arc<dyn SocialSource>,
    web: Arc<dyn WebSource>,
    annotator: SentimentAnnotator,
    selector: SourceSelector,
    settings: EngineSettings,
    metrics_cache: ResultCache<TrendMetrics>,
    topics_cache: ResultCache<Vec<TopicCount>>,
    clock: fn() -> DateTime<Utc>,
}

impl TrendEngine {
    #[must_use]
    pub fn new(
        social: Arc<dyn SocialSource>,
        web: Arc<dyn WebSource>,
        scorer: Arc<dyn SentimentScorer>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            social,
            web,
            annotator: SentimentAnnotator::new(
                scorer,
                settings.sentiment_concurrency,
                settings.source_timeout,
            ),
            selector: SourceSelector::new(settings.max_web_sources),
            metrics_cache: ResultCache::new(settings.cache_max_entries),
            topics_cache: ResultCache::new(settings.cache_max_entries),
            settings,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used to anchor request windows.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Drop every cached result.
    pub async fn clear_cache(&self) {
        self.metrics_cache.clear().await;
        self.topics_cache.clear().await;
    }

    /// Summary metrics for one keyword.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for a blank or over-long keyword
    /// or a malformed timeframe.
    pub async fn track_trend(
        &self,
        keyword: &str,
        timeframe: Option<&str>,
    ) -> Result<TrendSummary, EngineError> {
        let keyword = validate_keyword(keyword)?;
        let timeframe = self.resolve_timeframe(timeframe)?;
        let metrics = self
            .cached_metrics(OP_TRACK, &keyword, timeframe, SourceFilter::Both)
            .await;
        Ok(TrendSummary::from(&metrics))
    }

    /// Full metrics for one keyword.
    ///
    /// # Errors
    ///
    /// Same rules as [`Self::track_trend`].
    pub async fn analyze_trend(
        &self,
        keyword: &str,
        timeframe: Option<&str>,
    ) -> Result<TrendMetrics, EngineError> {
        let keyword = validate_keyword(keyword)?;
        let timeframe = self.resolve_timeframe(timeframe)?;
        Ok(self
            .cached_metrics(OP_ANALYZE, &keyword, timeframe, SourceFilter::Both)
            .await)
    }

    /// Metrics for each keyword, in input order. Per-keyword failures are
    /// reported inline rather than failing the whole comparison.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] when the list is empty, too long,
    /// or contains a blank or over-long keyword, or the timeframe is malformed.
    pub async fn compare_trends(
        &self,
        keywords: &[String],
        timeframe: Option<&str>,
    ) -> Result<Vec<KeywordComparison>, EngineError> {
        validate_keywords(keywords, self.settings.max_compare_keywords)?;
        for keyword in keywords {
            check_keyword_length(&canonical_keyword(keyword))?;
        }
        let timeframe = self.resolve_timeframe(timeframe)?;

        Ok(compare(
            keywords,
            self.settings.compare_concurrency,
            self.settings.keyword_timeout,
            |keyword| async move {
                let keyword = canonical_keyword(&keyword);
                Ok(self
                    .cached_metrics(OP_ANALYZE, &keyword, timeframe, SourceFilter::Both)
                    .await)
            },
        )
        .await)
    }

    /// Topics surfacing in a broad sample of recent content.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] when `limit` is outside `1..=50`.
    pub async fn get_trending_topics(
        &self,
        category: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<TopicCount>, EngineError> {
        let limit = limit.unwrap_or(DEFAULT_TOPIC_LIMIT);
        if !(1..=MAX_TOPIC_LIMIT).contains(&limit) {
            return Err(EngineError::InvalidInput(format!(
                "limit must be between 1 and {MAX_TOPIC_LIMIT}, got {limit}"
            )));
        }
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_TOPIC_CATEGORY)
            .to_ascii_lowercase();

        let key = CacheKey::new(OP_TOPICS).scope(&category);
        let mut topics = self
            .topics_cache
            .get_or_compute(key, self.settings.cache_ttl, || {
                self.compute_topics(&category)
            })
            .await;
        topics.truncate(limit);
        Ok(topics)
    }

    /// Metrics restricted to the platforms selected by `source_type`, over the
    /// default timeframe.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for a bad keyword or an unknown
    /// `source_type`.
    pub async fn sentiment_breakdown(
        &self,
        keyword: &str,
        source_type: Option<&str>,
    ) -> Result<TrendMetrics, EngineError> {
        let keyword = validate_keyword(keyword)?;
        let filter = match source_type {
            Some(raw) => SourceFilter::parse(raw)?,
            None => SourceFilter::Both,
        };
        Ok(self
            .cached_metrics(
                OP_BREAKDOWN,
                &keyword,
                self.settings.default_timeframe,
                filter,
            )
            .await)
    }

    fn resolve_timeframe(&self, raw: Option<&str>) -> Result<Timeframe, EngineError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Ok(Timeframe::parse(raw)?),
            None => Ok(self.settings.default_timeframe),
        }
    }

    async fn cached_metrics(
        &self,
        operation: &str,
        keyword: &str,
        timeframe: Timeframe,
        filter: SourceFilter,
    ) -> TrendMetrics {
        let key = CacheKey::new(operation)
            .keywords([keyword])
            .timeframe(timeframe)
            .scope(filter.as_str());
        self.metrics_cache
            .get_or_compute(key, self.settings.cache_ttl, || {
                self.compute_metrics(keyword, timeframe, filter)
            })
            .await
    }

    async fn compute_metrics(
        &self,
        keyword: &str,
        timeframe: Timeframe,
        filter: SourceFilter,
    ) -> TrendMetrics {
        let started = Instant::now();
        let window = timeframe.window_ending_at((self.clock)());
        let domains = self.selector.select(keyword);

        let social = async {
            if filter.includes(Platform::Social) {
                self.guarded(Platform::Social, self.search_by_half(keyword, &window))
                    .await
            } else {
                (Vec::new(), None)
            }
        };
        let web = async {
            if filter.includes(Platform::Web) {
                self.fetch_web(&domains, keyword).await
            } else {
                (Vec::new(), None)
            }
        };
        let ((raw_social, social_diag), (raw_web, web_diag)) = tokio::join!(social, web);

        let mentions = self.annotator.annotate(normalize(raw_social, raw_web)).await;
        let mut metrics = aggregate(keyword, timeframe, window, &mentions);
        metrics.diagnostics = social_diag.into_iter().chain(web_diag).collect();
        metrics.restrict_to(filter);

        tracing::info!(
            keyword,
            timeframe = %timeframe,
            filter = filter.as_str(),
            count = metrics.total_mentions,
            direction = metrics.trend_direction.as_str(),
            degraded = metrics.diagnostics.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "trend metrics computed"
        );
        metrics
    }

    async fn compute_topics(&self, category: &str) -> Vec<TopicCount> {
        let window = self
            .settings
            .default_timeframe
            .window_ending_at((self.clock)());
        let query = seed_query(category);
        let domains = self.selector.for_category(category);

        let ((raw_social, social_diag), (raw_web, web_diag)) = tokio::join!(
            self.guarded(
                Platform::Social,
                self.social
                    .search(&query, &window, self.settings.max_social_results),
            ),
            self.fetch_web(&domains, ""),
        );

        let mentions = normalize(raw_social, raw_web);
        let topics = discover_topics(
            &mentions,
            self.settings.topic_min_occurrences,
            MAX_TOPIC_LIMIT,
        );
        tracing::info!(
            category,
            count = mentions.len(),
            topics = topics.len(),
            degraded = usize::from(social_diag.is_some()) + usize::from(web_diag.is_some()),
            "trending topics computed"
        );
        topics
    }

    /// Search `[start, mid)` and `[mid, end]` separately so each half of the
    /// window gets its own share of the result cap.
    async fn search_by_half(
        &self,
        keyword: &str,
        window: &Window,
    ) -> Result<Vec<RawSocialRecord>, SourceError> {
        let (earlier, later) = window.halves();
        let cap = self.settings.max_social_results;
        let earlier_cap = cap / 2;
        let (first, second) = tokio::join!(
            self.social.search(keyword, &earlier, earlier_cap),
            self.social.search(keyword, &later, cap - earlier_cap),
        );
        let mut records = first?;
        records.extend(second?);
        Ok(records)
    }

    /// One guarded call per domain. Whatever succeeded is kept; a diagnostic
    /// is raised only when every domain failed.
    async fn fetch_web(
        &self,
        domains: &[String],
        keyword: &str,
    ) -> (Vec<RawWebRecord>, Option<SourceDiagnostic>) {
        let calls: Vec<_> = domains
            .iter()
            .take(self.settings.max_web_sources)
            .map(|domain| {
                self.guarded(
                    Platform::Web,
                    self.web.fetch(std::slice::from_ref(domain), keyword, 1),
                )
            })
            .collect();
        let outcomes: Vec<_> = stream::iter(calls)
            .buffered(self.settings.web_concurrency.max(1))
            .collect()
            .await;

        let attempted = outcomes.len();
        let mut records = Vec::new();
        let mut failures = Vec::new();
        for (batch, diagnostic) in outcomes {
            records.extend(batch);
            failures.extend(diagnostic);
        }
        if attempted == 0 || failures.len() < attempted {
            if !failures.is_empty() {
                tracing::info!(
                    keyword,
                    failed = failures.len(),
                    attempted,
                    "web fetch partially degraded"
                );
            }
            return (records, None);
        }
        let diagnostic = failures.pop().map(|last| SourceDiagnostic {
            message: format!("all {attempted} domains failed; last: {}", last.message),
            ..last
        });
        (records, diagnostic)
    }

    /// Run one collaborator call under the source timeout, degrading failure
    /// to an empty result plus a diagnostic.
    async fn guarded<T, F>(&self, platform: Platform, call: F) -> (Vec<T>, Option<SourceDiagnostic>)
    where
        F: Future<Output = Result<Vec<T>, SourceError>>,
    {
        let (reason, message) = match tokio::time::timeout(self.settings.source_timeout, call).await
        {
            Ok(Ok(records)) => return (records, None),
            Ok(Err(e)) => (degrade_reason(&e), e.to_string()),
            Err(_) => (
                DegradeReason::TimedOut,
                format!(
                    "no response within {}s",
                    self.settings.source_timeout.as_secs()
                ),
            ),
        };
        tracing::warn!(platform = %platform, error = %message, "source degraded");
        (
            Vec::new(),
            Some(SourceDiagnostic {
                platform,
                reason,
                message,
            }),
        )
    }
}

fn degrade_reason(err: &SourceError) -> DegradeReason {
    match err {
        SourceError::RateLimited { .. } => DegradeReason::RateLimited,
        SourceError::Auth(_) => DegradeReason::AuthError,
        SourceError::Unavailable(_) => DegradeReason::Unavailable,
    }
}

/// Canonicalize a keyword, rejecting blank or over-long input.
fn validate_keyword(raw: &str) -> Result<String, EngineError> {
    let keyword = canonical_keyword(raw);
    if keyword.is_empty() {
        return Err(EngineError::InvalidInput("keyword is required".to_string()));
    }
    check_keyword_length(&keyword)?;
    Ok(keyword)
}

fn check_keyword_length(keyword: &str) -> Result<(), EngineError> {
    let chars = keyword.chars().count();
    if chars > MAX_KEYWORD_CHARS {
        return Err(EngineError::InvalidInput(format!(
            "keyword is {chars} characters; the maximum is {MAX_KEYWORD_CHARS}"
        )));
    }
    Ok(())
}
