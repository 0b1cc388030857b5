use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trendlens_core::{Timeframe, Window};

use crate::error::EngineError;

/// `source_name` assigned to every social mention.
pub const SOCIAL_SOURCE_NAME: &str = "twitter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Social,
    Web,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Social, Platform::Web];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Social => "social",
            Platform::Web => "web",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A post returned by the social search collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSocialRecord {
    pub id: String,
    pub text: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
}

/// An excerpt returned by the web content collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWebRecord {
    pub id: String,
    pub text: Option<String>,
    pub source_domain: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

/// One normalized piece of content referencing the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Unique per platform; ids from different platforms may collide.
    pub id: String,
    pub platform: Platform,
    pub source_name: String,
    pub text: String,
    /// `None` keeps the mention in totals but out of the trend halves.
    pub timestamp: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub url: Option<String>,
    /// Polarity in `[-1.0, 1.0]`; `None` until annotated, or when scoring failed.
    pub sentiment: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub label: SentimentLabel,
    /// Mean polarity; `None` when no mention carries a score.
    pub score: Option<f64>,
}

/// Fractions of scored mentions per class. Sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl TrendDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Rising => "RISING",
            TrendDirection::Falling => "FALLING",
            TrendDirection::Stable => "STABLE",
        }
    }
}

/// Volumes behind the trend-direction decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendCounts {
    pub first_half: usize,
    pub second_half: usize,
    /// Mentions without a timestamp.
    pub undated: usize,
    /// Timestamped mentions that fall outside the window.
    pub outside_window: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    RateLimited,
    AuthError,
    Unavailable,
    TimedOut,
}

impl DegradeReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DegradeReason::RateLimited => "rate_limited",
            DegradeReason::AuthError => "auth_error",
            DegradeReason::Unavailable => "unavailable",
            DegradeReason::TimedOut => "timed_out",
        }
    }
}

/// Why a source contributed nothing to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDiagnostic {
    pub platform: Platform,
    pub reason: DegradeReason,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionSample {
    pub platform: Platform,
    pub source_name: String,
    pub text: String,
    pub sentiment: Option<f64>,
    pub url: Option<String>,
}

/// Aggregate result for one keyword over one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendMetrics {
    pub keyword: String,
    pub timeframe: Timeframe,
    pub window: Window,
    pub total_mentions: usize,
    pub mentions_by_platform: BTreeMap<Platform, usize>,
    pub scored_mentions: usize,
    pub sentiment_overall: SentimentSummary,
    pub sentiment_distribution: Option<SentimentDistribution>,
    pub sentiment_by_platform: BTreeMap<Platform, Option<f64>>,
    pub trend_direction: TrendDirection,
    pub trend_counts: TrendCounts,
    pub top_sources: Vec<String>,
    pub sample_mentions: Vec<MentionSample>,
    pub diagnostics: Vec<SourceDiagnostic>,
}

impl TrendMetrics {
    #[must_use]
    pub fn mentions_on(&self, platform: Platform) -> usize {
        self.mentions_by_platform
            .get(&platform)
            .copied()
            .unwrap_or(0)
    }

    /// Drop per-platform entries for platforms outside `filter`.
    pub fn restrict_to(&mut self, filter: SourceFilter) {
        self.mentions_by_platform.retain(|p, _| filter.includes(*p));
        self.sentiment_by_platform.retain(|p, _| filter.includes(*p));
        self.sample_mentions.retain(|s| filter.includes(s.platform));
        self.diagnostics.retain(|d| filter.includes(d.platform));
    }
}

/// Compact form of [`TrendMetrics`] returned by `track_trend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub keyword: String,
    pub timeframe: Timeframe,
    pub total_mentions: usize,
    pub mentions_by_platform: BTreeMap<Platform, usize>,
    pub sentiment: SentimentSummary,
    pub trend_direction: TrendDirection,
    pub top_sources: Vec<String>,
    pub diagnostics: Vec<SourceDiagnostic>,
}

const SUMMARY_TOP_SOURCES: usize = 3;

impl From<&TrendMetrics> for TrendSummary {
    fn from(m: &TrendMetrics) -> Self {
        Self {
            keyword: m.keyword.clone(),
            timeframe: m.timeframe,
            total_mentions: m.total_mentions,
            mentions_by_platform: m.mentions_by_platform.clone(),
            sentiment: m.sentiment_overall,
            trend_direction: m.trend_direction,
            top_sources: m
                .top_sources
                .iter()
                .take(SUMMARY_TOP_SOURCES)
                .cloned()
                .collect(),
            diagnostics: m.diagnostics.clone(),
        }
    }
}

/// Which platforms a request draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFilter {
    Social,
    Web,
    #[default]
    Both,
}

impl SourceFilter {
    /// Parse a user-supplied filter. `twitter` is accepted as an alias for `social`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for unknown values.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "social" | "twitter" => Ok(Self::Social),
            "web" => Ok(Self::Web),
            "both" | "" => Ok(Self::Both),
            other => Err(EngineError::InvalidInput(format!(
                "unknown source_type \"{other}\"; expected social, web, or both"
            ))),
        }
    }

    #[must_use]
    pub fn includes(self, platform: Platform) -> bool {
        match self {
            Self::Both => true,
            Self::Social => platform == Platform::Social,
            Self::Web => platform == Platform::Web,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Social => "social",
            Self::Web => "web",
            Self::Both => "both",
        }
    }
}

/// One entry of a comparison. Exactly one of `metrics` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordComparison {
    pub keyword: String,
    pub metrics: Option<TrendMetrics>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub mention_count: usize,
}
