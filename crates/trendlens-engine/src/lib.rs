//! Mention aggregation and trend scoring engine.
//!
//! Collects keyword mentions from a social search source and a web content
//! source, scores their sentiment through an injected scorer, and reduces
//! them to [`TrendMetrics`]: volume per platform, sentiment distribution,
//! top sources, and a trend direction derived from the two halves of the
//! request window. Results are memoized in an owned [`ResultCache`].

pub mod aggregate;
pub mod annotate;
pub mod cache;
pub mod collaborators;
pub mod compare;
pub mod discover;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod scorer;
pub mod selector;
pub mod types;

pub use aggregate::{aggregate, classify, trend_direction};
pub use cache::{CacheKey, ResultCache};
pub use collaborators::{SentimentScorer, SocialSource, WebSource};
pub use error::{EngineError, ScoreError, SourceError};
pub use pipeline::{EngineSettings, TrendEngine};
pub use scorer::LexiconScorer;
pub use selector::SourceSelector;
pub use types::{
    DegradeReason, KeywordComparison, Mention, Platform, RawSocialRecord, RawWebRecord,
    SentimentDistribution, SentimentLabel, SentimentSummary, SourceDiagnostic, SourceFilter,
    TopicCount, TrendCounts, TrendDirection, TrendMetrics, TrendSummary,
};

pub use trendlens_core::{Timeframe, Window};
