//! Seams to the outside world. Concrete HTTP adapters live in `trendlens-sources`;
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use trendlens_core::Window;

use crate::error::{ScoreError, SourceError};
use crate::types::{RawSocialRecord, RawWebRecord};

/// Keyword search over a social feed.
#[async_trait]
pub trait SocialSource: Send + Sync {
    /// Return at most `max_results` posts matching `query` published inside `window`.
    ///
    /// `window.end` may be treated as exclusive. When more posts match than
    /// `max_results`, which ones are returned is up to the provider; search
    /// APIs typically keep the newest.
    async fn search(
        &self,
        query: &str,
        window: &Window,
        max_results: usize,
    ) -> Result<Vec<RawSocialRecord>, SourceError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "social"
    }
}

/// Retrieval of keyword-bearing excerpts from web domains.
#[async_trait]
pub trait WebSource: Send + Sync {
    /// Fetch excerpts from the first `max_sources` of `domains`.
    ///
    /// The engine calls this with one domain at a time.
    ///
    /// An empty `keyword` means unfiltered.
    async fn fetch(
        &self,
        domains: &[String],
        keyword: &str,
        max_sources: usize,
    ) -> Result<Vec<RawWebRecord>, SourceError>;

    fn name(&self) -> &str {
        "web"
    }
}

/// Maps text to a polarity in `[-1.0, 1.0]`.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, text: &str) -> Result<f64, ScoreError>;
}
