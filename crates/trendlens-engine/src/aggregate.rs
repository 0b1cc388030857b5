//! Reduction of annotated mentions to [`TrendMetrics`].
//!
//! Every function here is pure and independent of input order.

use std::collections::{BTreeMap, HashMap};

use trendlens_core::{Timeframe, Window};

use crate::types::{
    Mention, MentionSample, Platform, SentimentDistribution, SentimentLabel, SentimentSummary,
    TrendCounts, TrendDirection, TrendMetrics,
};

/// Scores strictly above this are positive; strictly below its negation, negative.
pub const NEUTRAL_BAND: f64 = 0.1;
pub const TOP_SOURCES: usize = 5;
pub const SAMPLES_PER_PLATFORM: usize = 3;
pub const SAMPLE_TEXT_CHARS: usize = 200;

const RISING_RATIO: f64 = 1.2;
const FALLING_RATIO: f64 = 0.8;

#[must_use]
pub fn classify(score: f64) -> SentimentLabel {
    if score > NEUTRAL_BAND {
        SentimentLabel::Positive
    } else if score < -NEUTRAL_BAND {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Direction from first-half volume `c1` and second-half volume `c2`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn trend_direction(c1: usize, c2: usize) -> TrendDirection {
    if c1 == 0 {
        return if c2 == 0 {
            TrendDirection::Stable
        } else {
            TrendDirection::Rising
        };
    }
    let (c1, c2) = (c1 as f64, c2 as f64);
    if c2 > RISING_RATIO * c1 {
        TrendDirection::Rising
    } else if c2 < FALLING_RATIO * c1 {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    }
}

/// Build metrics for `keyword` over `window`.
///
/// Diagnostics are left empty for the caller to fill in.
#[must_use]
pub fn aggregate(
    keyword: &str,
    timeframe: Timeframe,
    window: Window,
    mentions: &[Mention],
) -> TrendMetrics {
    let mut mentions_by_platform: BTreeMap<Platform, usize> =
        Platform::ALL.iter().map(|p| (*p, 0)).collect();
    for m in mentions {
        *mentions_by_platform.entry(m.platform).or_insert(0) += 1;
    }

    let scores: Vec<f64> = mentions.iter().filter_map(|m| m.sentiment).collect();
    let overall_mean = mean(scores.clone());
    let sentiment_overall = SentimentSummary {
        label: overall_mean.map_or(SentimentLabel::Neutral, classify),
        score: overall_mean,
    };

    let sentiment_by_platform = Platform::ALL
        .iter()
        .map(|p| {
            let platform_scores = mentions
                .iter()
                .filter(|m| m.platform == *p)
                .filter_map(|m| m.sentiment)
                .collect();
            (*p, mean(platform_scores))
        })
        .collect();

    let trend_counts = trend_counts(mentions, window);

    TrendMetrics {
        keyword: keyword.to_string(),
        timeframe,
        window,
        total_mentions: mentions.len(),
        mentions_by_platform,
        scored_mentions: scores.len(),
        sentiment_overall,
        sentiment_distribution: distribution(&scores),
        sentiment_by_platform,
        trend_direction: trend_direction(trend_counts.first_half, trend_counts.second_half),
        trend_counts,
        top_sources: top_sources(mentions),
        sample_mentions: sample_mentions(mentions),
        diagnostics: Vec::new(),
    }
}

fn trend_counts(mentions: &[Mention], window: Window) -> TrendCounts {
    let mid = window.midpoint();
    let mut counts = TrendCounts::default();
    for m in mentions {
        match m.timestamp {
            None => counts.undated += 1,
            Some(ts) if !window.contains(ts) => counts.outside_window += 1,
            Some(ts) if ts < mid => counts.first_half += 1,
            Some(_) => counts.second_half += 1,
        }
    }
    counts
}

/// Mean of `scores`, summed in sorted order so the result does not depend on input order.
#[allow(clippy::cast_precision_loss)]
fn mean(mut scores: Vec<f64>) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    scores.sort_by(f64::total_cmp);
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

#[allow(clippy::cast_precision_loss)]
fn distribution(scores: &[f64]) -> Option<SentimentDistribution> {
    if scores.is_empty() {
        return None;
    }
    let (mut pos, mut neg, mut neu) = (0usize, 0usize, 0usize);
    for s in scores {
        match classify(*s) {
            SentimentLabel::Positive => pos += 1,
            SentimentLabel::Negative => neg += 1,
            SentimentLabel::Neutral => neu += 1,
        }
    }
    let n = scores.len() as f64;
    Some(SentimentDistribution {
        positive: pos as f64 / n,
        negative: neg as f64 / n,
        neutral: neu as f64 / n,
    })
}

fn top_sources(mentions: &[Mention]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for m in mentions {
        *counts.entry(m.source_name.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(TOP_SOURCES)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn sample_mentions(mentions: &[Mention]) -> Vec<MentionSample> {
    let mut samples = Vec::new();
    for platform in Platform::ALL {
        let mut candidates: Vec<&Mention> =
            mentions.iter().filter(|m| m.platform == platform).collect();
        candidates.sort_by(|a, b| {
            let strength = |m: &Mention| m.sentiment.map_or(-1.0, f64::abs);
            strength(b)
                .total_cmp(&strength(a))
                .then_with(|| a.id.cmp(&b.id))
        });
        samples.extend(
            candidates
                .into_iter()
                .take(SAMPLES_PER_PLATFORM)
                .map(|m| MentionSample {
                    platform,
                    source_name: m.source_name.clone(),
                    text: m.text.chars().take(SAMPLE_TEXT_CHARS).collect(),
                    sentiment: m.sentiment,
                    url: m.url.clone(),
                }),
        );
    }
    samples
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
