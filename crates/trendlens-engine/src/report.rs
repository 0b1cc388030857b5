//! Markdown renderings of tool results.

use std::fmt::Write as _;

use crate::types::{
    KeywordComparison, Platform, SentimentDistribution, SentimentSummary, SourceDiagnostic,
    TopicCount, TrendMetrics, TrendSummary,
};

fn score(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

fn platform_title(platform: Platform) -> &'static str {
    match platform {
        Platform::Social => "Social",
        Platform::Web => "Web",
    }
}

fn sentiment_line(summary: &SentimentSummary) -> String {
    format!("{} ({})", summary.label.as_str().to_uppercase(), score(summary.score))
}

fn distribution_line(dist: Option<&SentimentDistribution>) -> String {
    match dist {
        Some(d) => format!(
            "{} positive, {} negative, {} neutral",
            pct(d.positive),
            pct(d.negative),
            pct(d.neutral)
        ),
        None => "no scored mentions".to_string(),
    }
}

fn push_diagnostics(out: &mut String, diagnostics: &[SourceDiagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    out.push_str("\n## Degraded Sources\n");
    for d in diagnostics {
        let _ = writeln!(
            out,
            "- **{}**: {} ({})",
            platform_title(d.platform),
            d.reason.as_str(),
            d.message
        );
    }
}

#[must_use]
pub fn render_summary(summary: &TrendSummary) -> String {
    let mut out = format!("# Trend: {} ({})\n\n", summary.keyword, summary.timeframe);
    let _ = writeln!(out, "- **Total Mentions**: {}", summary.total_mentions);
    for (platform, count) in &summary.mentions_by_platform {
        let _ = writeln!(out, "- **{}**: {count} mentions", platform_title(*platform));
    }
    let _ = writeln!(out, "- **Sentiment**: {}", sentiment_line(&summary.sentiment));
    let _ = writeln!(out, "- **Trend Direction**: {}", summary.trend_direction.as_str());
    if !summary.top_sources.is_empty() {
        let _ = writeln!(out, "- **Top Sources**: {}", summary.top_sources.join(", "));
    }
    push_diagnostics(&mut out, &summary.diagnostics);
    out
}

#[must_use]
pub fn render_metrics(metrics: &TrendMetrics) -> String {
    let mut out = format!("# Trend Analysis: {}\n\n## Summary\n", metrics.keyword);
    let _ = writeln!(out, "- **Timeframe**: {}", metrics.timeframe);
    let _ = writeln!(out, "- **Total Mentions**: {}", metrics.total_mentions);
    for (platform, count) in &metrics.mentions_by_platform {
        let _ = writeln!(out, "- **{}**: {count} mentions", platform_title(*platform));
    }
    let _ = writeln!(
        out,
        "- **Trend Direction**: {} ({} → {}, {} undated)",
        metrics.trend_direction.as_str(),
        metrics.trend_counts.first_half,
        metrics.trend_counts.second_half,
        metrics.trend_counts.undated
    );

    out.push_str("\n## Sentiment Analysis\n");
    let _ = writeln!(out, "### Overall: {}", sentiment_line(&metrics.sentiment_overall));
    let _ = writeln!(
        out,
        "- {}",
        distribution_line(metrics.sentiment_distribution.as_ref())
    );
    for (platform, mean) in &metrics.sentiment_by_platform {
        let _ = writeln!(out, "- **{}**: {}", platform_title(*platform), score(*mean));
    }

    if !metrics.top_sources.is_empty() {
        out.push_str("\n## Top Sources\n");
        for source in &metrics.top_sources {
            let _ = writeln!(out, "- {source}");
        }
    }

    if !metrics.sample_mentions.is_empty() {
        out.push_str("\n## Sample Mentions\n");
        for sample in &metrics.sample_mentions {
            let _ = writeln!(
                out,
                "- **{}** ({}, {}): {}",
                platform_title(sample.platform),
                sample.source_name,
                score(sample.sentiment),
                sample.text.replace('\n', " ")
            );
        }
    }

    push_diagnostics(&mut out, &metrics.diagnostics);
    out
}

#[must_use]
pub fn render_comparison(timeframe: &str, entries: &[KeywordComparison]) -> String {
    let mut out = format!("# Trend Comparison ({timeframe})\n\n## Summary\n");
    out.push_str("| Keyword | Mentions | Sentiment | Direction |\n");
    out.push_str("|---------|----------|-----------|-----------|\n");
    for entry in entries {
        match &entry.metrics {
            Some(m) => {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    entry.keyword,
                    m.total_mentions,
                    sentiment_line(&m.sentiment_overall),
                    m.trend_direction.as_str()
                );
            }
            None => {
                let _ = writeln!(out, "| {} | - | - | error |", entry.keyword);
            }
        }
    }

    out.push_str("\n## Detailed Analysis\n");
    for entry in entries {
        let _ = writeln!(out, "\n### {}", entry.keyword);
        match (&entry.metrics, &entry.error) {
            (Some(m), _) => {
                let _ = writeln!(
                    out,
                    "- **Volume**: {} total ({} social, {} web)",
                    m.total_mentions,
                    m.mentions_on(Platform::Social),
                    m.mentions_on(Platform::Web)
                );
                let _ = writeln!(out, "- **Sentiment**: {}", sentiment_line(&m.sentiment_overall));
                let _ = writeln!(
                    out,
                    "- **Distribution**: {}",
                    distribution_line(m.sentiment_distribution.as_ref())
                );
            }
            (None, error) => {
                let _ = writeln!(
                    out,
                    "- **Error**: {}",
                    error.as_deref().unwrap_or("unknown failure")
                );
            }
        }
    }
    out
}

#[must_use]
pub fn render_topics(category: &str, topics: &[TopicCount]) -> String {
    let mut out = format!("# Trending Topics: {category}\n\n");
    for (i, topic) in topics.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} ({} mentions)",
            i + 1,
            topic.topic,
            topic.mention_count
        );
    }
    let _ = write!(out, "\n*{} topics found*\n", topics.len());
    out
}

#[must_use]
pub fn render_breakdown(metrics: &TrendMetrics) -> String {
    let mut out = format!("# Sentiment Analysis: {}\n", metrics.keyword);
    for (platform, count) in &metrics.mentions_by_platform {
        let _ = writeln!(out, "\n## {} Sentiment", platform_title(*platform));
        let mean = metrics.sentiment_by_platform.get(platform).copied().flatten();
        let _ = writeln!(out, "- **Mean Score**: {}", score(mean));
        let _ = writeln!(out, "- **Mentions**: {count}");
    }
    out.push_str("\n## Combined Sentiment\n");
    let _ = writeln!(out, "- **Overall**: {}", sentiment_line(&metrics.sentiment_overall));
    let _ = writeln!(
        out,
        "- **Distribution**: {}",
        distribution_line(metrics.sentiment_distribution.as_ref())
    );
    let _ = writeln!(out, "- **Total Mentions**: {}", metrics.total_mentions);
    push_diagnostics(&mut out, &metrics.diagnostics);
    out
}
