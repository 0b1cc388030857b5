//! Command handlers: each maps one subcommand onto a `TrendEngine` tool and
//! renders the result as markdown or pretty JSON.

use std::sync::Arc;

use serde::Serialize;
use trendlens_core::AppConfig;
use trendlens_engine::pipeline::DEFAULT_TOPIC_CATEGORY;
use trendlens_engine::{report, EngineSettings, LexiconScorer, TrendEngine};

use crate::Commands;

/// Wire the HTTP adapters and the lexicon scorer into an engine.
///
/// # Errors
///
/// Returns an error if an adapter cannot be constructed from `config`.
pub(crate) fn build_engine(config: &AppConfig) -> anyhow::Result<TrendEngine> {
    let (twitter, firecrawl) = trendlens_sources::clients_from_config(config)?;
    Ok(TrendEngine::new(
        Arc::new(twitter),
        Arc::new(firecrawl),
        Arc::new(LexiconScorer),
        EngineSettings::from(config),
    ))
}

/// Run `command` against `engine` and return the text to print.
///
/// # Errors
///
/// Propagates engine validation errors and JSON serialization failures.
pub(crate) async fn execute(
    engine: &TrendEngine,
    command: Commands,
    json: bool,
) -> anyhow::Result<String> {
    let output = match command {
        Commands::Track { keyword, timeframe } => {
            let summary = engine.track_trend(&keyword, timeframe.as_deref()).await?;
            render(json, &summary, report::render_summary)?
        }
        Commands::Analyze { keyword, timeframe } => {
            let metrics = engine.analyze_trend(&keyword, timeframe.as_deref()).await?;
            render(json, &metrics, report::render_metrics)?
        }
        Commands::Compare {
            keywords,
            timeframe,
        } => {
            let entries = engine
                .compare_trends(&keywords, timeframe.as_deref())
                .await?;
            let label = timeframe
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map_or_else(|| engine.settings().default_timeframe.label(), str::to_string);
            render(json, &entries, |e| report::render_comparison(&label, e))?
        }
        Commands::Trending { category, limit } => {
            let topics = engine
                .get_trending_topics(category.as_deref(), limit)
                .await?;
            let category = category.unwrap_or_else(|| DEFAULT_TOPIC_CATEGORY.to_string());
            render(json, &topics, |t| report::render_topics(&category, t))?
        }
        Commands::Sentiment {
            keyword,
            source_type,
        } => {
            let metrics = engine
                .sentiment_breakdown(&keyword, Some(&source_type))
                .await?;
            render(json, &metrics, report::render_breakdown)?
        }
    };
    tracing::debug!(json, bytes = output.len(), "command complete");
    Ok(output)
}

fn render<T, F>(json: bool, value: &T, markdown: F) -> anyhow::Result<String>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(markdown(value))
    }
}
