use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::EngineError;
use crate::types::{KeywordComparison, TrendMetrics};

/// Reject an empty list, one longer than `max_keywords`, or any blank entry.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInput`] describing the first violation.
pub fn validate_keywords(keywords: &[String], max_keywords: usize) -> Result<(), EngineError> {
    if keywords.is_empty() {
        return Err(EngineError::InvalidInput(
            "keywords list is required".to_string(),
        ));
    }
    if keywords.len() > max_keywords {
        return Err(EngineError::InvalidInput(format!(
            "at most {max_keywords} keywords can be compared, got {}",
            keywords.len()
        )));
    }
    if let Some(pos) = keywords.iter().position(|k| k.trim().is_empty()) {
        return Err(EngineError::InvalidInput(format!(
            "keyword at position {pos} is blank"
        )));
    }
    Ok(())
}

/// Run `analyze` for every keyword and return one entry per keyword in input order.
///
/// `concurrency == 0` runs every keyword at once. A keyword that errors or
/// exceeds `keyword_timeout` gets an error marker; the rest are unaffected.
pub async fn compare<F, Fut>(
    keywords: &[String],
    concurrency: usize,
    keyword_timeout: Duration,
    analyze: F,
) -> Vec<KeywordComparison>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<TrendMetrics, EngineError>>,
{
    let limit = if concurrency == 0 {
        keywords.len().max(1)
    } else {
        concurrency
    };

    stream::iter(keywords.iter().cloned())
        .map(|keyword| {
            let run = analyze(keyword.clone());
            async move {
                let outcome = match tokio::time::timeout(keyword_timeout, run).await {
                    Ok(result) => result,
                    Err(_) => Err(EngineError::Internal(format!(
                        "analysis exceeded {}s budget",
                        keyword_timeout.as_secs()
                    ))),
                };
                match outcome {
                    Ok(metrics) => KeywordComparison {
                        keyword,
                        metrics: Some(metrics),
                        error: None,
                    },
                    Err(e) => {
                        tracing::warn!(keyword = %keyword, error = %e, "comparison entry failed");
                        KeywordComparison {
                            keyword,
                            metrics: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
        })
        .buffered(limit)
        .collect()
        .await
}
