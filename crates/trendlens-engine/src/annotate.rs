use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::collaborators::SentimentScorer;
use crate::types::Mention;

/// Attaches a polarity to each mention through the injected scorer.
#[derive(Clone)]
pub struct SentimentAnnotator {
    scorer: Arc<dyn SentimentScorer>,
    concurrency: usize,
    timeout: Duration,
}

impl SentimentAnnotator {
    #[must_use]
    pub fn new(scorer: Arc<dyn SentimentScorer>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            scorer,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Score every mention with non-blank text, preserving order.
    ///
    /// A failed, timed-out or non-finite score leaves that mention's
    /// sentiment as `None` and does not affect the rest of the batch.
    pub async fn annotate(&self, mentions: Vec<Mention>) -> Vec<Mention> {
        stream::iter(mentions)
            .map(|mut mention| async move {
                mention.sentiment = self.score_one(&mention).await;
                mention
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn score_one(&self, mention: &Mention) -> Option<f64> {
        if mention.text.trim().is_empty() {
            return None;
        }
        match tokio::time::timeout(self.timeout, self.scorer.score(&mention.text)).await {
            Ok(Ok(score)) if score.is_finite() => Some(score.clamp(-1.0, 1.0)),
            Ok(Ok(score)) => {
                tracing::warn!(id = %mention.id, score, "scorer returned non-finite value");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(id = %mention.id, error = %e, "sentiment scoring failed");
                None
            }
            Err(_) => {
                tracing::warn!(id = %mention.id, "sentiment scoring timed out");
                None
            }
        }
    }
}
