use thiserror::Error;
use trendlens_core::TimeframeError;

/// Failure reported by a social or web collaborator.
///
/// Never crosses the aggregation boundary: the pipeline degrades the source
/// to zero mentions and records a diagnostic instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("rate limited{}", .retry_after_secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("sentiment scoring failed: {0}")]
    Failed(String),
}

/// Errors that cross the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed request parameters, rejected before any collaborator call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TimeframeError> for EngineError {
    fn from(err: TimeframeError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
