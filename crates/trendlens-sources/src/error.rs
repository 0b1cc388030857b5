use thiserror::Error;
use trendlens_engine::SourceError;

/// Errors returned by the Twitter and Firecrawl HTTP clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {service}")]
    RateLimited {
        service: &'static str,
        retry_after_secs: Option<u64>,
    },

    /// HTTP 401 or 403.
    #[error("{service} rejected credentials (HTTP {status})")]
    Unauthorized { service: &'static str, status: u16 },

    #[error("{service} returned unexpected status {status}")]
    UnexpectedStatus { service: &'static str, status: u16 },

    /// The API answered 2xx but reported a failure in its body.
    #[error("{service} API error: {message}")]
    Api {
        service: &'static str,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}

impl From<ClientError> for SourceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::RateLimited {
                retry_after_secs, ..
            } => SourceError::RateLimited { retry_after_secs },
            ClientError::Unauthorized { .. } => SourceError::Auth(err.to_string()),
            other => SourceError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_onto_source_error_categories() {
        let rl: SourceError = ClientError::RateLimited {
            service: "twitter",
            retry_after_secs: Some(12),
        }
        .into();
        assert_eq!(
            rl,
            SourceError::RateLimited {
                retry_after_secs: Some(12)
            }
        );

        let auth: SourceError = ClientError::Unauthorized {
            service: "firecrawl",
            status: 401,
        }
        .into();
        assert!(matches!(auth, SourceError::Auth(m) if m.contains("401")));

        let other: SourceError = ClientError::UnexpectedStatus {
            service: "twitter",
            status: 502,
        }
        .into();
        assert!(matches!(other, SourceError::Unavailable(_)));
    }
}
