use chrono::Utc;
use reqwest::{Client, Response, StatusCode, Url};

use crate::error::ClientError;
use crate::ClientSettings;

pub(crate) fn build_client(settings: &ClientSettings) -> Result<Client, ClientError> {
    Ok(Client::builder()
        .timeout(settings.timeout)
        .connect_timeout(std::time::Duration::from_secs(10))
        .user_agent(settings.user_agent.as_str())
        .build()?)
}

/// Parse `raw`, ensuring exactly one trailing slash so relative joins append.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|_| ClientError::InvalidBaseUrl(raw.to_owned()))
}

pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, ClientError> {
    base.join(path)
        .map_err(|_| ClientError::InvalidBaseUrl(base.to_string()))
}

/// Map non-2xx responses onto [`ClientError`].
pub(crate) fn check_status(service: &'static str, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ClientError::RateLimited {
            service,
            retry_after_secs: retry_after_secs(&response),
        });
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ClientError::Unauthorized {
            service,
            status: status.as_u16(),
        });
    }
    Err(ClientError::UnexpectedStatus {
        service,
        status: status.as_u16(),
    })
}

/// `retry-after` in seconds, or the distance to an `x-rate-limit-reset` epoch.
fn retry_after_secs(response: &Response) -> Option<u64> {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok())
    };
    if let Some(secs) = header(reqwest::header::RETRY_AFTER.as_str()) {
        return u64::try_from(secs).ok();
    }
    header("x-rate-limit-reset").map(|reset| {
        u64::try_from(reset.saturating_sub(Utc::now().timestamp())).unwrap_or(0)
    })
}
