use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ProviderError;

/// Body fragments that mark a quota/rate-limit refusal even when the status is not 429.
const RATE_LIMIT_MARKERS: [&str; 4] = ["resource_exhausted", "resource exhausted", "quota", "rate limit"];

/// Map a non-success HTTP response onto the coarse provider error classes.
pub fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let detail = format!("HTTP {status}: {}", truncate(body, 300));
    let lowered = body.to_ascii_lowercase();

    if status == StatusCode::TOO_MANY_REQUESTS
        || RATE_LIMIT_MARKERS.iter().any(|marker| lowered.contains(marker))
    {
        return ProviderError::RateLimited(detail);
    }

    match status.as_u16() {
        401 | 403 => ProviderError::AuthMissing(detail),
        408 | 500..=599 => ProviderError::Transient(detail),
        _ => ProviderError::Unknown(detail),
    }
}

/// Map a transport-level failure (no response received).
pub fn classify_transport(err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        ProviderError::Transient(err.to_string())
    } else if let Some(status) = err.status() {
        classify_status(status, "")
    } else {
        ProviderError::Unknown(err.to_string())
    }
}

/// Send a JSON request and return the decoded JSON body of a successful response.
pub async fn send_json(provider: &str, request: RequestBuilder) -> Result<Value, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| classify_transport(&e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let error = classify_status(status, &body);
        warn!(provider, status = %status, error = %error, "Provider call rejected");
        return Err(error);
    }

    debug!(provider, status = %status, "Provider call succeeded");
    response
        .json::<Value>()
        .await
        .map_err(|e| ProviderError::Unknown(format!("{provider} returned undecodable body: {e}")))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
