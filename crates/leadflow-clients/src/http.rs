use std::time::Duration;

use leadflow_core::{LeadflowError, Result};
use reqwest::StatusCode;

/// Shared JSON-over-HTTPS client with a whole-request timeout.
pub(crate) fn client(adapter: &'static str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("leadflow/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| LeadflowError::transport(adapter, e.to_string()))
}

/// Map a failed request into the adapter error taxonomy.
///
/// The URL is stripped first; Hunter carries its API key in the query string.
pub(crate) fn request_error(
    adapter: &'static str,
    timeout: Duration,
    e: reqwest::Error,
) -> LeadflowError {
    let e = e.without_url();
    if e.is_timeout() {
        LeadflowError::AdapterTimeout {
            adapter,
            secs: timeout.as_secs(),
        }
    } else if e.is_decode() {
        LeadflowError::bad_response(adapter, e.to_string())
    } else {
        LeadflowError::transport(adapter, e.to_string())
    }
}

/// Pass 2xx responses through; turn everything else into an error.
///
/// 401 and 403 are credential problems. Any other status carries a short
/// excerpt of the body for the log.
pub(crate) async fn check_status(
    adapter: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(LeadflowError::AdapterAuthFailure(adapter));
    }
    let body = resp.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(200).collect();
    Err(LeadflowError::bad_response(
        adapter,
        format!("HTTP {}: {}", status.as_u16(), excerpt.trim()),
    ))
}
