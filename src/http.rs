//! HTTP helpers shared by the completion and search backends.

use crate::error::{Error, Result};

/// Reject non-2xx responses, keeping the body for the error message.
pub async fn check_status(
    resp: reqwest::Response,
    service: &'static str,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(Error::external(service, format!("{status}: {text}")))
}
