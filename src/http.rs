//! Shared HTTP client and status mapping.

use std::sync::OnceLock;

use crate::error::CompassError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Map a non-success status and body to an error.
pub fn status_to_error(status: u16, body: &str) -> CompassError {
    match status {
        401 | 403 => CompassError::Authentication(error_message(body).unwrap_or_else(|| body.to_string())),
        _ => CompassError::api(status, error_message(body).unwrap_or_else(|| body.to_string())),
    }
}

/// `error.message` from a Google-style JSON error body.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
