// src/utils/http.rs

//! HTTP client construction.

use std::time::Duration;

use crate::error::Result;
use crate::models::HttpConfig;

/// Create the shared client used for image downloads and link previews.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}
