// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use reqwest::{Client, Response};

/// POSTs `data` as JSON. A non 2xx status is turned into an error.
///
/// # Errors
///
/// Connection failures, and responses whose status is not a success.
pub async fn make_post_request(
    client: &Client,
    url: &str,
    data: &serde_json::Value,
) -> Result<Response, reqwest::Error> {
    let response = client.post(url).json(data).send().await?;
    if response.status().is_success() {
        // % is Display, ? is Debug.
        tracing::debug!(message = "POST request succeeded", url, status = %response.status());
        Ok(response)
    } else {
        tracing::error!(message = "POST request failed", url, status = %response.status());
        response.error_for_status()
    }
}
