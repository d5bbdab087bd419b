//! Blocking HTTP plumbing shared by the cloud backends.

use crate::error::{Result, ScribeError};
use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Longest error body echoed back into an error message.
const MAX_ERROR_BODY: usize = 500;

/// Headers for an API that authenticates with `Authorization: <scheme> <secret>`.
pub fn auth_headers(service: &str, scheme: &str, secret: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("chunkscribe/{}", crate::version_string())).map_err(
            |e| ScribeError::Http {
                service: service.to_string(),
                message: format!("Invalid user agent: {}", e),
            },
        )?,
    );

    let mut auth = HeaderValue::from_str(&format!("{} {}", scheme, secret)).map_err(|e| {
        ScribeError::Http {
            service: service.to_string(),
            message: format!("Invalid authorization header value: {}", e),
        }
    })?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    Ok(headers)
}

pub fn build_client(service: &str, headers: HeaderMap, timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ScribeError::Http {
            service: service.to_string(),
            message: format!("Failed to build HTTP client: {}", e),
        })
}

/// Map transport failures and non-2xx statuses to [`ScribeError::Http`].
pub fn check(service: &str, response: reqwest::Result<Response>) -> Result<Response> {
    let response = response.map_err(|e| ScribeError::Http {
        service: service.to_string(),
        message: format!("HTTP request failed: {}", e),
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .unwrap_or_else(|_| "Failed to read error response".to_string());
    Err(ScribeError::Http {
        service: service.to_string(),
        message: format!("status {}: {}", status, truncate(body.trim(), MAX_ERROR_BODY)),
    })
}

pub fn parse_json<T: DeserializeOwned>(service: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ScribeError::Http {
        service: service.to_string(),
        message: format!("Failed to parse response: {}", e),
    })
}

pub fn read_json<T: DeserializeOwned>(service: &str, response: Response) -> Result<T> {
    let body = response.text().map_err(|e| ScribeError::Http {
        service: service.to_string(),
        message: format!("Failed to read response: {}", e),
    })?;
    parse_json(service, &body)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
