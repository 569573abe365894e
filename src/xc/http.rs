//! HTTP utilities for F5 XC REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..MAX_LOG_BODY_LENGTH],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for XC API calls
#[derive(Clone)]
pub struct XcHttpClient {
    client: Client,
}

impl XcHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("xcsites/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request against an XC API endpoint.
    ///
    /// The token goes into the `Authorization: APIToken <token>` header
    /// the XC console expects. Authentication failures are logged at
    /// error severity, everything else at warn.
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("content-type", "application/json")
            .header("Authorization", format!("APIToken {}", token))
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Only log the sanitized/truncated body to avoid leaking sensitive data
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                tracing::error!("auth failed for {}: {} - {}", url, status, sanitize_for_log(&body));
            } else {
                tracing::warn!("get failed for {} with {}", url, status);
            }
            return Err(anyhow::anyhow!("API request failed: {}", status));
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format an API error for display
/// Sanitizes error messages to avoid leaking token or tenant details
pub fn format_api_error(error: &anyhow::Error) -> String {
    let error_str = format!("{:#}", error);

    if error_str.contains("403") {
        return "Permission denied. Check the API token's namespace roles.".to_string();
    }
    if error_str.contains("401") {
        return "Authentication failed. Check F5XC_API_TOKEN.".to_string();
    }
    if error_str.contains("404") {
        return "Resource not found.".to_string();
    }
    if error_str.contains("429") {
        return "Rate limit exceeded. Please try again later.".to_string();
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "XC service temporarily unavailable. Please try again.".to_string();
    }

    if error_str.contains("API request failed") {
        return "Request failed. Check your network connection and try again.".to_string();
    }

    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let out = sanitize_for_log(&body);
        assert!(out.contains("truncated, 500 bytes total"));
    }

    #[test]
    fn sanitize_strips_control_chars() {
        let out = sanitize_for_log("ok\x07\nvalue");
        assert_eq!(out, "okvalue");
    }

    #[test]
    fn format_error_maps_auth_status() {
        let err = anyhow::anyhow!("API request failed: 401 Unauthorized");
        assert!(format_api_error(&err).contains("F5XC_API_TOKEN"));
    }
}
