// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the dotCloud management API.
//!
//! One [`ApiClient`] wraps a `reqwest::Client`, which keeps the underlying
//! connections pooled between sequential requests. Dropping the client closes
//! them.
//!
//! The base URL may carry a path prefix (`https://proxy/api`). Request paths
//! are appended to it, and [`request_target`] gives the path and query exactly
//! as they appear in the request line, which is what gets signed.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode, Url};

use crate::config::PluginConfig;
use crate::error::FetchError;

/// Advisory header the API uses to push notices to CLI users.
pub const INFO_HEADER: &str = "X-DotCloud-Info";

/// Additional options governing how the HTTP client is constructed.
#[derive(Debug, Clone, Copy)]
pub struct HttpClientOptions {
    /// Whether plaintext (HTTP) endpoints are allowed.
    pub allow_plaintext: bool,
    /// Upper bound on a whole request, connect to last body byte.
    pub timeout: Duration,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            allow_plaintext: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&PluginConfig> for HttpClientOptions {
    fn from(config: &PluginConfig) -> Self {
        Self {
            allow_plaintext: config.allow_plaintext,
            timeout: config.timeout,
        }
    }
}

/// A fully read API response.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Value of [`INFO_HEADER`], when the API sent one.
    pub info: Option<String>,
    pub body: String,
}

/// Parses an API base URL: `http` or `https`, optionally with a path, never
/// with a query or fragment.
pub fn parse_base_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| FetchError::InvalidUrl(format!("{raw}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "{raw}: unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(FetchError::InvalidUrl(format!(
            "{raw}: query and fragment are not allowed"
        )));
    }
    Ok(url)
}

/// Appends `path_and_query` to the path of `base`.
pub fn join_url(base: &Url, path_and_query: &str) -> Result<Url, FetchError> {
    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path_and_query);
    Url::parse(&joined).map_err(|err| FetchError::InvalidUrl(format!("{joined}: {err}")))
}

/// Path and query of `url` as sent in the request line.
pub fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, options: HttpClientOptions) -> Result<Self, FetchError> {
        let base_url = parse_base_url(base_url)?;
        // Credentials travel in headers, so plaintext needs an explicit opt-in.
        if !options.allow_plaintext && base_url.scheme() == "http" {
            return Err(FetchError::InsecureUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .use_rustls_tls()
            .timeout(options.timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends `GET url` and buffers the body.
    ///
    /// Non-success statuses are returned as-is: the API reports failures in
    /// the JSON body, which the caller inspects.
    pub async fn get(&self, url: Url, headers: HeaderMap) -> Result<ApiResponse, FetchError> {
        tracing::debug!(
            method = "GET",
            url = %url,
            headers = ?redact_headers(&headers),
            "dotcloud API request"
        );

        let response = self.client.get(url.clone()).headers(headers).send().await?;

        let status = response.status();
        let info = response
            .headers()
            .get(INFO_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                // the response, and its connection, are dropped here
                tracing::debug!(
                    url = %url,
                    status = %status,
                    "Discarding unreadable response: {err}"
                );
                return Err(err.into());
            }
        };

        tracing::debug!(
            method = "GET",
            url = %url,
            status = %status,
            body_len = body.len(),
            "dotcloud API response"
        );

        Ok(ApiResponse { status, info, body })
    }
}

/// Returns a redacted view of request headers suitable for debug logging.
fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    const SENSITIVE_HEADERS: [&str; 2] = ["x-dotcloud-authorization", "x-dotcloud-access-key"];

    headers
        .iter()
        .map(|(name, value)| {
            let lower = name.as_str().to_ascii_lowercase();
            let display = if SENSITIVE_HEADERS.contains(&lower.as_str()) {
                "<redacted>".to_string()
            } else {
                value
                    .to_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| "<non-utf8>".to_string())
            };
            (lower, display)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn http_client_rejects_insecure_url_without_opt_in() {
        let err = ApiClient::new("http://api.dotcloud.com", HttpClientOptions::default())
            .expect_err("insecure transport should fail");
        assert!(matches!(err, FetchError::InsecureUrl(_)));
    }

    #[test]
    fn http_client_accepts_plaintext_with_opt_in() {
        let client = ApiClient::new(
            "http://127.0.0.1:3333/",
            HttpClientOptions {
                allow_plaintext: true,
                ..Default::default()
            },
        )
        .expect("plaintext should be allowed");
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:3333/");
    }

    #[test]
    fn http_client_rejects_insecure_url_regardless_of_case() {
        let err = ApiClient::new("HTTP://api.dotcloud.com", HttpClientOptions::default())
            .expect_err("insecure transport should fail");
        assert!(matches!(err, FetchError::InsecureUrl(_)));
    }

    #[test]
    fn parse_base_url_rejects_unusable_urls() {
        for raw in [
            "api.dotcloud.com",
            "ftp://api.dotcloud.com",
            "https://api.dotcloud.com/?region=eu",
            "https://api.dotcloud.com/#top",
        ] {
            assert!(
                matches!(parse_base_url(raw), Err(FetchError::InvalidUrl(_))),
                "{raw} should be rejected"
            );
        }
        assert!(parse_base_url("https://proxy.internal/api").is_ok());
    }

    #[test]
    fn request_target_at_root() {
        let base = parse_base_url("https://api.dotcloud.com").unwrap();
        let url = join_url(&base, "/run?q=%5B%22info%22%5D").unwrap();
        assert_eq!(url.as_str(), "https://api.dotcloud.com/run?q=%5B%22info%22%5D");
        assert_eq!(request_target(&url), "/run?q=%5B%22info%22%5D");
    }

    #[test]
    fn request_target_keeps_base_path() {
        for raw in ["https://proxy.internal/api", "https://proxy.internal/api/"] {
            let base = parse_base_url(raw).unwrap();
            let url = join_url(&base, "/run?q=%5B%22info%22%2C%20%22p.web%22%5D").unwrap();
            assert_eq!(
                request_target(&url),
                "/api/run?q=%5B%22info%22%2C%20%22p.web%22%5D"
            );
        }
    }

    #[test]
    fn request_target_without_query() {
        let base = parse_base_url("https://api.dotcloud.com/v1").unwrap();
        let url = join_url(&base, "/status").unwrap();
        assert_eq!(request_target(&url), "/v1/status");
    }

    #[test]
    fn options_follow_plugin_config() {
        let config = PluginConfig {
            allow_plaintext: true,
            timeout: Duration::from_secs(7),
            ..Default::default()
        };
        let options = HttpClientOptions::from(&config);
        assert!(options.allow_plaintext);
        assert_eq!(options.timeout, Duration::from_secs(7));
    }

    #[test]
    fn redact_headers_hides_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert("X-DotCloud-Access-Key", HeaderValue::from_static("access"));
        headers.insert("X-DotCloud-Authorization", HeaderValue::from_static("abcdef"));
        headers.insert("X-DotCloud-Version", HeaderValue::from_static("0.4.3"));

        let redacted = redact_headers(&headers);
        assert!(redacted.contains(&(
            "x-dotcloud-access-key".to_string(),
            "<redacted>".to_string()
        )));
        assert!(redacted.contains(&(
            "x-dotcloud-authorization".to_string(),
            "<redacted>".to_string()
        )));
        assert!(redacted.contains(&("x-dotcloud-version".to_string(), "0.4.3".to_string())));
    }
}
