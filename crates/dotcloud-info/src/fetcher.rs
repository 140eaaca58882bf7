// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-service status lookup.
//!
//! The management API runs CLI commands remotely: `GET /run?q=<json>` where
//! `<json>` is the percent-encoded argument vector, here `["info",
//! "<project>.<service>"]`, serialized the way the dotCloud CLI does: `", "`
//! between items and non-ASCII escaped as `\uXXXX`. A successful reply is
//! `{"type": "success", "data": "<status text>"}` and the status text carries a
//! line such as `memory: 512MB/1024MB (50%)`.

use std::fmt::Write;
use std::sync::OnceLock;

use regex::Regex;
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::PluginConfig;
use crate::discovery::ServiceDiscovery;
use crate::error::FetchError;
use crate::http::{self, ApiClient, HttpClientOptions};
use crate::logger::PluginLogger;
use crate::signer::RequestSigner;
use crate::store::ConfigStore;

pub const VERSION_HEADER: &str = "X-DotCloud-Version";
const RUN_PATH: &str = "/run?q=";
const INFO_COMMAND: &str = "info";

/// Fields extracted from a service's status text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    /// Memory usage percentage, as the digits found in the status text.
    pub usage: String,
}

fn status_pattern() -> &'static Regex {
    static STATUS_PATTERN: OnceLock<Regex> = OnceLock::new();
    // At least one non-empty line, then a `memory:` line ending its usage with `(<digits>%)`.
    #[allow(clippy::unwrap_used)]
    STATUS_PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[^\r\n]+\r?\n)+memory:[^\r\n]*\((?P<usage>[0-9]+)%\)").unwrap()
    })
}

/// Pulls the memory usage digits out of a status blob.
pub fn extract_usage(text: &str) -> Option<String> {
    status_pattern()
        .captures(text)
        .and_then(|caps| caps.name("usage"))
        .map(|usage| usage.as_str().to_string())
}

/// JSON string literal with every non-ASCII character escaped.
fn ascii_json_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for c in Value::from(text).to_string().chars() {
        if c.is_ascii() && c != '\x7f' {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{unit:04x}");
            }
        }
    }
    out
}

/// Request path running `info <project>.<service>` on the API.
pub fn command_path(project: &str, service: &str) -> String {
    let command = format!(
        "[{}, {}]",
        ascii_json_string(INFO_COMMAND),
        ascii_json_string(&format!("{project}.{service}"))
    );
    format!("{RUN_PATH}{}", urlencoding::encode(&command))
}

/// Inverse of [`command_path`].
pub fn decode_command(path: &str) -> Option<Vec<String>> {
    let encoded = path.strip_prefix(RUN_PATH)?;
    let json = urlencoding::decode(encoded).ok()?;
    serde_json::from_str(&json).ok()
}

/// Returns the `data` text of a successful `/run` reply.
pub fn success_data(status: StatusCode, body: &str) -> Result<String, FetchError> {
    let unexpected = |reason: String| FetchError::UnexpectedResponse {
        status: status.as_u16(),
        reason,
    };

    let value: Value = serde_json::from_str(body)?;
    let Some(reply) = value.as_object() else {
        return Err(unexpected("body is not a JSON object".to_string()));
    };

    match reply.get("type").and_then(Value::as_str) {
        Some("success") => {}
        Some(other) => return Err(unexpected(format!("type is '{other}'"))),
        None => return Err(unexpected("missing 'type'".to_string())),
    }

    match reply.get("data") {
        Some(Value::String(data)) if !data.is_empty() => Ok(data.clone()),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            Err(unexpected("empty 'data'".to_string()))
        }
        Some(_) => Err(unexpected("'data' is not text".to_string())),
    }
}

/// Queries the API for service status. Holds the API client, opened on first
/// use and reused by later lookups.
#[derive(Debug)]
pub struct StatusFetcher {
    store: ConfigStore,
    api_url: String,
    options: HttpClientOptions,
    client_version: String,
    api: OnceCell<ApiClient>,
}

impl StatusFetcher {
    pub fn new(config: &PluginConfig) -> Self {
        Self {
            store: ConfigStore::from_config(config),
            api_url: config.api_url.clone(),
            options: HttpClientOptions::from(config),
            client_version: config.client_version.clone(),
            api: OnceCell::new(),
        }
    }

    async fn api(&self) -> Result<&ApiClient, FetchError> {
        self.api
            .get_or_try_init(|| async { ApiClient::new(self.api_url.as_str(), self.options) })
            .await
    }

    /// Memory usage of `service`, or `None` on any failure. Failures are
    /// reported through `logger` and never propagate.
    pub async fn fetch(&self, service: &str, logger: &dyn PluginLogger) -> Option<StatusInfo> {
        match self.try_fetch(service, logger).await {
            Ok(status) => Some(status),
            // already reported while loading the user config
            Err(FetchError::NotConfigured) => None,
            Err(FetchError::PatternMismatch) => {
                debug!("No memory usage in status of service {service}");
                None
            }
            Err(err @ FetchError::UnexpectedResponse { .. }) => {
                warn!("Status request for service {service} failed: {err}");
                None
            }
            Err(err) => {
                logger.error(&err.to_string());
                None
            }
        }
    }

    /// Same lookup as [`StatusFetcher::fetch`], keeping the failure reason.
    pub async fn try_fetch(
        &self,
        service: &str,
        logger: &dyn PluginLogger,
    ) -> Result<StatusInfo, FetchError> {
        let project = ServiceDiscovery::new(&self.store).project_name();
        let base_url = http::parse_base_url(&self.api_url)?;
        let url = http::join_url(&base_url, &command_path(&project, service))?;

        let mut headers =
            RequestSigner::new(&self.store, logger).sign("GET", &http::request_target(&url));
        if headers.is_empty() {
            return Err(FetchError::NotConfigured);
        }
        let user_agent = format!("dotcloud/cli (version: {})", self.client_version);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent)
                .map_err(|_| FetchError::InvalidHeader("User-Agent"))?,
        );
        headers.insert(
            VERSION_HEADER,
            HeaderValue::from_str(&self.client_version)
                .map_err(|_| FetchError::InvalidHeader(VERSION_HEADER))?,
        );

        let response = self.api().await?.get(url, headers).await?;
        if let Some(info) = &response.info {
            logger.warning(&info.replace(';', "\n"));
        }

        let data = success_data(response.status, &response.body)?;
        extract_usage(&data)
            .map(|usage| StatusInfo { usage })
            .ok_or(FetchError::PatternMismatch)
    }
}
