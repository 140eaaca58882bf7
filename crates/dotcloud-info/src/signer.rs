// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HMAC request signing for the dotCloud management API.
//!
//! The API authenticates a request by the HMAC-SHA1 of `method:path:date`
//! keyed by the secret half of the user's API key. `path` is signed exactly as
//! it goes on the wire, query string and percent-encoding included.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use sha1::Sha1;

use crate::logger::PluginLogger;
use crate::store::{ConfigStore, Credentials};

pub const ACCESS_KEY_HEADER: &str = "X-DotCloud-Access-Key";
pub const AUTH_VERSION_HEADER: &str = "X-DotCloud-Auth-Version";
pub const DATE_HEADER: &str = "X-DotCloud-Date";
pub const AUTHORIZATION_HEADER: &str = "X-DotCloud-Authorization";
pub const AUTH_VERSION: &str = "1.0";

const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

type HmacSha1 = Hmac<Sha1>;

/// Formats `at` the way the API expects in `X-DotCloud-Date`.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Lowercase hex HMAC-SHA1 of `method:path:date` keyed by `secret_key`.
pub fn signature(secret_key: &str, method: &str, path: &str, date: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    #[allow(clippy::expect_used)]
    let mut mac =
        HmacSha1::new_from_slice(secret_key.as_bytes()).expect("HMAC takes any key size");
    mac.update(method.as_bytes());
    mac.update(b":");
    mac.update(path.as_bytes());
    mac.update(b":");
    mac.update(date.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Builds the four authentication headers for `credentials` at a given date.
///
/// Returns `None` when a credential contains bytes that are not valid in an
/// HTTP header value.
pub fn signed_headers(
    credentials: &Credentials,
    method: &str,
    path: &str,
    date: &str,
) -> Option<HeaderMap> {
    let sign = signature(&credentials.secret_key, method, path, date);

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCESS_KEY_HEADER,
        HeaderValue::from_str(&credentials.access_key).ok()?,
    );
    headers.insert(AUTH_VERSION_HEADER, HeaderValue::from_static(AUTH_VERSION));
    headers.insert(DATE_HEADER, HeaderValue::from_str(date).ok()?);
    headers.insert(AUTHORIZATION_HEADER, HeaderValue::from_str(&sign).ok()?);
    Some(headers)
}

/// Signs requests with credentials freshly read from the user config.
pub struct RequestSigner<'a> {
    store: &'a ConfigStore,
    logger: &'a dyn PluginLogger,
}

impl<'a> RequestSigner<'a> {
    pub fn new(store: &'a ConfigStore, logger: &'a dyn PluginLogger) -> Self {
        Self { store, logger }
    }

    /// Authentication headers for `method` on `path`, or an empty map when the
    /// user config is missing or invalid.
    pub fn sign(&self, method: &str, path: &str) -> HeaderMap {
        let Some(credentials) = self.store.load_user_config(self.logger) else {
            return HeaderMap::new();
        };
        let date = format_date(Utc::now());
        match signed_headers(&credentials, method, path, &date) {
            Some(headers) => headers,
            None => {
                self.logger
                    .error("Configuration file not valid. Please copy it over here.");
                HeaderMap::new()
            }
        }
    }
}
