// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::num::ParseIntError;
use std::path::PathBuf;

/// Errors raised while loading on-disk documents or plugin settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Reasons a single service status lookup produced no usage value
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("dotCloud credentials are not configured")]
    NotConfigured,

    #[error("invalid API url: {0}")]
    InvalidUrl(String),

    #[error("insecure base url requires explicit opt-in: {0}")]
    InsecureUrl(String),

    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected response (status {status}): {reason}")]
    UnexpectedResponse { status: u16, reason: String },

    #[error("status text did not contain a memory usage line")]
    PatternMismatch,
}

/// Errors that abort a whole report cycle
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("memory usage for service '{service}' is not an integer: {source}")]
    Format {
        service: String,
        #[source]
        source: ParseIntError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ConfigError::Invalid("DOTCLOUD_API_URL cannot be empty".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid configuration: DOTCLOUD_API_URL cannot be empty"
        );

        let error = FetchError::UnexpectedResponse {
            status: 500,
            reason: "type is 'error'".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "unexpected response (status 500): type is 'error'"
        );
    }

    #[test]
    fn test_format_error_names_service() {
        let source = "12a".parse::<i64>().unwrap_err();
        let error = ReportError::Format {
            service: "web".to_string(),
            source,
        };
        assert!(error.to_string().starts_with("memory usage for service 'web'"));
    }

    #[test]
    fn test_load_error_keeps_path() {
        let error = ConfigError::Load {
            path: PathBuf::from("/nonexistent/dotcloud.conf"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("Load"));
        assert!(error.to_string().contains("/nonexistent/dotcloud.conf"));
    }
}
