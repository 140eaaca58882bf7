// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::ConfigError;
use crate::http::parse_base_url;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.dotcloud.com";
pub const DEFAULT_CLIENT_VERSION: &str = "0.4.3";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Runtime settings of the plugin (where to find its documents and how to reach the API)
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Path of the dotCloud CLI config holding `url` and `apikey`
    pub user_config_path: PathBuf,
    /// Path of the environment dump written on dotCloud hosts
    pub environment_path: PathBuf,
    /// Scheme and host of the management API
    pub api_url: String,
    /// Whether `http://` API URLs are accepted
    pub allow_plaintext: bool,
    /// Per-request timeout
    pub timeout: Duration,
    /// Client version advertised in `User-Agent` and `X-DotCloud-Version`
    pub client_version: String,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_default();
        Self {
            user_config_path: home.join(".dotcloud").join("dotcloud.conf"),
            environment_path: home.join("environment.json"),
            api_url: DEFAULT_API_URL.to_string(),
            allow_plaintext: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            client_version: DEFAULT_CLIENT_VERSION.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl PluginConfig {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let user_config_path = env::var("DOTCLOUD_CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.user_config_path);
        let environment_path = env::var("DOTCLOUD_ENVIRONMENT_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.environment_path);
        let api_url = env::var("DOTCLOUD_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        let allow_plaintext = env::var("DOTCLOUD_ALLOW_PLAINTEXT")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(false);
        let timeout = match env::var("DOTCLOUD_TIMEOUT_SECS") {
            Ok(val) => val.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| {
                ConfigError::Invalid(format!(
                    "DOTCLOUD_TIMEOUT_SECS must be a whole number of seconds, got '{val}'"
                ))
            })?,
            Err(_) => defaults.timeout,
        };
        let client_version =
            env::var("DOTCLOUD_CLIENT_VERSION").unwrap_or(defaults.client_version);
        let log_level = env::var("DOTCLOUD_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or(defaults.log_level);

        let config = Self {
            user_config_path,
            environment_path,
            api_url,
            allow_plaintext,
            timeout,
            client_version,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "DOTCLOUD_API_URL cannot be empty".to_string(),
            ));
        }

        if let Err(err) = parse_base_url(&self.api_url) {
            return Err(ConfigError::Invalid(format!("DOTCLOUD_API_URL: {err}")));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "DOTCLOUD_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.client_version.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "DOTCLOUD_CLIENT_VERSION cannot be empty".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}
