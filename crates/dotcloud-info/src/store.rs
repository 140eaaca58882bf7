// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! On-disk documents read by the plugin: the dotCloud CLI user config and the
//! environment dump. Both are flat JSON objects without schema versioning.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::config::PluginConfig;
use crate::error::ConfigError;
use crate::logger::PluginLogger;

/// A loaded JSON object, keyed by field name.
pub type Document = serde_json::Map<String, Value>;

/// Reads `path` as a JSON object. Blank files and a literal `null` are empty documents.
pub fn load_document(path: &Path) -> Result<Document, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Document::new());
    }

    let value: Value = serde_json::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    match value {
        Value::Null => Ok(Document::new()),
        Value::Object(map) => Ok(map),
        other => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Fields of `dotcloud.conf` the plugin cares about.
#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub url: Option<String>,
    pub apikey: Option<String>,
}

impl UserConfig {
    /// Checks required fields and splits the API key into its two halves.
    pub fn into_credentials(self) -> Result<Credentials, ConfigError> {
        let (Some(url), Some(apikey)) = (self.url, self.apikey) else {
            return Err(ConfigError::Invalid(
                "both 'url' and 'apikey' are required".to_string(),
            ));
        };
        let Some((access_key, secret_key)) = apikey.split_once(':') else {
            return Err(ConfigError::Invalid(
                "'apikey' must be formatted as <access>:<secret>".to_string(),
            ));
        };
        Ok(Credentials {
            url,
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
        })
    }
}

/// Validated API credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Locations of the two documents. Every accessor re-reads from disk so edits
/// are picked up on the next call.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    user_config_path: PathBuf,
    environment_path: PathBuf,
}

impl ConfigStore {
    pub fn new(user_config_path: impl Into<PathBuf>, environment_path: impl Into<PathBuf>) -> Self {
        Self {
            user_config_path: user_config_path.into(),
            environment_path: environment_path.into(),
        }
    }

    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(&config.user_config_path, &config.environment_path)
    }

    pub fn user_config_path(&self) -> &Path {
        &self.user_config_path
    }

    pub fn environment_path(&self) -> &Path {
        &self.environment_path
    }

    /// Loads and validates the user config, reporting problems through `logger`.
    pub fn load_user_config(&self, logger: &dyn PluginLogger) -> Option<Credentials> {
        let path = &self.user_config_path;
        let document = match load_document(path) {
            Ok(document) => document,
            Err(ConfigError::Load { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                logger.error(&format!("Error: {} does not exist.", path.display()));
                return None;
            }
            Err(err) => {
                logger.error(&err.to_string());
                return None;
            }
        };

        let credentials = serde_json::from_value::<UserConfig>(Value::Object(document))
            .map_err(|err| ConfigError::Invalid(err.to_string()))
            .and_then(UserConfig::into_credentials);
        match credentials {
            Ok(credentials) => Some(credentials),
            Err(err) => {
                tracing::debug!("Rejected {}: {err}", path.display());
                logger.error("Configuration file not valid. Please copy it over here.");
                None
            }
        }
    }

    /// Loads the environment dump.
    pub fn load_environment(&self) -> Result<Document, ConfigError> {
        load_document(&self.environment_path)
    }
}
