// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use dotcloud_info::{DotcloudInfo, PluginConfig, PluginLogger};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Captures what the host agent would log
#[derive(Default)]
pub struct RecordingLogger {
    errors: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl PluginLogger for RecordingLogger {
    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

/// A home directory holding `dotcloud.conf` and `environment.json`
pub struct Home {
    dir: TempDir,
}

impl Home {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn user_config_path(&self) -> PathBuf {
        self.dir.path().join("dotcloud.conf")
    }

    pub fn environment_path(&self) -> PathBuf {
        self.dir.path().join("environment.json")
    }

    pub fn with_user_config(self, apikey: &str) -> Self {
        let config = json!({ "url": "https://api.dotcloud.com/", "apikey": apikey });
        fs::write(self.user_config_path(), config.to_string()).expect("failed to write config");
        self
    }

    /// Writes an environment dump for `project` with one SSH URL per service
    pub fn with_services(self, project: &str, services: &[&str]) -> Self {
        let mut env = serde_json::Map::new();
        env.insert("DOTCLOUD_PROJECT".to_string(), Value::from(project));
        for service in services {
            env.insert(
                format!("DOTCLOUD_{}_SSH_URL", service.to_uppercase()),
                Value::from(format!(
                    "ssh://dotcloud@{project}-default-{service}-0.dotcloud.com:22"
                )),
            );
        }
        fs::write(self.environment_path(), Value::Object(env).to_string())
            .expect("failed to write environment");
        self
    }

    pub fn plugin(&self, api_url: &str) -> DotcloudInfo<RecordingLogger> {
        self.plugin_with(api_url, true)
    }

    pub fn plugin_with(
        &self,
        api_url: &str,
        allow_plaintext: bool,
    ) -> DotcloudInfo<RecordingLogger> {
        let settings = PluginConfig {
            user_config_path: self.user_config_path(),
            environment_path: self.environment_path(),
            api_url: api_url.to_string(),
            allow_plaintext,
            timeout: Duration::from_secs(5),
            ..Default::default()
        };
        DotcloudInfo::new(settings, Value::Null, RecordingLogger::default(), Value::Null)
    }
}

/// Body of a successful `/run` reply carrying `status`
pub fn success_body(status: &str) -> String {
    json!({ "type": "success", "data": status }).to_string()
}

/// `q` parameter expected for an info lookup, as the dotCloud CLI writes it
pub fn info_query(project: &str, service: &str) -> String {
    format!(r#"["info", "{project}.{service}"]"#)
}
