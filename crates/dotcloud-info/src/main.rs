// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use std::process::ExitCode;

use serde_json::Value;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use dotcloud_info::{DotcloudInfo, PluginConfig, TracingLogger};

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> ExitCode {
    let log_level = env::var("DOTCLOUD_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    // stdout carries the report, logs go to stderr
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(log_filter(&log_level))
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match PluginConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error creating config on dotcloud-info startup: {e}");
            return ExitCode::FAILURE;
        }
    };

    let plugin = DotcloudInfo::new(config, Value::Null, TracingLogger, Value::Null);
    let report = match plugin.run().await {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to collect memory usage: {e}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize report: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Filter for `log_level`. Unparsable levels are dropped here and rejected by
/// `PluginConfig::from_env` once logging is up.
fn log_filter(log_level: &str) -> EnvFilter {
    EnvFilter::new(format!("h2=off,hyper=off,rustls=off,{log_level}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_keeps_level() {
        let filter = log_filter("debug").to_string();
        assert!(filter.contains("hyper=off"));
        assert!(filter.contains("debug"));
    }

    #[test]
    fn test_log_filter_tolerates_garbage() {
        let filter = log_filter("web=loud").to_string();
        assert!(filter.contains("h2=off"));
        assert!(!filter.contains("loud"));
    }
}
