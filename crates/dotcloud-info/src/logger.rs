// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Logger collaborator handed to the plugin by the host agent.
//!
//! The host agent owns the user-visible log: configuration problems and failed
//! lookups are reported through [`PluginLogger::error`], advisory notices sent
//! by the API through [`PluginLogger::warning`]. Internal diagnostics stay on
//! `tracing`.
//!
//! ```rust,ignore
//! use dotcloud_info::{DotcloudInfo, PluginConfig, TracingLogger};
//! use serde_json::Value;
//!
//! let plugin = DotcloudInfo::new(PluginConfig::from_env()?, Value::Null, TracingLogger, Value::Null);
//! ```

/// Minimal logging surface expected from the host agent.
pub trait PluginLogger: Send + Sync {
    fn error(&self, message: &str);
    fn warning(&self, message: &str);
}

/// Forwards plugin messages to the global `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl PluginLogger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

impl<L: PluginLogger + ?Sized> PluginLogger for &L {
    fn error(&self, message: &str) {
        (**self).error(message);
    }

    fn warning(&self, message: &str) {
        (**self).warning(message);
    }
}
