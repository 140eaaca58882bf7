// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};

use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::debug;

use crate::config::PluginConfig;
use crate::discovery::ServiceDiscovery;
use crate::error::ReportError;
use crate::fetcher::{StatusFetcher, StatusInfo};
use crate::logger::PluginLogger;
use crate::signer::RequestSigner;
use crate::store::{ConfigStore, Credentials};

/// Metric name to value, one entry per discovered service.
pub type MetricReport = BTreeMap<String, i64>;

/// Key under which a service's memory usage is reported.
pub fn metric_name(service: &str) -> String {
    let mut chars = service.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("Memory usage in % ({capitalized})")
}

/// The plugin instance the host agent constructs and polls.
///
/// `agent_config` and `raw_config` are the host's own configuration objects.
/// They are kept for the host's benefit and not interpreted here.
pub struct DotcloudInfo<L: PluginLogger> {
    settings: PluginConfig,
    store: ConfigStore,
    fetcher: StatusFetcher,
    logger: L,
    agent_config: Value,
    raw_config: Value,
}

impl<L: PluginLogger> DotcloudInfo<L> {
    pub fn new(
        settings: PluginConfig,
        agent_config: Value,
        logger: L,
        raw_config: Value,
    ) -> Self {
        Self {
            store: ConfigStore::from_config(&settings),
            fetcher: StatusFetcher::new(&settings),
            settings,
            logger,
            agent_config,
            raw_config,
        }
    }

    pub fn settings(&self) -> &PluginConfig {
        &self.settings
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    pub fn agent_config(&self) -> &Value {
        &self.agent_config
    }

    pub fn raw_config(&self) -> &Value {
        &self.raw_config
    }

    pub fn load_user_config(&self) -> Option<Credentials> {
        self.store.load_user_config(&self.logger)
    }

    pub fn sign_request(&self, method: &str, path: &str) -> HeaderMap {
        RequestSigner::new(&self.store, &self.logger).sign(method, path)
    }

    pub fn project_name(&self) -> String {
        ServiceDiscovery::new(&self.store).project_name()
    }

    pub fn list_services(&self) -> BTreeSet<String> {
        ServiceDiscovery::new(&self.store).list_services()
    }

    pub async fn fetch(&self, service: &str) -> Option<StatusInfo> {
        self.fetcher.fetch(service, &self.logger).await
    }

    /// Collects the memory usage of every service. A service whose status
    /// could not be read is reported as 0.
    pub async fn run(&self) -> Result<MetricReport, ReportError> {
        let mut report = MetricReport::new();
        for service in self.list_services() {
            let usage = match self.fetch(&service).await {
                Some(status) => {
                    status
                        .usage
                        .parse::<i64>()
                        .map_err(|source| ReportError::Format {
                            service: service.clone(),
                            source,
                        })?
                }
                None => 0,
            };
            report.insert(metric_name(&service), usage);
        }

        debug!("Collected memory usage for {} services", report.len());
        Ok(report)
    }
}
