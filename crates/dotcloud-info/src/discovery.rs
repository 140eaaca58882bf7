// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::store::{ConfigStore, Document};

const PROJECT_KEY: &str = "DOTCLOUD_PROJECT";

fn ssh_url_key() -> &'static Regex {
    static SSH_URL_KEY: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)]
    SSH_URL_KEY.get_or_init(|| Regex::new(r"^DOTCLOUD_(?P<service>.+)_SSH_URL$").unwrap())
}

/// Finds the project and its services in the environment dump.
pub struct ServiceDiscovery<'a> {
    store: &'a ConfigStore,
}

impl<'a> ServiceDiscovery<'a> {
    pub fn new(store: &'a ConfigStore) -> Self {
        Self { store }
    }

    /// Value of `DOTCLOUD_PROJECT`, or an empty string when it cannot be read.
    pub fn project_name(&self) -> String {
        self.environment()
            .and_then(|env| project_from(&env))
            .unwrap_or_default()
    }

    /// Lowercased names of every `DOTCLOUD_<NAME>_SSH_URL` key.
    pub fn list_services(&self) -> BTreeSet<String> {
        self.environment()
            .map(|env| services_from(&env))
            .unwrap_or_default()
    }

    fn environment(&self) -> Option<Document> {
        match self.store.load_environment() {
            Ok(env) => Some(env),
            Err(err) => {
                debug!("No environment descriptor available: {err}");
                None
            }
        }
    }
}

fn project_from(env: &Document) -> Option<String> {
    env.get(PROJECT_KEY)
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

fn services_from(env: &Document) -> BTreeSet<String> {
    env.keys()
        .filter_map(|key| ssh_url_key().captures(key))
        .filter_map(|caps| caps.name("service"))
        .map(|service| service.as_str().to_lowercase())
        .collect()
}
