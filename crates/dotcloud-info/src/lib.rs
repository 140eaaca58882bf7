// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Monitoring agent plugin reporting the memory usage of every service of a
//! dotCloud project.
//!
//! [`DotcloudInfo::run`] discovers services from the environment dump, asks
//! the management API for each one's status and returns one
//! `"Memory usage in % (<Service>)"` entry per service.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod logger;
pub mod reporter;
pub mod signer;
pub mod store;

pub use config::PluginConfig;
pub use error::{ConfigError, FetchError, ReportError};
pub use fetcher::StatusInfo;
pub use logger::{PluginLogger, TracingLogger};
pub use reporter::{metric_name, DotcloudInfo, MetricReport};
pub use store::Credentials;
