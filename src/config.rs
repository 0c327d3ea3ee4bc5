// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Configuration for the `mcprouter` binary.
//!
//! Layered with `figment`: defaults, then a TOML file, then
//! environment variables, then CLI flags, over the router's own
//! shape: transport/bind address, the skills root, profile
//! definitions, the registration worker pool size, and telemetry
//! export.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use figment::providers::{Env, Format, Serialized, Toml};
use mcprouter_core::Profile;
use serde::{Deserialize, Serialize};

use crate::commands::{Serve, Transport};

fn default_bind_address() -> String {
    "127.0.0.1:9001".to_string()
}

fn default_admin_bind_address() -> String {
    "127.0.0.1:9002".to_string()
}

fn default_worker_count() -> usize {
    2
}

/// Exporter selection for OpenTelemetry traces/metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExporterKind {
    #[default]
    None,
    Stdout,
    Otlp,
}

/// Telemetry configuration: exporter kind plus OTel resource identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub exporter: Option<ExporterKind>,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
}

fn default_service_name() -> String {
    "mcprouter".to_string()
}

fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            exporter: None,
            otlp_endpoint: None,
            service_name: default_service_name(),
            service_version: default_service_version(),
        }
    }
}

impl TelemetryConfig {
    /// Resolved exporter: an explicit choice wins; otherwise an OTLP
    /// endpoint implies `otlp`.
    pub fn resolved_exporter(&self) -> ExporterKind {
        match self.exporter {
            Some(kind) => kind,
            None if self.otlp_endpoint.is_some() => ExporterKind::Otlp,
            None => ExporterKind::None,
        }
    }
}

/// Router-wide configuration, layered from defaults, an optional TOML
/// file, and environment overrides.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// MCP transport to serve over.
    #[serde(default)]
    pub transport: Transport,

    /// Bind address for HTTP-based MCP transports (sse, streamable-http).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind address for the gRPC admin surface (`RegistrationService`,
    /// `CacheService`).
    #[serde(default = "default_admin_bind_address")]
    pub admin_bind_address: String,

    /// Root directory of skill subdirectories. Absent if
    /// skill resources are not served.
    #[serde(default)]
    pub skills_root: Option<PathBuf>,

    /// Named visibility profiles (`Profile`), loaded wholesale
    /// at startup via `SetProfiles`.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Number of `RegistrationWorker` tasks to spawn against the bus
    ///.
    #[serde(default = "default_worker_count")]
    pub registration_workers: usize,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            bind_address: default_bind_address(),
            admin_bind_address: default_admin_bind_address(),
            skills_root: None,
            profiles: HashMap::new(),
            registration_workers: default_worker_count(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Order of precedence, lowest first: built-in defaults, a TOML
    /// file (`MCPROUTER_CONFIG_FILE`, default `./mcprouter.toml`,
    /// silently skipped if absent), `MCPROUTER_*` environment
    /// variables, then the `serve` CLI flags that were actually passed.
    pub fn from_serve(serve: &Serve) -> anyhow::Result<Self> {
        let config_file_path = std::env::var_os("MCPROUTER_CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./mcprouter.toml"));

        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if config_file_path.exists() {
            figment = figment.merge(Toml::file(&config_file_path));
        }
        figment = figment
            .merge(Env::prefixed("MCPROUTER_").split("__"))
            .merge(Serialized::defaults(serve));

        figment
            .extract()
            .context("failed to assemble router configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied_with_no_file_or_env() {
        std::env::remove_var("MCPROUTER_CONFIG_FILE");
        let serve = Serve::default();
        let config = Config::from_serve(&serve).unwrap();
        assert_eq!(config.bind_address, default_bind_address());
        assert_eq!(config.registration_workers, default_worker_count());
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn otlp_endpoint_without_explicit_exporter_resolves_to_otlp() {
        let telemetry = TelemetryConfig {
            otlp_endpoint: Some("http://collector:4317".into()),
            ..TelemetryConfig::default()
        };
        assert_eq!(telemetry.resolved_exporter(), ExporterKind::Otlp);
    }

    #[test]
    fn no_endpoint_and_no_explicit_exporter_resolves_to_none() {
        assert_eq!(TelemetryConfig::default().resolved_exporter(), ExporterKind::None);
    }
}
