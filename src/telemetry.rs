// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Logging and OpenTelemetry bootstrap, installed before any other
//! subsystem starts logging: `tracing-subscriber` goes in first thing
//! in `Commands::Serve`.

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::commands::Transport;
use crate::config::{Config, ExporterKind};

/// Installs `tracing-subscriber` (stderr for stdio transport, so
/// nothing interleaves with the MCP protocol on stdout; stdout
/// otherwise) plus, if configured, an OpenTelemetry tracer provider.
/// Returns a guard whose drop flushes the OTel provider; hold it for
/// the lifetime of `main`.
pub fn init(config: &Config) -> Result<TelemetryGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".to_string().into());

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.transport {
        Transport::Stdio => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_ansi(false),
                )
                .init();
        }
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    let provider = match config.telemetry.resolved_exporter() {
        ExporterKind::None => None,
        ExporterKind::Stdout => Some(
            opentelemetry_sdk::trace::TracerProvider::builder()
                .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
                .with_resource(resource(config))
                .build(),
        ),
        ExporterKind::Otlp => {
            let endpoint = config
                .telemetry
                .otlp_endpoint
                .clone()
                .context("telemetry.otlp_endpoint is required when exporter=otlp")?;
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()
                .context("failed to build OTLP span exporter")?;
            Some(
                opentelemetry_sdk::trace::TracerProvider::builder()
                    .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
                    .with_resource(resource(config))
                    .build(),
            )
        }
    };

    if let Some(provider) = &provider {
        opentelemetry::global::set_tracer_provider(provider.clone());
    }

    Ok(TelemetryGuard { provider })
}

fn resource(config: &Config) -> Resource {
    Resource::new(vec![
        KeyValue::new("service.name", config.telemetry.service_name.clone()),
        KeyValue::new("service.version", config.telemetry.service_version.clone()),
    ])
}

/// Shuts the tracer provider down (flushing pending spans) on drop.
pub struct TelemetryGuard {
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(err) = provider.shutdown() {
                tracing::warn!(%err, "failed to shut down OpenTelemetry tracer provider");
            }
        }
    }
}
