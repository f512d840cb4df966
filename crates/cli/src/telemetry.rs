//! Observability wiring.
//!
//! Installs the global `tracing` subscriber: an env filter, a JSON formatter
//! on stderr (stdout carries command output) and, when an OTLP endpoint is
//! configured, an OpenTelemetry layer exporting spans over gRPC.

use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace::TracerProvider};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogLevel;

const TRACER_NAME: &str = "mountbot";

/// Keeps the exporter alive; flush it with [`Telemetry::shutdown`] before exit.
pub struct Telemetry {
    provider: Option<TracerProvider>,
}

impl Telemetry {
    /// `RUST_LOG`, when set, takes precedence over `level`.
    pub fn init(level: LogLevel, otlp_endpoint: Option<&str>) -> anyhow::Result<Self> {
        let filter = EnvFilter::builder()
            .with_default_directive(tracing::level_filters::LevelFilter::from(level).into())
            .from_env_lossy();

        let provider = otlp_endpoint.map(tracer_provider).transpose()?;
        let otel = provider
            .as_ref()
            .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(TRACER_NAME)));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(otel)
            .try_init()
            .context("installing the tracing subscriber")?;

        if let Some(provider) = &provider {
            opentelemetry::global::set_tracer_provider(provider.clone());
        }
        Ok(Self { provider })
    }

    /// Flushes pending spans.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(err) = provider.shutdown() {
                tracing::warn!(error = %err, "trace exporter shutdown failed");
            }
        }
    }
}

fn tracer_provider(endpoint: &str) -> anyhow::Result<TracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .with_context(|| format!("building the OTLP exporter for {endpoint}"))?;
    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .build())
}
