//! `OpenTelemetry` metrics.
//!
//! Only compiled when the `metrics` Cargo feature is enabled. Sets up the
//! OTLP exporter for traces and metrics and exposes the command counters.

use opentelemetry::metrics::Counter;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};

/// Errors that can occur during metrics / tracing pipeline initialisation.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to build OTLP exporter: {0}")]
    ExporterBuild(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("OpenTelemetry SDK error: {0}")]
    Sdk(#[from] opentelemetry_sdk::error::OTelSdkError),
}

/// Keeps the `OpenTelemetry` providers alive.
///
/// Dropping it does not flush; call [`MetricsGuard::shutdown`] before exit.
pub struct MetricsGuard {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl MetricsGuard {
    /// Tracer backing the `tracing-opentelemetry` layer.
    pub fn tracer(&self) -> SdkTracer {
        self.tracer_provider.tracer("buildgate")
    }

    pub fn shutdown(self) -> Result<(), MetricsError> {
        self.tracer_provider.shutdown()?;
        self.meter_provider.shutdown()?;
        Ok(())
    }
}

/// Initialise the OTLP pipeline for traces and metrics.
///
/// * `endpoint` -- OTLP receiver URL, e.g. `"http://localhost:4317"` (gRPC).
pub fn init_metrics(endpoint: &str) -> Result<MetricsGuard, MetricsError> {
    let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(trace_exporter)
        .build();

    global::set_tracer_provider(tracer_provider.clone());

    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let meter_provider = SdkMeterProvider::builder()
        .with_periodic_exporter(metric_exporter)
        .build();

    global::set_meter_provider(meter_provider.clone());

    Ok(MetricsGuard {
        tracer_provider,
        meter_provider,
    })
}

/// Accepted/rejected counters, labelled by command and error kind.
#[derive(Clone)]
pub struct CommandMetrics {
    accepted: Counter<u64>,
    rejected: Counter<u64>,
}

impl CommandMetrics {
    pub fn new() -> Self {
        let meter = global::meter("buildgate");
        Self {
            accepted: meter.u64_counter("commands_accepted").build(),
            rejected: meter.u64_counter("commands_rejected").build(),
        }
    }

    pub fn accepted(&self, command: &'static str) {
        self.accepted.add(1, &[KeyValue::new("command", command)]);
    }

    pub fn rejected(&self, command: &'static str, error_type: &'static str) {
        self.rejected.add(
            1,
            &[
                KeyValue::new("command", command),
                KeyValue::new("error_type", error_type),
            ],
        );
    }
}

impl Default for CommandMetrics {
    fn default() -> Self {
        Self::new()
    }
}
