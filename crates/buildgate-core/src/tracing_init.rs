//! Tracing/logging initialization.
//!
//! Installs `tracing_subscriber` with an env-filter and optional JSON output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global tracing subscriber.
///
/// * `default_filter` -- used when `RUST_LOG` is not set
///   (e.g. `"buildgate_api=info"`).
/// * `log_json` -- emit structured JSON log lines instead of the
///   human-readable format.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Like [`init_tracing`], additionally exporting spans over OTLP when an
/// endpoint is given. The returned guard must outlive the process' work.
#[cfg(feature = "metrics")]
pub fn init_tracing_with_metrics(
    default_filter: &str,
    log_json: bool,
    endpoint: Option<&str>,
) -> Result<Option<crate::metrics::MetricsGuard>, crate::metrics::MetricsError> {
    let guard = endpoint.map(crate::metrics::init_metrics).transpose()?;
    let otel = guard
        .as_ref()
        .map(|g| tracing_opentelemetry::layer().with_tracer(g.tracer()));
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(env_filter).with(otel);
    if log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    Ok(guard)
}

/// Default filter for a binary: its own crate at `level`, everything else at
/// `warn`.
pub fn default_filter(crate_name: &str, level: &str) -> String {
    format!("warn,{}={level},buildgate_core={level}", crate_name.replace('-', "_"))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_normalises_crate_name() {
        assert_eq!(
            default_filter("buildgate-api", "debug"),
            "warn,buildgate_api=debug,buildgate_core=debug"
        );
    }
}
