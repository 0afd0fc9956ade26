//! Prometheus metrics for the session coordinator.
//!
//! This module provides metric collection for:
//! - Status emissions
//! - Raw provider events (mapped and ignored)
//! - Provider call failures
//! - Status subscribers
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed. [`MetricsExporter`] installs a Prometheus recorder.
//!
//! # Example
//!
//! ```rust,no_run
//! use composable_identity_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = MetricsExporter::new();
//! exporter.install()?;
//!
//! // Later, e.g. from an HTTP handler:
//! let body = exporter.render().unwrap_or_default();
//! # Ok(())
//! # }
//! ```

use composable_identity_core::AuthenticationStatus;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder for the coordinator metrics.
#[derive(Default)]
pub struct MetricsExporter {
    handle: Option<PrometheusHandle>,
}

impl MetricsExporter {
    /// Create an exporter that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe all metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if a recorder cannot be installed.
    ///
    /// # Note
    ///
    /// If a metrics recorder is already installed (e.g., in tests), this logs
    /// a warning and succeeds without a handle.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Prometheus metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the exporter hasn't been installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "identity_status_emitted_total",
        "Total number of authentication statuses emitted, by status"
    );
    describe_gauge!(
        "identity_status_subscribers",
        "Current number of status subscribers"
    );
    describe_counter!(
        "identity_hub_events_total",
        "Total number of raw provider events received, by event and whether they mapped to a status"
    );
    describe_counter!(
        "identity_provider_failures_total",
        "Total number of failed provider calls, by operation"
    );
}

/// Status notifier metrics recorder.
pub struct StatusMetrics;

impl StatusMetrics {
    /// Record one emission.
    pub fn record_emitted(status: AuthenticationStatus) {
        counter!("identity_status_emitted_total", "status" => status.as_str()).increment(1);
    }

    /// Record the current subscriber count.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_subscribers(count: usize) {
        gauge!("identity_status_subscribers").set(count as f64);
    }
}

/// Session coordinator metrics recorder.
pub struct CoordinatorMetrics;

impl CoordinatorMetrics {
    /// Record a raw provider event.
    pub fn record_hub_event(event: &str, mapped: bool) {
        counter!(
            "identity_hub_events_total",
            "event" => event.to_string(),
            "mapped" => if mapped { "true" } else { "false" }
        )
        .increment(1);
    }

    /// Record a failed provider call.
    pub fn record_failure(operation: &'static str) {
        counter!("identity_provider_failures_total", "operation" => operation).increment(1);
    }
}
