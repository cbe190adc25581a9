//! Observability infrastructure for the recommendation applier
//!
//! Provides:
//! - Prometheus metrics (patches applied, failures by reason, patch latency)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for patch latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ApplierMetricsInner> = OnceLock::new();

struct ApplierMetricsInner {
    recommendations_loaded: IntGauge,
    patches_applied: IntCounter,
    patch_failures: IntCounterVec,
    patch_latency_seconds: Histogram,
}

impl ApplierMetricsInner {
    fn new() -> Self {
        Self {
            recommendations_loaded: register_int_gauge!(
                "rec_applier_recommendations_loaded",
                "Number of recommendations in the current batch"
            )
            .expect("Failed to register recommendations_loaded"),

            patches_applied: register_int_counter!(
                "rec_applier_patches_applied_total",
                "Total number of pod resource patches accepted by the API server"
            )
            .expect("Failed to register patches_applied"),

            patch_failures: register_int_counter_vec!(
                "rec_applier_patch_failures_total",
                "Total number of items that could not be patched, by reason",
                &["reason"]
            )
            .expect("Failed to register patch_failures"),

            patch_latency_seconds: register_histogram!(
                "rec_applier_patch_latency_seconds",
                "Time spent waiting on the API server for a patch",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register patch_latency_seconds"),
        }
    }
}

/// Applier metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ApplierMetrics {
    _private: (),
}

impl Default for ApplierMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplierMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ApplierMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ApplierMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn set_recommendations_loaded(&self, count: usize) {
        self.inner().recommendations_loaded.set(count as i64);
    }

    pub fn inc_patches_applied(&self) {
        self.inner().patches_applied.inc();
    }

    pub fn inc_patch_failures(&self, reason: &str) {
        self.inner()
            .patch_failures
            .with_label_values(&[reason])
            .inc();
    }

    pub fn observe_patch_latency(&self, duration_secs: f64) {
        self.inner().patch_latency_seconds.observe(duration_secs);
    }

    #[cfg(test)]
    pub(crate) fn patches_applied(&self) -> u64 {
        self.inner().patches_applied.get()
    }

    #[cfg(test)]
    pub(crate) fn patch_failures(&self, reason: &str) -> u64 {
        self.inner()
            .patch_failures
            .with_label_values(&[reason])
            .get()
    }

    /// Render all registered metrics in the text exposition format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Write metrics for node-exporter's textfile collector
    pub fn write_textfile(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let body = self.render()?;
        // write then rename so the collector never reads a partial file
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, body)
            .with_context(|| format!("Failed to write metrics to {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move metrics into {}", path.display()))?;
        Ok(())
    }
}

/// Structured logger for applier events
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    /// `source` identifies the batch input, usually the recommendations path
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn log_startup(&self, version: &str, mode: &str, dry_run: bool) {
        info!(
            event = "applier_started",
            source = %self.source,
            applier_version = %version,
            mode = %mode,
            dry_run = dry_run,
            "Recommendation applier started"
        );
    }

    pub fn log_patch_applied(
        &self,
        namespace: &str,
        pod_name: &str,
        container: &str,
        cpu_request: &str,
        memory_request: &str,
        dry_run: bool,
    ) {
        info!(
            event = "patch_applied",
            source = %self.source,
            namespace = %namespace,
            pod_name = %pod_name,
            container = %container,
            cpu_request = %cpu_request,
            memory_request = %memory_request,
            dry_run = dry_run,
            "Patched {}/{} for container {}",
            namespace,
            pod_name,
            container
        );
    }

    pub fn log_patch_failed(&self, namespace: &str, pod_name: &str, reason: &str, error: &str) {
        warn!(
            event = "patch_failed",
            source = %self.source,
            namespace = %namespace,
            pod_name = %pod_name,
            reason = %reason,
            error = %error,
            "Failed to patch pod {}/{}",
            namespace,
            pod_name
        );
    }

    pub fn log_batch_finished(&self, applied: usize, failed: usize, elapsed_ms: i64) {
        if failed == 0 {
            info!(
                event = "batch_finished",
                source = %self.source,
                applied = applied,
                failed = failed,
                elapsed_ms = elapsed_ms,
                "Batch finished"
            );
        } else {
            warn!(
                event = "batch_finished",
                source = %self.source,
                applied = applied,
                failed = failed,
                elapsed_ms = elapsed_ms,
                "Batch finished with failures"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applier_metrics() {
        // The registry is process-global, so only assert on deltas
        let metrics = ApplierMetrics::new();
        let applied = metrics.patches_applied();
        let failures = metrics.patch_failures("metrics_test");

        metrics.set_recommendations_loaded(3);
        metrics.inc_patches_applied();
        metrics.inc_patch_failures("metrics_test");
        metrics.observe_patch_latency(0.02);

        assert!(metrics.patches_applied() > applied);
        assert_eq!(metrics.patch_failures("metrics_test"), failures + 1);

        let text = metrics.render().unwrap();
        assert!(text.contains("rec_applier_patches_applied_total"));
        assert!(text.contains("reason=\"metrics_test\""));
    }

    #[test]
    fn test_write_textfile() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rec_applier.prom");

        let metrics = ApplierMetrics::new();
        metrics.set_recommendations_loaded(1);
        metrics.write_textfile(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("rec_applier_recommendations_loaded"));
        assert!(!dir.path().join("rec_applier.prom.tmp").exists());
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("./recs.json");
        assert_eq!(logger.source, "./recs.json");
    }
}
