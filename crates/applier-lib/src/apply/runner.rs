//! Batch apply loop

use super::report::{BatchReport, ItemOutcome, ItemStatus};
use super::{ApplyConfig, ApplyMode, PodClient};
use crate::models::Recommendation;
use crate::observability::{ApplierMetrics, StructuredLogger};
use crate::patch::ResourcePatch;
use crate::store::{match_recommendation, RecommendationStore};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Reason label for errors returned by the API server
const API_ERROR: &str = "api_error";

/// Reason label for a namespace whose pods could not be listed
const LIST_ERROR: &str = "list_error";

/// Applies a batch of recommendations, one item at a time
pub struct BatchApplier {
    client: Arc<dyn PodClient>,
    config: ApplyConfig,
    metrics: ApplierMetrics,
    logger: StructuredLogger,
}

impl BatchApplier {
    pub fn new(client: Arc<dyn PodClient>, config: ApplyConfig, logger: StructuredLogger) -> Self {
        Self {
            client,
            config,
            metrics: ApplierMetrics::new(),
            logger,
        }
    }

    #[cfg(test)]
    pub(crate) fn config(&self) -> &ApplyConfig {
        &self.config
    }

    /// Run the batch. Per-item failures end up in the report, never as `Err`.
    pub async fn run(
        &self,
        store: &RecommendationStore,
        records: &[Recommendation],
    ) -> BatchReport {
        let mut report = BatchReport::new(Utc::now());
        self.metrics.set_recommendations_loaded(records.len());

        info!(
            mode = self.config.mode.as_str(),
            records = records.len(),
            workloads = store.len(),
            dry_run = self.config.dry_run,
            "Starting batch"
        );

        match self.config.mode {
            ApplyMode::Direct => self.run_direct(records, &mut report).await,
            ApplyMode::Owner => self.run_owner(store, &mut report).await,
        }

        report.finish();
        self.logger
            .log_batch_finished(report.applied(), report.failed(), report.elapsed_ms());
        report
    }

    /// Patch the pod named by each record, in list order
    async fn run_direct(&self, records: &[Recommendation], report: &mut BatchReport) {
        for (i, rec) in records.iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }
            let outcome = self.apply(&rec.namespace, &rec.pod_name, rec).await;
            report.push(outcome);
        }
    }

    /// Patch every pod whose owning workload has a recommendation
    async fn run_owner(&self, store: &RecommendationStore, report: &mut BatchReport) {
        let mut patched_any = false;

        for namespace in store.namespaces() {
            let pods = match self.client.list_pods(namespace).await {
                Ok(pods) => pods,
                Err(e) => {
                    let message = format!("{:#}", e);
                    report.push(self.failure(namespace, "", "", LIST_ERROR, &message));
                    continue;
                }
            };

            for pod in &pods {
                let rec = match match_recommendation(pod, store) {
                    Ok(rec) => rec,
                    Err(e) => {
                        report.push(self.failure(
                            &pod.namespace,
                            &pod.name,
                            "",
                            e.reason(),
                            &e.to_string(),
                        ));
                        continue;
                    }
                };

                if patched_any {
                    self.pause().await;
                }
                patched_any = true;

                let outcome = self.apply(&pod.namespace, &pod.name, rec).await;
                report.push(outcome);
            }
        }
    }

    /// Send one patch and record its outcome
    async fn apply(&self, namespace: &str, pod_name: &str, rec: &Recommendation) -> ItemOutcome {
        let patch = ResourcePatch::from_recommendation(rec);

        match self.send_patch(namespace, pod_name, &patch).await {
            Ok(()) => {
                self.metrics.inc_patches_applied();
                let requests = &patch.spec.containers[0].resources.requests;
                self.logger.log_patch_applied(
                    namespace,
                    pod_name,
                    patch.container_name(),
                    &requests.cpu,
                    &requests.memory,
                    self.config.dry_run,
                );

                let status = if self.config.dry_run {
                    ItemStatus::DryRun
                } else {
                    ItemStatus::Applied
                };
                ItemOutcome {
                    namespace: namespace.to_string(),
                    pod_name: pod_name.to_string(),
                    container_name: patch.container_name().to_string(),
                    status,
                }
            }
            Err(e) => self.failure(
                namespace,
                pod_name,
                &rec.container_name,
                API_ERROR,
                &format!("{:#}", e),
            ),
        }
    }

    async fn send_patch(
        &self,
        namespace: &str,
        pod_name: &str,
        patch: &ResourcePatch,
    ) -> Result<()> {
        let start = Instant::now();
        let result = self
            .client
            .patch_pod(namespace, pod_name, patch, self.config.dry_run)
            .await;
        self.metrics
            .observe_patch_latency(start.elapsed().as_secs_f64());
        result
    }

    fn failure(
        &self,
        namespace: &str,
        pod_name: &str,
        container_name: &str,
        reason: &str,
        message: &str,
    ) -> ItemOutcome {
        self.metrics.inc_patch_failures(reason);
        self.logger
            .log_patch_failed(namespace, pod_name, reason, message);

        ItemOutcome {
            namespace: namespace.to_string(),
            pod_name: pod_name.to_string(),
            container_name: container_name.to_string(),
            status: ItemStatus::Failed {
                reason: reason.to_string(),
                message: message.to_string(),
            },
        }
    }

    async fn pause(&self) {
        if !self.config.patch_delay.is_zero() {
            debug!(
                delay_ms = self.config.patch_delay.as_millis() as u64,
                "Pausing between patches"
            );
            tokio::time::sleep(self.config.patch_delay).await;
        }
    }
}

/// Builder for the batch applier
pub struct BatchApplierBuilder {
    client: Option<Arc<dyn PodClient>>,
    logger: Option<StructuredLogger>,
    config: ApplyConfig,
}

impl BatchApplierBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            client: None,
            logger: None,
            config: ApplyConfig::default(),
        }
    }

    /// Set the pod client
    pub fn client(mut self, client: Arc<dyn PodClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn mode(mut self, mode: ApplyMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the pause between patches
    pub fn patch_delay(mut self, delay: Duration) -> Self {
        self.config.patch_delay = delay;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Build the applier
    pub fn build(self) -> Result<BatchApplier> {
        let client = self
            .client
            .ok_or_else(|| anyhow::anyhow!("Pod client is required"))?;
        let logger = self
            .logger
            .unwrap_or_else(|| StructuredLogger::new("unknown"));

        Ok(BatchApplier::new(client, self.config, logger))
    }
}

impl Default for BatchApplierBuilder {
    fn default() -> Self {
        Self::new()
    }
}
