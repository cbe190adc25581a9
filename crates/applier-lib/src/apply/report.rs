//! Per-item outcomes of a batch run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of one item in the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Applied,
    /// Accepted by the API server as a dry run
    DryRun,
    Failed { reason: String, message: String },
}

impl ItemStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, ItemStatus::Failed { .. })
    }

    pub fn label(&self) -> &str {
        match self {
            ItemStatus::Applied => "applied",
            ItemStatus::DryRun => "dry_run",
            ItemStatus::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub namespace: String,
    pub pod_name: String,
    /// Empty when the pod could not be matched to a recommendation
    pub container_name: String,
    #[serde(flatten)]
    pub status: ItemStatus,
}

/// Summary of a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    pub(crate) fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            items: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, outcome: ItemOutcome) {
        self.items.push(outcome);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// Items patched (or accepted as dry runs)
    pub fn applied(&self) -> usize {
        self.items.iter().filter(|i| !i.status.is_failure()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| i.status.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: ItemStatus) -> ItemOutcome {
        ItemOutcome {
            namespace: "shop".to_string(),
            pod_name: "cart-0".to_string(),
            container_name: "app".to_string(),
            status,
        }
    }

    #[test]
    fn test_report_counts() {
        let mut report = BatchReport::new(Utc::now());
        report.push(outcome(ItemStatus::Applied));
        report.push(outcome(ItemStatus::DryRun));
        report.push(outcome(ItemStatus::Failed {
            reason: "no_owner".to_string(),
            message: "pod shop/cart-0 has no owner".to_string(),
        }));
        report.finish();

        assert_eq!(report.applied(), 2);
        assert_eq!(report.failed(), 1);
        assert!(report.has_failures());
        assert!(report.elapsed_ms() >= 0);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(outcome(ItemStatus::Failed {
            reason: "api_error".to_string(),
            message: "boom".to_string(),
        }))
        .unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "api_error");
        assert_eq!(json["pod_name"], "cart-0");

        let json = serde_json::to_value(outcome(ItemStatus::Applied)).unwrap();
        assert_eq!(json["status"], "applied");
    }
}
