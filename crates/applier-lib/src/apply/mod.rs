//! Batch application of recommendations to running pods
//!
//! Items are processed one at a time in list order. A failure on one item
//! is logged and counted and the batch moves on; nothing here retries.

mod kube_client;
mod report;
mod runner;


pub use kube_client::KubePodClient;
pub use report::{BatchReport, ItemOutcome, ItemStatus};
pub use runner::{BatchApplier, BatchApplierBuilder};

use crate::owner::PodRef;
use crate::patch::ResourcePatch;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub use async_trait::async_trait;

/// Cluster operations the apply loop depends on
#[async_trait]
pub trait PodClient: Send + Sync {
    /// List pods in a namespace with their owner references
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRef>>;

    /// Apply a strategic merge patch to a pod
    async fn patch_pod(
        &self,
        namespace: &str,
        pod_name: &str,
        patch: &ResourcePatch,
        dry_run: bool,
    ) -> Result<()>;
}

/// How recommendations are mapped to pods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMode {
    /// Patch the pod named by each record
    #[default]
    Direct,
    /// List pods in each namespace and patch those whose owning workload
    /// has a recommendation
    Owner,
}

impl ApplyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyMode::Direct => "direct",
            ApplyMode::Owner => "owner",
        }
    }
}

impl FromStr for ApplyMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(ApplyMode::Direct),
            "owner" => Ok(ApplyMode::Owner),
            other => Err(format!("unknown apply mode: {}", other)),
        }
    }
}

/// Configuration for a batch run
#[derive(Debug, Clone)]
pub struct ApplyConfig {
    pub mode: ApplyMode,
    /// Pause between items to ease pressure on the API server (default: 300ms)
    pub patch_delay: Duration,
    /// Send patches as server-side dry runs
    pub dry_run: bool,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            mode: ApplyMode::Direct,
            patch_delay: Duration::from_millis(300),
            dry_run: false,
        }
    }
}
