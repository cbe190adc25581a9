//! Strategic merge patch payload for container resources
//!
//! The payload names a single container, so the API server merges it into
//! the pod spec without the full container list being sent.

use crate::models::Recommendation;
use crate::quantity::{format_cpu, format_memory};
use serde::{Deserialize, Serialize};

/// CPU and memory quantities for either requests or limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuantities {
    pub cpu: String,
    pub memory: String,
}

impl ResourceQuantities {
    pub fn new(cpu_millicores: i64, memory_bytes: i64) -> Self {
        Self {
            cpu: format_cpu(cpu_millicores),
            memory: format_memory(memory_bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerResources {
    pub requests: ResourceQuantities,
    pub limits: ResourceQuantities,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerPatch {
    pub name: String,
    pub resources: ContainerResources,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpecPatch {
    pub containers: Vec<ContainerPatch>,
}

/// `{"spec": {"containers": [{"name": ..., "resources": {...}}]}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePatch {
    pub spec: PodSpecPatch,
}

impl ResourcePatch {
    /// Build the patch for the recommendation's container
    pub fn from_recommendation(rec: &Recommendation) -> Self {
        Self {
            spec: PodSpecPatch {
                containers: vec![ContainerPatch {
                    name: rec.container_name.clone(),
                    resources: ContainerResources {
                        requests: ResourceQuantities::new(
                            rec.cpu_request_millicores,
                            rec.memory_request_bytes,
                        ),
                        limits: ResourceQuantities::new(
                            rec.cpu_limit_millicores,
                            rec.memory_limit_bytes,
                        ),
                    },
                }],
            },
        }
    }

    /// Name of the patched container
    pub fn container_name(&self) -> &str {
        self.spec
            .containers
            .first()
            .map(|c| c.name.as_str())
            .unwrap_or_default()
    }

    pub fn to_json_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
