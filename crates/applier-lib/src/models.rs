//! Core data models for the recommendation applier

use serde::{Deserialize, Serialize};

/// Resource recommendation for one container
///
/// Field names follow the recommendation producer's output
/// (`Namespace`, `PodName`, `CPURequest`, ...); camelCase spellings are
/// accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "Namespace", alias = "namespace")]
    pub namespace: String,
    #[serde(rename = "PodName", alias = "podName")]
    pub pod_name: String,
    #[serde(rename = "ContainerName", alias = "containerName")]
    pub container_name: String,
    /// Owning workload name, when the producer knows it
    #[serde(
        rename = "Workload",
        alias = "workload",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub workload: Option<String>,
    #[serde(rename = "CPURequest", alias = "cpuRequest")]
    pub cpu_request_millicores: i64,
    #[serde(rename = "CPULimit", alias = "cpuLimit")]
    pub cpu_limit_millicores: i64,
    #[serde(rename = "MemRequest", alias = "memRequest")]
    pub memory_request_bytes: i64,
    #[serde(rename = "MemLimit", alias = "memLimit")]
    pub memory_limit_bytes: i64,
}

impl Recommendation {
    /// Name the record is keyed under: the workload if set, else the pod name
    pub fn workload_name(&self) -> &str {
        self.workload.as_deref().unwrap_or(&self.pod_name)
    }
}
