//! `PodClient` backed by the Kubernetes API

use super::{async_trait, PodClient};
use crate::owner::{OwnerRef, PodRef};
use crate::patch::ResourcePatch;
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::Path;
use tracing::{debug, info};

/// Field manager recorded on patched pods
const FIELD_MANAGER: &str = "rec-applier";

pub struct KubePodClient {
    client: Client,
}

impl KubePodClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using a kubeconfig file when given, in-cluster config otherwise
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self> {
        let config = match kubeconfig {
            Some(path) => {
                info!(path = %path.display(), "Using kubeconfig");
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .context("Could not get Kubernetes config")?
            }
            None => {
                info!("Using in-cluster config");
                Config::incluster().context("Could not get Kubernetes config")?
            }
        };

        let client = Client::try_from(config).context("Could not create Kubernetes client")?;
        Ok(Self::new(client))
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl PodClient for KubePodClient {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRef>> {
        let pods = self
            .pods(namespace)
            .list(&ListParams::default())
            .await
            .with_context(|| format!("Failed to list pods in {}", namespace))?;

        debug!(namespace = %namespace, count = pods.items.len(), "Listed pods");
        Ok(pods.items.iter().map(PodRef::from).collect())
    }

    async fn patch_pod(
        &self,
        namespace: &str,
        pod_name: &str,
        patch: &ResourcePatch,
        dry_run: bool,
    ) -> Result<()> {
        let mut params = PatchParams::default();
        params.field_manager = Some(FIELD_MANAGER.to_string());
        if dry_run {
            params = params.dry_run();
        }

        let body = patch.to_json_value().context("Failed to serialize patch")?;
        self.pods(namespace)
            .patch(pod_name, &params, &Patch::Strategic(body))
            .await
            .with_context(|| format!("Failed to patch pod {}/{}", namespace, pod_name))?;

        Ok(())
    }
}

impl From<&Pod> for PodRef {
    fn from(pod: &Pod) -> Self {
        let meta = &pod.metadata;
        let owner_references = meta
            .owner_references
            .as_ref()
            .map(|owners| {
                owners
                    .iter()
                    .map(|o| OwnerRef::new(o.kind.as_str(), o.name.clone()))
                    .collect()
            })
            .unwrap_or_default();

        PodRef::new(
            meta.name.clone().unwrap_or_default(),
            meta.namespace.clone().unwrap_or_default(),
            owner_references,
        )
    }
}
