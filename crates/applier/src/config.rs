//! Applier configuration

use anyhow::{Context, Result};
use applier_lib::apply::{ApplyConfig, ApplyMode};
use applier_lib::KeyScheme;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Applier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApplierConfig {
    /// JSON file holding the recommendation batch
    #[serde(default = "default_recommendations_path")]
    pub recommendations_path: PathBuf,

    /// Kubeconfig file; in-cluster config is used when unset
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    #[serde(default)]
    pub mode: ApplyMode,

    #[serde(default)]
    pub key_scheme: KeyScheme,

    /// Pause between patches in milliseconds
    #[serde(default = "default_patch_delay_ms")]
    pub patch_delay_ms: u64,

    #[serde(default)]
    pub dry_run: bool,

    /// Where to write Prometheus metrics at the end of the run
    #[serde(default)]
    pub metrics_textfile: Option<PathBuf>,
}

fn applier_env() -> config::Environment {
    config::Environment::with_prefix("APPLIER").try_parsing(true)
}

fn default_recommendations_path() -> PathBuf {
    PathBuf::from("./recs.json")
}

fn default_patch_delay_ms() -> u64 {
    300
}

impl Default for ApplierConfig {
    fn default() -> Self {
        Self {
            recommendations_path: default_recommendations_path(),
            kubeconfig: None,
            mode: ApplyMode::default(),
            key_scheme: KeyScheme::default(),
            patch_delay_ms: default_patch_delay_ms(),
            dry_run: false,
            metrics_textfile: None,
        }
    }
}

impl ApplierConfig {
    /// Load configuration from an optional file, then `APPLIER_*` environment variables
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(file, applier_env())
    }

    /// Environment values win over the file
    fn load_with_env(file: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }

        let config = builder
            .add_source(env)
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn apply_config(&self) -> ApplyConfig {
        ApplyConfig {
            mode: self.mode,
            patch_delay: Duration::from_millis(self.patch_delay_ms),
            dry_run: self.dry_run,
        }
    }
}
