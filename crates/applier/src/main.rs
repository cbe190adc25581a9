//! Recommendation applier
//!
//! Reads a batch of CPU/memory recommendations and patches the resource
//! requests and limits of the matching running pods, one at a time.

use anyhow::{Context, Result};
use applier_lib::apply::{ApplyMode, BatchApplierBuilder, KubePodClient};
use applier_lib::store::read_recommendations;
use applier_lib::{ApplierMetrics, KeyScheme, RecommendationStore, StructuredLogger};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod output;

const APPLIER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Apply resource recommendations to running pods
#[derive(Parser)]
#[command(name = "rec-applier")]
#[command(
    author,
    version,
    about = "Apply CPU/memory recommendations to running pods",
    long_about = None
)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Recommendations JSON file
    #[arg(long, short = 'r')]
    pub recommendations: Option<PathBuf>,

    /// Path to kubeconfig file (in-cluster config is used if not set)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// How recommendations are matched to pods (direct, owner)
    #[arg(long)]
    pub mode: Option<ApplyMode>,

    /// Workload key scheme (concatenated, delimited)
    #[arg(long)]
    pub key_scheme: Option<KeyScheme>,

    /// Pause between patches in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Send patches as server-side dry runs (`--dry-run=false` turns it off)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub dry_run: Option<bool>,

    /// Write Prometheus metrics to this file when the batch finishes
    #[arg(long)]
    pub metrics_textfile: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,
}

impl Cli {
    /// Command-line flags take precedence over file and environment
    fn merge_into(self, mut config: config::ApplierConfig) -> config::ApplierConfig {
        if let Some(path) = self.recommendations {
            config.recommendations_path = path;
        }
        if self.kubeconfig.is_some() {
            config.kubeconfig = self.kubeconfig;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(scheme) = self.key_scheme {
            config.key_scheme = scheme;
        }
        if let Some(delay) = self.delay_ms {
            config.patch_delay_ms = delay;
        }
        if let Some(dry_run) = self.dry_run {
            config.dry_run = dry_run;
        }
        if self.metrics_textfile.is_some() {
            config.metrics_textfile = self.metrics_textfile;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so the report on stdout stays machine-readable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    let file_config = config::ApplierConfig::load(cli.config.as_deref())?;
    let config = cli.merge_into(file_config);

    let source = config.recommendations_path.display().to_string();
    let logger = StructuredLogger::new(&source);
    logger.log_startup(APPLIER_VERSION, config.mode.as_str(), config.dry_run);

    let records = read_recommendations(&config.recommendations_path)?;
    let store = RecommendationStore::load_with_scheme(records.iter().cloned(), config.key_scheme);
    info!(
        records = records.len(),
        workloads = store.len(),
        key_scheme = ?config.key_scheme,
        "Loaded recommendations"
    );

    let client = KubePodClient::connect(config.kubeconfig.as_deref())
        .await
        .context("Failed to connect to Kubernetes")?;

    let applier = BatchApplierBuilder::new()
        .client(Arc::new(client))
        .logger(logger)
        .mode(config.mode)
        .patch_delay(config.apply_config().patch_delay)
        .dry_run(config.dry_run)
        .build()?;

    let report = applier.run(&store, &records).await;
    output::print_report(&report, format)?;

    if let Some(path) = &config.metrics_textfile {
        if let Err(e) = ApplierMetrics::new().write_textfile(path) {
            warn!(error = %e, "Failed to write metrics textfile");
        }
    }

    if report.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
