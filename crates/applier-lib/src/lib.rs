//! Recommendation applier library
//!
//! This crate provides the core functionality for:
//! - Loading resource recommendations into a workload-keyed store
//! - Resolving a pod's owning workload from its owner references
//! - Formatting CPU/memory quantities and building resource patches
//! - Applying a batch of patches to running pods
//! - Metrics and structured logging

pub mod apply;
pub mod error;
pub mod models;
pub mod observability;
pub mod owner;
pub mod patch;
pub mod quantity;
pub mod store;

pub use error::{Error, Result};
pub use models::*;
pub use observability::{ApplierMetrics, StructuredLogger};
pub use owner::{resolve_workload_key, KeyScheme, OwnerKind, OwnerRef, PodRef, WorkloadKey};
pub use patch::ResourcePatch;
pub use quantity::{format_cpu, format_memory};
pub use store::{match_recommendation, RecommendationStore};
