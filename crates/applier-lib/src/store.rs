//! In-memory recommendation store keyed by workload
//!
//! Built once per batch and read-only afterwards, so it can be shared
//! between threads without locking.

use crate::error::{Error, Result};
use crate::models::Recommendation;
use crate::owner::{resolve_workload_key, KeyScheme, PodRef, WorkloadKey};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Recommendations indexed by workload key
#[derive(Debug, Clone, Default)]
pub struct RecommendationStore {
    entries: HashMap<WorkloadKey, Recommendation>,
    namespaces: Vec<String>,
    scheme: KeyScheme,
}

impl RecommendationStore {
    /// Build a store using the default key scheme
    pub fn load(records: impl IntoIterator<Item = Recommendation>) -> Self {
        Self::load_with_scheme(records, KeyScheme::default())
    }

    /// Build a store; later records replace earlier ones with the same key
    pub fn load_with_scheme(
        records: impl IntoIterator<Item = Recommendation>,
        scheme: KeyScheme,
    ) -> Self {
        let mut store = Self {
            entries: HashMap::new(),
            namespaces: Vec::new(),
            scheme,
        };

        for record in records {
            if !store.namespaces.contains(&record.namespace) {
                store.namespaces.push(record.namespace.clone());
            }
            let key = store.key_for(&record);
            if store.entries.insert(key.clone(), record).is_some() {
                debug!(key = %key, "Duplicate recommendation key, keeping last");
            }
        }

        store
    }

    /// Decode a JSON array of recommendations and build a store
    pub fn from_json(bytes: &[u8], scheme: KeyScheme) -> Result<Self> {
        let records = parse_recommendations(bytes)?;
        Ok(Self::load_with_scheme(records, scheme))
    }

    /// Key a record is stored under
    pub fn key_for(&self, record: &Recommendation) -> WorkloadKey {
        WorkloadKey::new(record.workload_name(), &record.namespace, self.scheme)
    }

    /// Look up a recommendation; `None` when the key is unknown
    pub fn lookup(&self, key: &WorkloadKey) -> Option<&Recommendation> {
        self.entries.get(key)
    }

    /// Distinct namespaces in first-seen order
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn key_scheme(&self) -> KeyScheme {
        self.scheme
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Find the recommendation for a pod's owning workload
pub fn match_recommendation<'a>(
    pod: &PodRef,
    store: &'a RecommendationStore,
) -> Result<&'a Recommendation> {
    let key = resolve_workload_key(pod, store.key_scheme())?;
    store
        .lookup(&key)
        .ok_or(Error::NoRecommendationFound(key))
}

/// Decode a JSON array of recommendations, preserving order
pub fn parse_recommendations(bytes: &[u8]) -> Result<Vec<Recommendation>> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read and decode a recommendations file
pub fn read_recommendations(path: &Path) -> anyhow::Result<Vec<Recommendation>> {
    use anyhow::Context;

    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read recommendations from {}", path.display()))?;
    parse_recommendations(&data)
        .with_context(|| format!("Failed to decode recommendations in {}", path.display()))
}
