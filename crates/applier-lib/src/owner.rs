//! Workload identity resolution from pod owner references
//!
//! Pods created by a Deployment are owned by a ReplicaSet named
//! `<deployment>-<pod-template-hash>`. The hash changes on every rollout,
//! so the workload key strips it to recover the Deployment name. StatefulSet
//! names are stable and used as-is.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between a ReplicaSet's Deployment name and its template hash
const NAME_SEPARATOR: char = '-';

/// Controller kind of a pod owner
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    StatefulSet,
    ReplicaSet,
    /// Any other controller (DaemonSet, Job, Node, ...)
    Other(String),
}

impl From<&str> for OwnerKind {
    fn from(kind: &str) -> Self {
        match kind {
            "StatefulSet" => OwnerKind::StatefulSet,
            "ReplicaSet" => OwnerKind::ReplicaSet,
            other => OwnerKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKind::StatefulSet => f.write_str("StatefulSet"),
            OwnerKind::ReplicaSet => f.write_str("ReplicaSet"),
            OwnerKind::Other(kind) => f.write_str(kind),
        }
    }
}

/// Owner reference as found in pod metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRef {
    pub kind: OwnerKind,
    pub name: String,
}

impl OwnerRef {
    pub fn new(kind: impl Into<OwnerKind>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// The parts of a pod needed to resolve its workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRef {
    pub name: String,
    pub namespace: String,
    pub owner_references: Vec<OwnerRef>,
}

impl PodRef {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        owner_references: Vec<OwnerRef>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            owner_references,
        }
    }
}

/// How a workload name and namespace are combined into a key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    /// `name + namespace` with no separator.
    ///
    /// Ambiguous: owner `ab` in `c` and owner `a` in `bc` share a key.
    /// Kept as the default because existing recommendation data is keyed
    /// this way.
    #[default]
    Concatenated,
    /// `namespace/name`. Unambiguous, but incompatible with data keyed
    /// by the concatenated scheme.
    Delimited,
}

impl FromStr for KeyScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "concatenated" => Ok(KeyScheme::Concatenated),
            "delimited" => Ok(KeyScheme::Delimited),
            other => Err(format!("unknown key scheme: {}", other)),
        }
    }
}

/// Identity of a workload within the cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkloadKey(String);

impl WorkloadKey {
    pub fn new(workload: &str, namespace: &str, scheme: KeyScheme) -> Self {
        match scheme {
            KeyScheme::Concatenated => Self(format!("{}{}", workload, namespace)),
            KeyScheme::Delimited => Self(format!("{}/{}", namespace, workload)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkloadKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical workload name for a single owner reference
pub fn canonical_owner_name(owner: &OwnerRef) -> Result<String> {
    match &owner.kind {
        OwnerKind::StatefulSet => Ok(owner.name.clone()),
        OwnerKind::ReplicaSet => {
            let parts: Vec<&str> = owner.name.split(NAME_SEPARATOR).collect();
            if parts.len() < 2 {
                return Err(Error::MalformedOwnerName(owner.name.clone()));
            }
            Ok(parts[..parts.len() - 1].join("-"))
        }
        OwnerKind::Other(kind) => Err(Error::UnsupportedOwnerKind(kind.clone())),
    }
}

/// Resolve the workload key of a pod from its first owner reference.
///
/// Additional owner references are ignored.
pub fn resolve_workload_key(pod: &PodRef, scheme: KeyScheme) -> Result<WorkloadKey> {
    let owner = pod.owner_references.first().ok_or_else(|| Error::NoOwner {
        namespace: pod.namespace.clone(),
        pod: pod.name.clone(),
    })?;

    let name = canonical_owner_name(owner)?;
    Ok(WorkloadKey::new(&name, &pod.namespace, scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(namespace: &str, owners: Vec<OwnerRef>) -> PodRef {
        PodRef::new("test-pod", namespace, owners)
    }

    fn resolve(p: &PodRef) -> Result<WorkloadKey> {
        resolve_workload_key(p, KeyScheme::Concatenated)
    }

    #[test]
    fn test_statefulset_name_used_as_is() {
        let p = pod("prod", vec![OwnerRef::new("StatefulSet", "postgres-db")]);
        assert_eq!(resolve(&p).unwrap().as_str(), "postgres-dbprod");
    }

    #[test]
    fn test_replicaset_hash_is_stripped() {
        let p = pod("default", vec![OwnerRef::new("ReplicaSet", "X-abc123")]);
        assert_eq!(resolve(&p).unwrap().as_str(), "Xdefault");

        let p = pod(
            "default",
            vec![OwnerRef::new("ReplicaSet", "my-deploy-75cb66cbcf")],
        );
        assert_eq!(resolve(&p).unwrap().as_str(), "my-deploydefault");
    }

    #[test]
    fn test_replicaset_without_hash_is_malformed() {
        let p = pod("default", vec![OwnerRef::new("ReplicaSet", "single")]);
        let err = resolve(&p).unwrap_err();
        assert!(matches!(err, Error::MalformedOwnerName(ref name) if name == "single"));
    }

    #[test]
    fn test_replicaset_trailing_separator() {
        // "web-" splits into ["web", ""], so the empty hash is dropped
        let p = pod("ns", vec![OwnerRef::new("ReplicaSet", "web-")]);
        assert_eq!(resolve(&p).unwrap().as_str(), "webns");
    }

    #[test]
    fn test_unsupported_owner_kind() {
        let p = pod("kube-system", vec![OwnerRef::new("DaemonSet", "fluentd")]);
        let err = resolve(&p).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOwnerKind(ref kind) if kind == "DaemonSet"));

        let p = pod("batch", vec![OwnerRef::new("Job", "nightly-27819")]);
        assert!(matches!(
            resolve(&p).unwrap_err(),
            Error::UnsupportedOwnerKind(_)
        ));
    }

    #[test]
    fn test_no_owner() {
        let p = pod("default", vec![]);
        let err = resolve(&p).unwrap_err();
        assert!(matches!(err, Error::NoOwner { ref namespace, .. } if namespace == "default"));
    }

    #[test]
    fn test_only_first_owner_is_inspected() {
        let p = pod(
            "default",
            vec![
                OwnerRef::new("DaemonSet", "agent"),
                OwnerRef::new("StatefulSet", "web"),
            ],
        );
        assert!(matches!(
            resolve(&p).unwrap_err(),
            Error::UnsupportedOwnerKind(_)
        ));

        let p = pod(
            "default",
            vec![
                OwnerRef::new("StatefulSet", "web"),
                OwnerRef::new("DaemonSet", "agent"),
            ],
        );
        assert_eq!(resolve(&p).unwrap().as_str(), "webdefault");
    }

    #[test]
    fn test_pods_of_same_deployment_share_key() {
        let before = pod("shop", vec![OwnerRef::new("ReplicaSet", "cart-5d9f8b7c6d")]);
        let after = pod("shop", vec![OwnerRef::new("ReplicaSet", "cart-84bd5c9f47")]);
        assert_eq!(resolve(&before).unwrap(), resolve(&after).unwrap());
    }

    #[test]
    fn test_concatenated_scheme_is_ambiguous() {
        let a = WorkloadKey::new("ab", "c", KeyScheme::Concatenated);
        let b = WorkloadKey::new("a", "bc", KeyScheme::Concatenated);
        assert_eq!(a, b);
    }

    #[test]
    fn test_delimited_scheme() {
        let a = WorkloadKey::new("ab", "c", KeyScheme::Delimited);
        let b = WorkloadKey::new("a", "bc", KeyScheme::Delimited);
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "c/ab");

        let p = pod("shop", vec![OwnerRef::new("ReplicaSet", "cart-5d9f8b7c6d")]);
        let key = resolve_workload_key(&p, KeyScheme::Delimited).unwrap();
        assert_eq!(key.as_str(), "shop/cart");
    }

    #[test]
    fn test_owner_kind_parsing() {
        assert_eq!(OwnerKind::from("StatefulSet"), OwnerKind::StatefulSet);
        assert_eq!(OwnerKind::from("ReplicaSet"), OwnerKind::ReplicaSet);
        assert_eq!(
            OwnerKind::from("replicaset"),
            OwnerKind::Other("replicaset".to_string())
        );
        assert_eq!(OwnerKind::from("DaemonSet").to_string(), "DaemonSet");
    }

    #[test]
    fn test_key_scheme_from_str() {
        assert_eq!(
            "concatenated".parse::<KeyScheme>().unwrap(),
            KeyScheme::Concatenated
        );
        assert_eq!("Delimited".parse::<KeyScheme>().unwrap(), KeyScheme::Delimited);
        assert!("dotted".parse::<KeyScheme>().is_err());
    }
}
