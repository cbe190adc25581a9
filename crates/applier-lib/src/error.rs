//! Error types for recommendation loading and workload matching

use crate::owner::WorkloadKey;

/// Errors raised while loading recommendations or matching a pod to one.
///
/// All variants are per-item failures: the apply loop records them and
/// moves on to the next item.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed recommendation input: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("pod {namespace}/{pod} has no owner")]
    NoOwner { namespace: String, pod: String },

    #[error("unsupported owner kind: {0}")]
    UnsupportedOwnerKind(String),

    #[error("malformed ReplicaSet name: {0}")]
    MalformedOwnerName(String),

    #[error("no recommendation found for key: {0}")]
    NoRecommendationFound(WorkloadKey),
}

impl Error {
    /// Stable label used for metrics and reports
    pub fn reason(&self) -> &'static str {
        match self {
            Error::MalformedInput(_) => "malformed_input",
            Error::NoOwner { .. } => "no_owner",
            Error::UnsupportedOwnerKind(_) => "unsupported_owner_kind",
            Error::MalformedOwnerName(_) => "malformed_owner_name",
            Error::NoRecommendationFound(_) => "no_recommendation",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
