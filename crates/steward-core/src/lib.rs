//! Reconciliation engine for Steward-managed curation resources.
//!
//! This crate turns a `ClusterConfig` into its managed resource set and drives
//! the store toward it: the desired-state factory, create-if-absent for the
//! write-once bundles, drift detection and patching for scheduled jobs under a
//! bounded conflict-retry loop, status write-back, and teardown. The
//! `Reconciler` ties these together into a single synchronous pass.

pub mod concurrency;
pub mod creator;
pub mod drift;
pub mod factory;
pub mod lifecycle;
pub mod reconciler;
pub mod retry;
pub mod sources;
pub mod status;
pub mod teardown;

pub use concurrency::{install_signal_handler, shutdown_requested, sleep_unless_shutdown};
pub use creator::{ensure_created, Creation};
pub use drift::{
    apply_patch, diff_scheduled_job, reconcile_scheduled_job, DiffResult, DriftField, JobOutcome,
};
pub use factory::{
    default_resources, desired_job, desired_resources, managed_refs, JobStream,
    ManagedResourceSet, CURATOR_NAME, DEFAULT_SCHEDULE,
};
pub use lifecycle::{validate_transition, JobState};
pub use reconciler::{Outcome, ReconcileReport, Reconciler};
pub use retry::{retry_on_conflict, RetryPolicy};
pub use sources::BundleSources;
pub use status::{derive_status, sync_status};
pub use teardown::{prune_stale_jobs, remove_all, teardown, TeardownReport};

use std::fmt;
use steward_schema::{ObjectRef, ResourceKind};
use steward_store::StoreError;
use thiserror::Error;

/// Store call a wrapped error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Fetch,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Fetch => write!(f, "fetch"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to {op} {object}: {source}")]
    Resource {
        op: Operation,
        object: ObjectRef,
        source: StoreError,
    },
    #[error("failed to list {kind} in {namespace}: {source}")]
    List {
        kind: ResourceKind,
        namespace: String,
        source: StoreError,
    },
    #[error("gave up after {attempts} conflicting attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<CoreError> },
    #[error("{0} has no uid; only a stored cluster configuration can own resources")]
    Unstored(ObjectRef),
    #[error("invalid job state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("config error: {0}")]
    Config(#[from] steward_schema::ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn resource(op: Operation, object: &ObjectRef, source: StoreError) -> Self {
        CoreError::Resource {
            op,
            object: object.clone(),
            source,
        }
    }

    /// Whether the underlying store rejected a stale version.
    pub fn is_conflict(&self) -> bool {
        match self {
            CoreError::Resource { source, .. } | CoreError::List { source, .. } => {
                source.is_conflict()
            }
            CoreError::Store(e) => e.is_conflict(),
            _ => false,
        }
    }
}
