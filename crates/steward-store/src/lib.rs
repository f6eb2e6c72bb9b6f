//! Resource store interface and implementations for Steward.
//!
//! This crate provides the storage boundary the reconciler talks to: the
//! `ResourceStore` trait (create/get/update/delete/list with optimistic
//! concurrency on an opaque version token), `MemoryStore` with an operation
//! journal and fault injection for tests, `FileStore` persisting one JSON record
//! per resource under a `StoreLayout` with blake3 checksums and atomic writes,
//! and `GarbageCollector` for resources whose owner no longer exists.

pub mod api;
pub mod file;
pub mod gc;
pub mod layout;
pub mod lock;
pub mod memory;

pub use api::{ResourceStore, TypedStore};
pub use file::FileStore;
pub use gc::{GarbageCollector, GcReport};
pub use layout::{StoreLayout, STORE_FORMAT_VERSION};
pub use lock::StoreLock;
pub use memory::{Fault, FaultKind, MemoryStore, StoreOp, StoreVerb};

use steward_schema::{ObjectRef, ResourceKind, Uid};
use std::path::Path;
use thiserror::Error;

/// Fsync a directory to ensure that a preceding `rename()` is durable.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

/// Derive a fresh uid for a newly created resource.
pub(crate) fn mint_uid(object: &ObjectRef, sequence: u64) -> Uid {
    let now = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    let seed = format!("{object}#{sequence}@{now}");
    let hex = blake3::hash(seed.as_bytes()).to_hex();
    Uid::new(&hex[..32])
}

/// Names become path components in the directory store, so both stores accept
/// only lowercase DNS-label style names.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.len() > 253 {
        return Err(StoreError::InvalidName(format!(
            "'{name}': name must be 1-253 characters"
        )));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(StoreError::InvalidName(format!(
            "'{name}': name must match [a-z0-9.-]"
        )));
    }
    if name.starts_with('.') || name.starts_with('-') {
        return Err(StoreError::InvalidName(format!(
            "'{name}': name must start with a letter or digit"
        )));
    }
    Ok(())
}

pub(crate) fn validate_ref(object: &ObjectRef) -> Result<(), StoreError> {
    validate_name(&object.namespace)?;
    validate_name(&object.name)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    AlreadyExists(ObjectRef),
    #[error("{0} not found")]
    NotFound(ObjectRef),
    #[error("version conflict on {object}: submitted {submitted}, current {current}")]
    Conflict {
        object: ObjectRef,
        submitted: String,
        current: String,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("expected {expected} resource, found {found}")]
    KindMismatch {
        expected: ResourceKind,
        found: ResourceKind,
    },
    #[error("invalid resource name {0}")]
    InvalidName(String),
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("integrity check failed for '{path}': expected {expected}, got {actual}")]
    IntegrityFailure {
        path: String,
        expected: String,
        actual: String,
    },
    #[error("store format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("lock acquisition failed: {0}")]
    LockFailed(String),
}

impl StoreError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
