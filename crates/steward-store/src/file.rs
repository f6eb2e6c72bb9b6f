use crate::api::ResourceStore;
use crate::layout::{write_atomic, StoreLayout};
use crate::lock::StoreLock;
use crate::{mint_uid, validate_ref, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use steward_schema::{Namespace, ObjectRef, Resource, ResourceKind, ResourceVersion};
use tracing::{debug, warn};

/// On-disk envelope: the resource plus a blake3 checksum of its JSON.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    resource: Resource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
}

impl StoredRecord {
    fn seal(resource: Resource) -> Result<Self, StoreError> {
        let checksum = Some(compute_checksum(&resource)?);
        Ok(Self { resource, checksum })
    }
}

fn compute_checksum(resource: &Resource) -> Result<String, StoreError> {
    let json = serde_json::to_string(resource)?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}

/// Resource store persisting one JSON file per resource.
///
/// Mutations take an exclusive [`StoreLock`] so the version check and the write
/// happen atomically with respect to other processes using the same root.
pub struct FileStore {
    layout: StoreLayout,
}

impl FileStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let layout = StoreLayout::new(root.as_ref());
        layout.initialize()?;
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    fn read_record(&self, path: &Path) -> Result<Resource, StoreError> {
        let content = fs::read_to_string(path)?;
        let record: StoredRecord = serde_json::from_str(&content)?;
        if let Some(ref expected) = record.checksum {
            let actual = compute_checksum(&record.resource)?;
            if actual != *expected {
                return Err(StoreError::IntegrityFailure {
                    path: path.display().to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        Ok(record.resource)
    }

    fn write_record(&self, object: &ObjectRef, resource: Resource) -> Result<(), StoreError> {
        let dir = self.layout.kind_dir(object.kind, &object.namespace);
        fs::create_dir_all(&dir)?;
        let record = StoredRecord::seal(resource)?;
        let content = serde_json::to_string_pretty(&record)?;
        write_atomic(&dir, &self.layout.object_path(object), content.as_bytes())
    }

    /// Bump and persist the sequence counter. Caller must hold the exclusive lock.
    fn next_sequence(&self) -> Result<u64, StoreError> {
        let path = self.layout.sequence_file();
        let current = match fs::read_to_string(&path) {
            // Restarting from zero would hand out version tokens already in use.
            Ok(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| StoreError::IntegrityFailure {
                    path: path.display().to_string(),
                    expected: "decimal sequence number".to_owned(),
                    actual: format!("{:?}", s.trim()),
                })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        let next = current + 1;
        let store_dir = self.layout.root().join("store");
        write_atomic(&store_dir, &path, next.to_string().as_bytes())?;
        Ok(next)
    }
}

impl ResourceStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn create(&self, resource: &Resource) -> Result<Resource, StoreError> {
        let object = resource.object_ref();
        validate_ref(&object)?;
        let _lock = StoreLock::exclusive(&self.layout.lock_file())?;

        if self.layout.object_path(&object).exists() {
            return Err(StoreError::AlreadyExists(object));
        }
        let sequence = self.next_sequence()?;
        let mut stored = resource.clone();
        let meta = stored.meta_mut();
        if meta.uid.is_none() {
            meta.uid = Some(mint_uid(&object, sequence));
        }
        meta.resource_version = Some(ResourceVersion::new(sequence.to_string()));
        meta.creation_timestamp = Some(chrono::Utc::now().to_rfc3339());
        self.write_record(&object, stored.clone())?;
        debug!("created {object} at version {sequence}");
        Ok(stored)
    }

    fn get(&self, object: &ObjectRef) -> Result<Resource, StoreError> {
        validate_ref(object)?;
        let _lock = StoreLock::shared(&self.layout.lock_file())?;
        let path = self.layout.object_path(object);
        if !path.exists() {
            return Err(StoreError::NotFound(object.clone()));
        }
        self.read_record(&path)
    }

    fn update(&self, resource: &Resource) -> Result<Resource, StoreError> {
        let object = resource.object_ref();
        validate_ref(&object)?;
        let _lock = StoreLock::exclusive(&self.layout.lock_file())?;

        let path = self.layout.object_path(&object);
        if !path.exists() {
            return Err(StoreError::NotFound(object));
        }
        let current = self.read_record(&path)?;
        let current_version = current.meta().resource_version.clone().unwrap_or_default();
        let submitted = resource.meta().resource_version.clone();
        if submitted.as_ref() != Some(&current_version) {
            return Err(StoreError::Conflict {
                object,
                submitted: submitted.map(ResourceVersion::into_inner).unwrap_or_default(),
                current: current_version.into_inner(),
            });
        }

        let sequence = self.next_sequence()?;
        let mut stored = resource.clone();
        let meta = stored.meta_mut();
        meta.resource_version = Some(ResourceVersion::new(sequence.to_string()));
        meta.uid.clone_from(&current.meta().uid);
        meta.creation_timestamp
            .clone_from(&current.meta().creation_timestamp);
        self.write_record(&object, stored.clone())?;
        debug!("updated {object} to version {sequence}");
        Ok(stored)
    }

    fn delete(&self, object: &ObjectRef) -> Result<(), StoreError> {
        validate_ref(object)?;
        let _lock = StoreLock::exclusive(&self.layout.lock_file())?;
        let path = self.layout.object_path(object);
        if !path.exists() {
            return Err(StoreError::NotFound(object.clone()));
        }
        fs::remove_file(&path)?;
        debug!("deleted {object}");
        Ok(())
    }

    fn list(&self, kind: ResourceKind, namespace: &Namespace) -> Result<Vec<Resource>, StoreError> {
        let _lock = StoreLock::shared(&self.layout.lock_file())?;
        let dir = self.layout.kind_dir(kind, namespace);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut results = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }
            match self.read_record(&path) {
                Ok(resource) => results.push(resource),
                Err(e) => {
                    warn!("skipping corrupted record '{}': {e}", path.display());
                }
            }
        }
        results.sort_by(|a, b| a.meta().name.cmp(&b.meta().name));
        Ok(results)
    }
}
