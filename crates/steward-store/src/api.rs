use crate::StoreError;
use steward_schema::{Namespace, Object, ObjectRef, Resource, ResourceKind};

/// Narrow interface to the backing resource store.
///
/// Every stored resource carries an opaque `resource_version`. `update` must be
/// submitted with the version that was read; a stale or missing version fails
/// with [`StoreError::Conflict`] and the caller re-reads and retries.
pub trait ResourceStore: Send + Sync {
    fn name(&self) -> &str;

    /// Store a new resource. Fails with [`StoreError::AlreadyExists`] when the
    /// address is taken. Returns the stored copy with uid and version assigned.
    fn create(&self, resource: &Resource) -> Result<Resource, StoreError>;

    /// Fails with [`StoreError::NotFound`] when absent.
    fn get(&self, object: &ObjectRef) -> Result<Resource, StoreError>;

    /// Replace a resource, guarded by its `resource_version`.
    fn update(&self, resource: &Resource) -> Result<Resource, StoreError>;

    /// Fails with [`StoreError::NotFound`] when absent.
    fn delete(&self, object: &ObjectRef) -> Result<(), StoreError>;

    /// All resources of `kind` in `namespace`, sorted by name.
    fn list(&self, kind: ResourceKind, namespace: &Namespace) -> Result<Vec<Resource>, StoreError>;
}

/// Typed convenience wrappers over [`ResourceStore`].
pub trait TypedStore: ResourceStore {
    fn get_as<T: Object>(&self, object: &ObjectRef) -> Result<T, StoreError> {
        let resource = self.get(object)?;
        T::from_resource(resource).map_err(|other| StoreError::KindMismatch {
            expected: T::KIND,
            found: other.kind(),
        })
    }

    fn list_as<T: Object>(&self, namespace: &Namespace) -> Result<Vec<T>, StoreError> {
        self.list(T::KIND, namespace)?
            .into_iter()
            .map(|r| {
                T::from_resource(r).map_err(|other| StoreError::KindMismatch {
                    expected: T::KIND,
                    found: other.kind(),
                })
            })
            .collect()
    }
}

impl<S: ResourceStore + ?Sized> TypedStore for S {}
