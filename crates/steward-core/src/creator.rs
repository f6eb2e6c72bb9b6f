use crate::{CoreError, Operation};
use serde::Serialize;
use steward_schema::Resource;
use steward_store::ResourceStore;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Creation {
    Created,
    AlreadyPresent,
}

/// Create `resource` unless something with the same name already exists.
///
/// Existing content is never read back or compared.
pub fn ensure_created(
    store: &dyn ResourceStore,
    resource: &Resource,
) -> Result<Creation, CoreError> {
    match store.create(resource) {
        Ok(_) => Ok(Creation::Created),
        Err(e) if e.is_already_exists() => {
            debug!("{} already exists", resource.object_ref());
            Ok(Creation::AlreadyPresent)
        }
        Err(e) => Err(CoreError::resource(
            Operation::Create,
            &resource.object_ref(),
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_schema::{Identity, ObjectMeta, ResourceKind};
    use steward_store::{Fault, FaultKind, MemoryStore, StoreVerb};

    fn identity() -> Resource {
        Identity {
            metadata: ObjectMeta::new("curator", "logging"),
        }
        .into()
    }

    #[test]
    fn second_call_is_benign() {
        let store = MemoryStore::new();
        assert_eq!(ensure_created(&store, &identity()).unwrap(), Creation::Created);
        assert_eq!(
            ensure_created(&store, &identity()).unwrap(),
            Creation::AlreadyPresent
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.count(StoreVerb::Create, ResourceKind::Identity), 1);
    }

    #[test]
    fn other_errors_carry_kind_and_name() {
        let store = MemoryStore::new();
        store.inject(Fault {
            verb: StoreVerb::Create,
            kind: ResourceKind::Identity,
            kind_of_error: FaultKind::Unavailable,
            times: 1,
        });
        let err = ensure_created(&store, &identity()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Resource {
                op: Operation::Create,
                ..
            }
        ));
        assert!(err.to_string().contains("identity logging/curator"));
    }
}
