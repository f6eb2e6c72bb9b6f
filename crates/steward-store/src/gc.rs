use crate::api::ResourceStore;
use crate::StoreError;
use std::collections::HashSet;
use steward_schema::{Namespace, ObjectRef, ResourceKind, Uid};
use tracing::{debug, info};

/// Removes managed resources whose controlling owner no longer exists.
///
/// Stores without cascading delete leave owned resources behind when a
/// cluster configuration is removed out-of-band; this sweeps them up.
pub struct GarbageCollector<'a> {
    store: &'a dyn ResourceStore,
}

#[derive(Debug, Default)]
pub struct GcReport {
    pub orphaned: Vec<ObjectRef>,
    pub removed: usize,
}

impl<'a> GarbageCollector<'a> {
    pub fn new(store: &'a dyn ResourceStore) -> Self {
        Self { store }
    }

    pub fn collect(&self, namespace: &Namespace, dry_run: bool) -> Result<GcReport, StoreError> {
        self.collect_with_cancel(namespace, dry_run, || false)
    }

    pub fn collect_with_cancel(
        &self,
        namespace: &Namespace,
        dry_run: bool,
        should_stop: impl Fn() -> bool,
    ) -> Result<GcReport, StoreError> {
        let live_owners: HashSet<Uid> = self
            .store
            .list(ResourceKind::ClusterConfig, namespace)?
            .iter()
            .filter_map(|r| r.meta().uid.clone())
            .collect();

        let mut report = GcReport::default();
        for kind in ResourceKind::MANAGED {
            for resource in self.store.list(kind, namespace)? {
                // Resources nobody claims are not ours to remove.
                let Some(owner) = resource.meta().controller() else {
                    continue;
                };
                if owner.kind == ResourceKind::ClusterConfig && !live_owners.contains(&owner.uid)
                {
                    report.orphaned.push(resource.object_ref());
                }
            }
        }

        if !dry_run {
            for object in &report.orphaned {
                if should_stop() {
                    break;
                }
                match self.store.delete(object) {
                    Ok(()) => {
                        info!("removed orphaned {object}");
                        report.removed += 1;
                    }
                    Err(e) if e.is_not_found() => {
                        debug!("orphan {object} already gone");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use steward_schema::{ClusterConfig, Identity, Object, ObjectMeta, Resource};

    fn owned_identity(name: &str, owner: &ClusterConfig) -> Resource {
        let mut metadata = ObjectMeta::new(name, "logging");
        metadata.add_owner(owner.as_owner());
        Identity { metadata }.into()
    }

    fn stored_cluster(store: &MemoryStore, name: &str) -> ClusterConfig {
        let created = store
            .create(&ClusterConfig::new(name, "logging").into())
            .unwrap();
        ClusterConfig::from_resource(created).unwrap()
    }

    #[test]
    fn live_owner_keeps_resources() {
        let store = MemoryStore::new();
        let cluster = stored_cluster(&store, "instance");
        store.create(&owned_identity("curator", &cluster)).unwrap();

        let report = GarbageCollector::new(&store)
            .collect(&"logging".into(), false)
            .unwrap();
        assert!(report.orphaned.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn orphans_removed_after_owner_deleted() {
        let store = MemoryStore::new();
        let cluster = stored_cluster(&store, "instance");
        store.create(&owned_identity("curator", &cluster)).unwrap();
        store.delete(&cluster.object_ref()).unwrap();

        let report = GarbageCollector::new(&store)
            .collect(&"logging".into(), false)
            .unwrap();
        assert_eq!(report.orphaned.len(), 1);
        assert_eq!(report.removed, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn dry_run_removes_nothing() {
        let store = MemoryStore::new();
        let cluster = stored_cluster(&store, "instance");
        store.create(&owned_identity("curator", &cluster)).unwrap();
        store.delete(&cluster.object_ref()).unwrap();

        let report = GarbageCollector::new(&store)
            .collect(&"logging".into(), true)
            .unwrap();
        assert_eq!(report.orphaned.len(), 1);
        assert_eq!(report.removed, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unowned_resources_are_ignored() {
        let store = MemoryStore::new();
        let bare: Resource = Identity {
            metadata: ObjectMeta::new("stray", "logging"),
        }
        .into();
        store.create(&bare).unwrap();

        let report = GarbageCollector::new(&store)
            .collect(&"logging".into(), false)
            .unwrap();
        assert!(report.orphaned.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn cancel_stops_removal() {
        let store = MemoryStore::new();
        let cluster = stored_cluster(&store, "instance");
        store.create(&owned_identity("a", &cluster)).unwrap();
        store.create(&owned_identity("b", &cluster)).unwrap();
        store.delete(&cluster.object_ref()).unwrap();

        let report = GarbageCollector::new(&store)
            .collect_with_cancel(&"logging".into(), false, || true)
            .unwrap();
        assert_eq!(report.orphaned.len(), 2);
        assert_eq!(report.removed, 0);
    }
}
