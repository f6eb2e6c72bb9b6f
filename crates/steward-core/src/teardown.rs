use crate::factory::{managed_refs, JobStream};
use crate::{CoreError, Operation};
use serde::Serialize;
use steward_schema::{ClusterConfig, ObjectRef, ResourceKind, ScheduledJob};
use steward_store::{ResourceStore, TypedStore};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub deleted: Vec<ObjectRef>,
    pub already_absent: Vec<ObjectRef>,
    /// Set when the cluster is unmanaged and nothing was attempted.
    pub skipped: bool,
}

/// Remove everything the cluster's current topology implies, unless the
/// cluster is unmanaged.
pub fn teardown(
    store: &dyn ResourceStore,
    cluster: &ClusterConfig,
) -> Result<TeardownReport, CoreError> {
    if !cluster.is_managed() {
        debug!(
            "{} is unmanaged, leaving curation resources in place",
            cluster.metadata.name
        );
        return Ok(TeardownReport {
            skipped: true,
            ..TeardownReport::default()
        });
    }
    remove_all(store, cluster, JobStream::for_topology(cluster.spec.topology))
}

/// Delete identity, configuration bundle, credential bundle, then the jobs for
/// `streams`. Stops at the first failure other than "not found".
pub fn remove_all(
    store: &dyn ResourceStore,
    cluster: &ClusterConfig,
    streams: &[JobStream],
) -> Result<TeardownReport, CoreError> {
    let mut report = TeardownReport::default();
    for object in managed_refs(cluster, streams) {
        match store.delete(&object) {
            Ok(()) => {
                info!("removed {object}");
                report.deleted.push(object);
            }
            Err(e) if e.is_not_found() => {
                debug!("{object} already absent");
                report.already_absent.push(object);
            }
            Err(e) => return Err(CoreError::resource(Operation::Delete, &object, e)),
        }
    }
    Ok(report)
}

/// Delete scheduled jobs belonging to the topology the cluster no longer
/// selects. Jobs not controlled by this cluster are left alone.
pub fn prune_stale_jobs(
    store: &dyn ResourceStore,
    cluster: &ClusterConfig,
) -> Result<Vec<ObjectRef>, CoreError> {
    let Some(uid) = cluster.metadata.uid.as_ref() else {
        debug!("{} has no uid yet, not pruning", cluster.metadata.name);
        return Ok(Vec::new());
    };
    let current = JobStream::for_topology(cluster.spec.topology);
    let mut pruned = Vec::new();

    for stream in JobStream::ALL.into_iter().filter(|s| !current.contains(s)) {
        let object = ObjectRef::new(
            ResourceKind::ScheduledJob,
            cluster.metadata.namespace.clone(),
            stream.job_name(),
        );
        let job: ScheduledJob = match store.get_as(&object) {
            Ok(job) => job,
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(CoreError::resource(Operation::Fetch, &object, e)),
        };
        if job.metadata.controller().map(|o| &o.uid) != Some(uid) {
            debug!("{object} is not controlled by {}, keeping it", cluster.metadata.name);
            continue;
        }
        match store.delete(&object) {
            Ok(()) => {
                info!("pruned {object} left over from a previous topology");
                pruned.push(object);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(CoreError::resource(Operation::Delete, &object, e)),
        }
    }
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::desired_job;
    use steward_schema::{CuratorSpec, Identity, ManagementState, Object, ObjectMeta, Topology};
    use steward_store::{Fault, FaultKind, MemoryStore, StoreVerb};

    fn stored_cluster(store: &MemoryStore) -> ClusterConfig {
        let created = store
            .create(&ClusterConfig::new("instance", "logging").into())
            .unwrap();
        ClusterConfig::from_resource(created).unwrap()
    }

    fn owned_identity(cluster: &ClusterConfig) -> Identity {
        let mut metadata = ObjectMeta::new("curator", "logging");
        metadata.add_owner(cluster.as_owner());
        Identity { metadata }
    }

    #[test]
    fn removes_present_and_tolerates_absent() {
        let store = MemoryStore::new();
        let cluster = stored_cluster(&store);
        store.create(&owned_identity(&cluster).into()).unwrap();

        let report = teardown(&store, &cluster).unwrap();
        assert_eq!(report.deleted.len(), 1);
        assert_eq!(report.deleted[0].kind, ResourceKind::Identity);
        assert_eq!(report.already_absent.len(), 3);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn twice_in_a_row_succeeds() {
        let store = MemoryStore::new();
        let cluster = stored_cluster(&store);
        store.create(&owned_identity(&cluster).into()).unwrap();
        teardown(&store, &cluster).unwrap();
        let second = teardown(&store, &cluster).unwrap();
        assert!(second.deleted.is_empty());
        assert_eq!(second.already_absent.len(), 4);
    }

    #[test]
    fn unmanaged_cluster_is_left_alone() {
        let store = MemoryStore::new();
        let cluster = stored_cluster(&store).with_management_state(ManagementState::Unmanaged);
        store.create(&owned_identity(&cluster).into()).unwrap();

        let report = teardown(&store, &cluster).unwrap();
        assert!(report.skipped);
        assert_eq!(store.attempts(StoreVerb::Delete, ResourceKind::Identity), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn first_real_error_stops_teardown() {
        let store = MemoryStore::new();
        let cluster = stored_cluster(&store);
        store.inject(Fault {
            verb: StoreVerb::Delete,
            kind: ResourceKind::ConfigBundle,
            kind_of_error: FaultKind::Unavailable,
            times: 1,
        });
        let err = teardown(&store, &cluster).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Resource {
                op: Operation::Delete,
                ..
            }
        ));
        assert_eq!(store.attempts(StoreVerb::Delete, ResourceKind::CredentialBundle), 0);
        assert_eq!(store.attempts(StoreVerb::Delete, ResourceKind::ScheduledJob), 0);
    }

    #[test]
    fn split_teardown_covers_both_streams() {
        let store = MemoryStore::new();
        let cluster = stored_cluster(&store).with_topology(Topology::Split);
        let report = teardown(&store, &cluster).unwrap();
        let jobs: Vec<_> = report
            .already_absent
            .iter()
            .filter(|r| r.kind == ResourceKind::ScheduledJob)
            .map(|r| r.name.to_string())
            .collect();
        assert_eq!(jobs, ["curator-app", "curator-infra"]);
    }

    #[test]
    fn prune_removes_only_owned_stale_jobs() {
        let store = MemoryStore::new();
        let cluster = stored_cluster(&store);
        let curator = CuratorSpec::default();
        let primary = desired_job(&cluster, &curator, "img", JobStream::Primary);
        store.create(&primary.clone().into()).unwrap();
        let mut foreign = desired_job(&cluster, &curator, "img", JobStream::Application);
        foreign.metadata.owner_references.clear();
        store.create(&foreign.into()).unwrap();

        let split = cluster.with_topology(Topology::Split);
        let pruned = prune_stale_jobs(&store, &split).unwrap();
        assert_eq!(pruned, [primary.object_ref()]);
        assert!(store
            .get(&ObjectRef::new(ResourceKind::ScheduledJob, "logging", "curator-app"))
            .is_ok());
    }
}
