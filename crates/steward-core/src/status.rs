use crate::factory::INFRA_LABEL;
use crate::retry::{retry_on_conflict, RetryPolicy};
use crate::{CoreError, Operation};
use steward_schema::{
    ClusterConfig, CurationStatus, CuratorStatus, Namespace, Object, ResourceKind, ScheduledJob,
};
use steward_store::{ResourceStore, TypedStore};
use tracing::{debug, info};

/// Observed state of every curation job in `namespace`, sorted by job name.
pub fn derive_status(
    store: &dyn ResourceStore,
    namespace: &Namespace,
) -> Result<CurationStatus, CoreError> {
    let jobs: Vec<ScheduledJob> = store.list_as(namespace).map_err(|source| CoreError::List {
        kind: ResourceKind::ScheduledJob,
        namespace: namespace.to_string(),
        source,
    })?;

    let mut curator_status: Vec<CuratorStatus> = jobs
        .iter()
        .filter(|job| job.metadata.has_label(INFRA_LABEL.0, INFRA_LABEL.1))
        .map(|job| CuratorStatus {
            cron_job: job.metadata.name.to_string(),
            schedule: job.spec.schedule.clone(),
            suspended: job.spec.suspend.unwrap_or(false),
        })
        .collect();
    curator_status.sort();
    Ok(CurationStatus { curator_status })
}

/// Write `status` into the stored copy of `cluster` when it differs.
///
/// Returns whether a write happened. A cluster configuration that no longer
/// exists is not an error; there is nothing left to report to.
pub fn sync_status(
    store: &dyn ResourceStore,
    cluster: &ClusterConfig,
    status: &CurationStatus,
    policy: &RetryPolicy,
) -> Result<bool, CoreError> {
    let object = cluster.object_ref();
    let mut announced = false;

    retry_on_conflict(policy, |_attempt| {
        let mut current: ClusterConfig = match store.get_as(&object) {
            Ok(c) => c,
            Err(e) if e.is_not_found() => {
                debug!("{object} is gone, skipping status update");
                return Ok(false);
            }
            Err(e) => return Err(CoreError::resource(Operation::Fetch, &object, e)),
        };
        if current.status.curation == *status {
            return Ok(false);
        }
        if !announced {
            info!("updating status of curator for {}", object.qualified_name());
            announced = true;
        }
        current.status.curation = status.clone();
        store
            .update(&current.into_resource())
            .map_err(|e| CoreError::resource(Operation::Update, &object, e))?;
        Ok(true)
    })
}
