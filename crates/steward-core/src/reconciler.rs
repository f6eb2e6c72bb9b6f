use crate::creator::{ensure_created, Creation};
use crate::drift::{reconcile_scheduled_job, JobOutcome};
use crate::factory::{desired_resources, JobStream};
use crate::retry::RetryPolicy;
use crate::sources::BundleSources;
use crate::status::{derive_status, sync_status};
use crate::teardown::{prune_stale_jobs, remove_all, teardown, TeardownReport};
use crate::{CoreError, Operation};
use serde::Serialize;
use std::fmt;
use steward_schema::{
    ClusterConfig, CurationMode, CuratorSpec, Object, ObjectRef, ReconcilerSettings,
    ResourceKind,
};
use steward_store::{ResourceStore, TypedStore};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Applied,
    TornDown,
    Skipped(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied => write!(f, "applied"),
            Outcome::TornDown => write!(f, "torn down"),
            Outcome::Skipped(reason) => write!(f, "skipped ({reason})"),
        }
    }
}

/// Everything one reconciliation pass did, for drivers to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub cluster: String,
    pub outcome: Outcome,
    pub created: Vec<ObjectRef>,
    pub jobs: Vec<JobOutcome>,
    pub pruned: Vec<ObjectRef>,
    pub deleted: Vec<ObjectRef>,
    pub status_written: bool,
}

impl ReconcileReport {
    fn new(cluster: &ClusterConfig, outcome: Outcome) -> Self {
        Self {
            cluster: cluster.object_ref().qualified_name(),
            outcome,
            created: Vec::new(),
            jobs: Vec::new(),
            pruned: Vec::new(),
            deleted: Vec::new(),
            status_written: false,
        }
    }

    fn torn_down(cluster: &ClusterConfig, report: TeardownReport) -> Self {
        let mut this = Self::new(cluster, Outcome::TornDown);
        this.deleted = report.deleted;
        this
    }

    /// Number of scheduled jobs that needed at least one field patched.
    pub fn patched_jobs(&self) -> usize {
        self.jobs.iter().filter(|j| !j.patched.is_empty()).count()
    }

    /// Whether the pass wrote nothing at all.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.patched_jobs() == 0
            && self.pruned.is_empty()
            && self.deleted.is_empty()
            && !self.status_written
    }
}

/// Drives the store toward the state one cluster configuration asks for.
///
/// A pass is synchronous and stops at the first fatal error; whatever it
/// already wrote stays written and the next pass picks up from there.
pub struct Reconciler<'a> {
    store: &'a dyn ResourceStore,
    settings: ReconcilerSettings,
    policy: RetryPolicy,
    sources: Option<BundleSources>,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn ResourceStore, settings: ReconcilerSettings) -> Self {
        let policy = RetryPolicy::from(&settings.retry);
        Self {
            store,
            settings,
            policy,
            sources: None,
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use preloaded bundle contents instead of reading the configured directories.
    #[must_use]
    pub fn with_sources(mut self, sources: BundleSources) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    /// Fetch the named cluster configuration and reconcile it.
    pub fn reconcile_stored(&self, object: &ObjectRef) -> Result<ReconcileReport, CoreError> {
        let cluster: ClusterConfig = match self.store.get_as(object) {
            Ok(c) => c,
            Err(e) if e.is_not_found() => {
                debug!("{object} not found, nothing to reconcile");
                let placeholder = ClusterConfig::new(&object.name, &object.namespace);
                return Ok(ReconcileReport::new(
                    &placeholder,
                    Outcome::Skipped("cluster configuration not found".to_owned()),
                ));
            }
            Err(e) => return Err(CoreError::resource(Operation::Fetch, object, e)),
        };
        self.reconcile(&cluster)
    }

    pub fn reconcile(&self, cluster: &ClusterConfig) -> Result<ReconcileReport, CoreError> {
        let name = cluster.object_ref().qualified_name();
        info!("reconciling curation for {name}");

        if cluster.is_being_deleted() {
            info!("{name} is being deleted, removing curation resources");
            let report = remove_all(self.store, cluster, &JobStream::ALL)?;
            return Ok(ReconcileReport::torn_down(cluster, report));
        }

        match cluster.curation_mode() {
            CurationMode::Curator(curator) => self.apply(cluster, curator),
            CurationMode::Disabled => {
                let report = teardown(self.store, cluster)?;
                if report.skipped {
                    return Ok(ReconcileReport::new(
                        cluster,
                        Outcome::Skipped("unmanaged".to_owned()),
                    ));
                }
                Ok(ReconcileReport::torn_down(cluster, report))
            }
            CurationMode::Unsupported(kind) => {
                warn!("{name}: curation type '{kind}' is not supported, leaving resources alone");
                Ok(ReconcileReport::new(
                    cluster,
                    Outcome::Skipped(format!("unsupported curation type '{kind}'")),
                ))
            }
        }
    }

    fn apply(
        &self,
        cluster: &ClusterConfig,
        curator: &CuratorSpec,
    ) -> Result<ReconcileReport, CoreError> {
        // Every owner reference must name a real uid.
        if cluster.metadata.uid.is_none() {
            return Err(CoreError::Unstored(cluster.object_ref()));
        }
        let loaded;
        let sources = match &self.sources {
            Some(s) => s,
            None => {
                loaded = BundleSources::load(&self.settings.config_dir, &self.settings.working_dir);
                &loaded
            }
        };
        let desired = desired_resources(cluster, curator, &self.settings.curator_image, sources);
        let mut report = ReconcileReport::new(cluster, Outcome::Applied);

        for resource in desired.static_resources() {
            if ensure_created(self.store, &resource)? == Creation::Created {
                report.created.push(resource.object_ref());
            }
        }

        let managed = cluster.is_managed();
        for (stream, job) in &desired.jobs {
            let outcome = reconcile_scheduled_job(self.store, *stream, job, managed, &self.policy)?;
            if outcome.created {
                report.created.push(ObjectRef::new(
                    ResourceKind::ScheduledJob,
                    cluster.metadata.namespace.clone(),
                    outcome.name.as_str(),
                ));
            }
            report.jobs.push(outcome);
        }

        if self.settings.prune_stale_topology && managed {
            report.pruned = prune_stale_jobs(self.store, cluster)?;
        }

        let status = derive_status(self.store, &cluster.metadata.namespace)?;
        report.status_written = sync_status(self.store, cluster, &status, &self.policy)?;
        Ok(report)
    }
}
