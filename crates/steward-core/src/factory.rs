//! Desired-state factory: pure functions from a [`ClusterConfig`] to the
//! canonical resources the reconciler drives the store toward.

use crate::sources::BundleSources;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use steward_schema::{
    ClusterConfig, ConcurrencyPolicy, ConfigBundle, Container, CredentialBundle, CuratorSpec,
    EnvVar, Identity, JobTemplate, ObjectMeta, ObjectRef, PodTemplate, PullPolicy, Resource,
    ResourceKind, ResourceList, ResourceRequirements, RestartPolicy, ScheduledJob,
    ScheduledJobSpec, Topology, Volume, VolumeMount, VolumeSource,
};

pub const DEFAULT_SCHEDULE: &str = "30 3,9,15,21 * * *";
pub const DEFAULT_MEMORY: &str = "200Mi";
pub const DEFAULT_CPU_REQUEST: &str = "100m";

/// Name shared by the identity, both bundles, the container, and the primary job.
pub const CURATOR_NAME: &str = "curator";

/// Label selecting every scheduled job this engine manages.
pub const INFRA_LABEL: (&str, &str) = ("logging-infra", "curator");

const API_SERVER_URL: &str = "https://kubernetes.default.svc.cluster.local";
const KEYS_DIR: &str = "/etc/curator/keys";
const SETTINGS_DIR: &str = "/etc/curator/settings";
const TERMINATION_GRACE_SECONDS: u64 = 600;

/// One log stream a scheduled job curates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStream {
    Primary,
    Application,
    Infrastructure,
}

impl JobStream {
    pub const ALL: [JobStream; 3] = [
        JobStream::Primary,
        JobStream::Application,
        JobStream::Infrastructure,
    ];

    pub fn logical_name(self) -> &'static str {
        match self {
            JobStream::Primary => "primary",
            JobStream::Application => "application-stream",
            JobStream::Infrastructure => "infrastructure-stream",
        }
    }

    pub fn job_name(self) -> &'static str {
        match self {
            JobStream::Primary => CURATOR_NAME,
            JobStream::Application => "curator-app",
            JobStream::Infrastructure => "curator-infra",
        }
    }

    /// Log store endpoint the job's container talks to.
    pub fn endpoint(self) -> &'static str {
        match self {
            JobStream::Primary => "elasticsearch",
            JobStream::Application => "elasticsearch-app",
            JobStream::Infrastructure => "elasticsearch-infra",
        }
    }

    pub fn for_topology(topology: Topology) -> &'static [JobStream] {
        match topology {
            Topology::Combined => &[JobStream::Primary],
            Topology::Split => &[JobStream::Application, JobStream::Infrastructure],
        }
    }

    pub fn from_job_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.job_name() == name)
    }
}

impl fmt::Display for JobStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.logical_name())
    }
}

/// Everything one cluster configuration asks to exist.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedResourceSet {
    pub identity: Identity,
    pub config_bundle: ConfigBundle,
    pub credential_bundle: CredentialBundle,
    pub jobs: Vec<(JobStream, ScheduledJob)>,
}

impl ManagedResourceSet {
    /// The write-once resources, in creation order.
    pub fn static_resources(&self) -> [Resource; 3] {
        [
            self.identity.clone().into(),
            self.config_bundle.clone().into(),
            self.credential_bundle.clone().into(),
        ]
    }
}

fn owned_meta(cluster: &ClusterConfig, name: &str) -> ObjectMeta {
    let mut meta = ObjectMeta::new(name, cluster.metadata.namespace.clone());
    meta.add_owner(cluster.as_owner());
    meta
}

/// Build the full desired set for `cluster`.
///
/// `curator` is the resolved curator section; callers that have not yet
/// resolved the curation mode can pass `CuratorSpec::default()`.
pub fn desired_resources(
    cluster: &ClusterConfig,
    curator: &CuratorSpec,
    image: &str,
    sources: &BundleSources,
) -> ManagedResourceSet {
    let jobs = JobStream::for_topology(cluster.spec.topology)
        .iter()
        .map(|&stream| (stream, desired_job(cluster, curator, image, stream)))
        .collect();

    ManagedResourceSet {
        identity: Identity {
            metadata: owned_meta(cluster, CURATOR_NAME),
        },
        config_bundle: ConfigBundle {
            metadata: owned_meta(cluster, CURATOR_NAME),
            data: sources.config_data(),
        },
        credential_bundle: CredentialBundle {
            metadata: owned_meta(cluster, CURATOR_NAME),
            data: sources.credential_data(),
        },
        jobs,
    }
}

/// The requirements the cluster supplies, used as written; the defaults apply
/// only when it supplies none.
pub fn default_resources(supplied: Option<&ResourceRequirements>) -> ResourceRequirements {
    supplied.cloned().unwrap_or_else(|| ResourceRequirements {
        limits: ResourceList {
            memory: Some(DEFAULT_MEMORY.to_owned()),
            cpu: None,
        },
        requests: ResourceList {
            memory: Some(DEFAULT_MEMORY.to_owned()),
            cpu: Some(DEFAULT_CPU_REQUEST.to_owned()),
        },
    })
}

pub fn desired_job(
    cluster: &ClusterConfig,
    curator: &CuratorSpec,
    image: &str,
    stream: JobStream,
) -> ScheduledJob {
    let name = stream.job_name();
    let schedule = curator
        .schedule
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SCHEDULE);

    let container = Container {
        name: CURATOR_NAME.to_owned(),
        image: image.to_owned(),
        pull_policy: PullPolicy::IfNotPresent,
        resources: default_resources(curator.resources.as_ref()),
        env: vec![
            EnvVar::new("K8S_HOST_URL", API_SERVER_URL),
            EnvVar::new("ES_HOST", stream.endpoint()),
            EnvVar::new("ES_PORT", "9200"),
            EnvVar::new("ES_CLIENT_CERT", &format!("{KEYS_DIR}/cert")),
            EnvVar::new("ES_CLIENT_KEY", &format!("{KEYS_DIR}/key")),
            EnvVar::new("ES_CA", &format!("{KEYS_DIR}/ca")),
            EnvVar::new("CURATOR_DEFAULT_DAYS", "30"),
            EnvVar::new("CURATOR_SCRIPT_LOG_LEVEL", "INFO"),
            EnvVar::new("CURATOR_LOG_LEVEL", "ERROR"),
            EnvVar::new("CURATOR_TIMEOUT", "300"),
        ],
        volume_mounts: vec![
            VolumeMount {
                name: "certs".to_owned(),
                mount_path: KEYS_DIR.to_owned(),
                read_only: true,
            },
            VolumeMount {
                name: "config".to_owned(),
                mount_path: SETTINGS_DIR.to_owned(),
                read_only: true,
            },
        ],
    };

    let mut labels = BTreeMap::new();
    labels.insert("provider".to_owned(), "openshift".to_owned());
    labels.insert("component".to_owned(), name.to_owned());
    labels.insert(INFRA_LABEL.0.to_owned(), INFRA_LABEL.1.to_owned());

    let pod = PodTemplate {
        labels: labels.clone(),
        service_account: CURATOR_NAME.into(),
        containers: vec![container],
        volumes: vec![
            Volume {
                name: "config".to_owned(),
                source: VolumeSource::ConfigBundle(CURATOR_NAME.into()),
            },
            Volume {
                name: "certs".to_owned(),
                source: VolumeSource::CredentialBundle(CURATOR_NAME.into()),
            },
        ],
        restart_policy: RestartPolicy::Never,
        termination_grace_period_seconds: TERMINATION_GRACE_SECONDS,
    };

    let mut metadata = owned_meta(cluster, name);
    metadata.labels = labels;

    ScheduledJob {
        metadata,
        spec: ScheduledJobSpec {
            schedule: schedule.to_owned(),
            suspend: None,
            concurrency_policy: ConcurrencyPolicy::Forbid,
            successful_jobs_history_limit: 1,
            failed_jobs_history_limit: 1,
            job_template: JobTemplate {
                backoff_limit: 0,
                parallelism: 1,
                pod,
            },
        },
    }
}

/// References to every resource a teardown over `streams` must remove, in
/// deletion order.
pub fn managed_refs(cluster: &ClusterConfig, streams: &[JobStream]) -> Vec<ObjectRef> {
    let ns = &cluster.metadata.namespace;
    let mut refs: Vec<ObjectRef> = ResourceKind::MANAGED
        .into_iter()
        .filter(|k| *k != ResourceKind::ScheduledJob)
        .map(|kind| ObjectRef::new(kind, ns.clone(), CURATOR_NAME))
        .collect();
    refs.extend(
        streams
            .iter()
            .map(|s| ObjectRef::new(ResourceKind::ScheduledJob, ns.clone(), s.job_name())),
    );
    refs
}
