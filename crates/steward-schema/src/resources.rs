//! Managed resource kinds and the tagged [`Resource`] union the store persists.

use crate::cluster::ClusterConfig;
use crate::meta::{ObjectMeta, ObjectRef, ResourceKind};
use crate::types::ResourceName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Service identity the scheduled jobs run as.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Identity {
    pub metadata: ObjectMeta,
}

/// Plain-text configuration files mounted into the job container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigBundle {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Certificate material mounted into the job container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CredentialBundle {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub data: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScheduledJob {
    pub metadata: ObjectMeta,
    pub spec: ScheduledJobSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScheduledJobSpec {
    pub schedule: String,
    #[serde(default)]
    pub suspend: Option<bool>,
    pub concurrency_policy: ConcurrencyPolicy,
    pub successful_jobs_history_limit: u32,
    pub failed_jobs_history_limit: u32,
    pub job_template: JobTemplate,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyPolicy {
    Allow,
    #[default]
    Forbid,
    Replace,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct JobTemplate {
    pub backoff_limit: u32,
    pub parallelism: u32,
    pub pod: PodTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PodTemplate {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub service_account: ResourceName,
    pub containers: Vec<Container>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    pub restart_policy: RestartPolicy,
    pub termination_grace_period_seconds: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RestartPolicy {
    Always,
    OnFailure,
    #[default]
    Never,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PullPolicy {
    Always,
    #[default]
    IfNotPresent,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub pull_policy: PullPolicy,
    #[serde(default)]
    pub resources: ResourceRequirements,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_owned(),
            value: value.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Volume {
    pub name: String,
    pub source: VolumeSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeSource {
    ConfigBundle(ResourceName),
    CredentialBundle(ResourceName),
}

/// Memory and CPU quantities, kept as the strings the user wrote (`"200Mi"`, `"100m"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResourceList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub limits: ResourceList,
    #[serde(default)]
    pub requests: ResourceList,
}

impl ScheduledJob {
    /// Image of the first container; the job template only ever defines one.
    pub fn primary_image(&self) -> Option<&str> {
        self.spec
            .job_template
            .pod
            .containers
            .first()
            .map(|c| c.image.as_str())
    }

    pub fn primary_container_mut(&mut self) -> Option<&mut Container> {
        self.spec.job_template.pod.containers.first_mut()
    }
}

/// Typed view over one resource kind.
pub trait Object: Clone + Sized {
    const KIND: ResourceKind;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn into_resource(self) -> Resource;

    /// Narrow a [`Resource`] to this kind, handing it back on mismatch.
    fn from_resource(resource: Resource) -> Result<Self, Resource>;

    fn object_ref(&self) -> ObjectRef {
        let meta = self.meta();
        ObjectRef::new(Self::KIND, meta.namespace.clone(), meta.name.clone())
    }
}

/// Any resource the store can hold, tagged by kind on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Resource {
    ClusterConfig(ClusterConfig),
    Identity(Identity),
    ConfigBundle(ConfigBundle),
    CredentialBundle(CredentialBundle),
    ScheduledJob(ScheduledJob),
}

macro_rules! impl_object {
    ($ty:ident) => {
        impl Object for $ty {
            const KIND: ResourceKind = ResourceKind::$ty;

            fn meta(&self) -> &ObjectMeta {
                &self.metadata
            }

            fn meta_mut(&mut self) -> &mut ObjectMeta {
                &mut self.metadata
            }

            fn into_resource(self) -> Resource {
                Resource::$ty(self)
            }

            fn from_resource(resource: Resource) -> Result<Self, Resource> {
                match resource {
                    Resource::$ty(inner) => Ok(inner),
                    other => Err(other),
                }
            }
        }

        impl From<$ty> for Resource {
            fn from(value: $ty) -> Self {
                Resource::$ty(value)
            }
        }
    };
}

impl_object!(ClusterConfig);
impl_object!(Identity);
impl_object!(ConfigBundle);
impl_object!(CredentialBundle);
impl_object!(ScheduledJob);

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::ClusterConfig(_) => ResourceKind::ClusterConfig,
            Resource::Identity(_) => ResourceKind::Identity,
            Resource::ConfigBundle(_) => ResourceKind::ConfigBundle,
            Resource::CredentialBundle(_) => ResourceKind::CredentialBundle,
            Resource::ScheduledJob(_) => ResourceKind::ScheduledJob,
        }
    }

    pub fn meta(&self) -> &ObjectMeta {
        match self {
            Resource::ClusterConfig(r) => &r.metadata,
            Resource::Identity(r) => &r.metadata,
            Resource::ConfigBundle(r) => &r.metadata,
            Resource::CredentialBundle(r) => &r.metadata,
            Resource::ScheduledJob(r) => &r.metadata,
        }
    }

    pub fn meta_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Resource::ClusterConfig(r) => &mut r.metadata,
            Resource::Identity(r) => &mut r.metadata,
            Resource::ConfigBundle(r) => &mut r.metadata,
            Resource::CredentialBundle(r) => &mut r.metadata,
            Resource::ScheduledJob(r) => &mut r.metadata,
        }
    }

    pub fn object_ref(&self) -> ObjectRef {
        let meta = self.meta();
        ObjectRef::new(self.kind(), meta.namespace.clone(), meta.name.clone())
    }
}
