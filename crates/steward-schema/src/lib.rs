//! Cluster configuration, managed resource types, and settings for Steward.
//!
//! This crate defines the schema layer: the `ClusterConfig` owner object parsed
//! from TOML, the managed resource kinds (`Identity`, `ConfigBundle`,
//! `CredentialBundle`, `ScheduledJob`) joined in the tagged `Resource` union,
//! object metadata with owner references and version tokens, and the
//! process-level `ReconcilerSettings`.

pub mod cluster;
pub mod meta;
pub mod resources;
pub mod settings;
pub mod types;

pub use cluster::{
    parse_cluster_file, parse_cluster_str, ClusterConfig, ClusterSpec, ClusterStatus,
    ConfigError, CurationMode, CurationSpec, CurationStatus, CurationType, CuratorSpec,
    CuratorStatus, ManagementState, Topology,
};
pub use meta::{ObjectMeta, ObjectRef, OwnerReference, ResourceKind, API_VERSION};
pub use resources::{
    ConcurrencyPolicy, ConfigBundle, Container, CredentialBundle, EnvVar, Identity, JobTemplate,
    Object, PodTemplate, PullPolicy, Resource, ResourceList, ResourceRequirements, RestartPolicy,
    ScheduledJob, ScheduledJobSpec, Volume, VolumeMount, VolumeSource,
};
pub use settings::{
    parse_settings_file, parse_settings_str, ReconcilerSettings, RetrySettings,
    DEFAULT_CURATOR_IMAGE,
};
pub use types::{Namespace, ResourceName, ResourceVersion, Uid};
