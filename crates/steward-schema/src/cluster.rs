use crate::meta::{ObjectMeta, OwnerReference, ResourceKind, API_VERSION};
use crate::resources::ResourceRequirements;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("metadata.name must not be empty")]
    EmptyName,
    #[error("metadata.namespace must not be empty")]
    EmptyNamespace,
}

/// Higher-level configuration object owning every managed resource.
///
/// Read-only to the reconciler except for `status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ClusterSpec,
    #[serde(default)]
    pub status: ClusterStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClusterSpec {
    #[serde(default)]
    pub management_state: ManagementState,
    #[serde(default)]
    pub topology: Topology,
    #[serde(default)]
    pub curation: Option<CurationSpec>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ManagementState {
    #[default]
    Managed,
    /// Hands-off: existing resources are neither patched nor deleted.
    Unmanaged,
}

/// Whether the log store exposes one combined endpoint or split app/infra endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    #[default]
    Combined,
    Split,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CurationSpec {
    #[serde(rename = "type", default)]
    pub curation_type: Option<CurationType>,
    #[serde(default)]
    pub curator: CuratorSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CurationType {
    Curator,
    Other(String),
}

impl From<String> for CurationType {
    fn from(s: String) -> Self {
        if s.trim().eq_ignore_ascii_case("curator") {
            CurationType::Curator
        } else {
            CurationType::Other(s)
        }
    }
}

impl From<CurationType> for String {
    fn from(t: CurationType) -> Self {
        match t {
            CurationType::Curator => "curator".to_owned(),
            CurationType::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CuratorSpec {
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub resources: Option<ResourceRequirements>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClusterStatus {
    #[serde(default)]
    pub curation: CurationStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CurationStatus {
    #[serde(default)]
    pub curator_status: Vec<CuratorStatus>,
}

/// Observed state of one scheduled curation job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(deny_unknown_fields)]
pub struct CuratorStatus {
    pub cron_job: String,
    pub schedule: String,
    #[serde(default)]
    pub suspended: bool,
}

/// What the curation section asks for, resolved to a closed set of outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurationMode<'a> {
    Curator(&'a CuratorSpec),
    Disabled,
    /// A backend this build does not know; left alone.
    Unsupported(&'a str),
}

impl ClusterConfig {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            metadata: ObjectMeta::new(name, namespace),
            spec: ClusterSpec::default(),
            status: ClusterStatus::default(),
        }
    }

    #[must_use]
    pub fn with_curator(mut self, curator: CuratorSpec) -> Self {
        self.spec.curation = Some(CurationSpec {
            curation_type: Some(CurationType::Curator),
            curator,
        });
        self
    }

    #[must_use]
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.spec.topology = topology;
        self
    }

    #[must_use]
    pub fn with_management_state(mut self, state: ManagementState) -> Self {
        self.spec.management_state = state;
        self
    }

    pub fn curation_mode(&self) -> CurationMode<'_> {
        match &self.spec.curation {
            Some(CurationSpec {
                curation_type: Some(CurationType::Curator),
                curator,
            }) => CurationMode::Curator(curator),
            Some(CurationSpec {
                curation_type: Some(CurationType::Other(name)),
                ..
            }) if !name.trim().is_empty() => CurationMode::Unsupported(name),
            _ => CurationMode::Disabled,
        }
    }

    pub fn is_managed(&self) -> bool {
        self.spec.management_state == ManagementState::Managed
    }

    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Owner reference stamped onto every resource reconciled for this cluster.
    ///
    /// Only meaningful once the store has assigned a uid; the reconciler
    /// refuses to apply a cluster that has none.
    pub fn as_owner(&self) -> OwnerReference {
        OwnerReference {
            api_version: API_VERSION.to_owned(),
            kind: ResourceKind::ClusterConfig,
            name: self.metadata.name.clone(),
            uid: self.metadata.uid.clone().unwrap_or_default(),
            controller: true,
        }
    }
}

pub fn parse_cluster_str(input: &str) -> Result<ClusterConfig, ConfigError> {
    let cluster: ClusterConfig = toml::from_str(input)?;
    if cluster.metadata.name.trim().is_empty() {
        return Err(ConfigError::EmptyName);
    }
    if cluster.metadata.namespace.trim().is_empty() {
        return Err(ConfigError::EmptyNamespace);
    }
    Ok(cluster)
}

pub fn parse_cluster_file(path: impl AsRef<Path>) -> Result<ClusterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_cluster_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_cluster() {
        let input = r#"
[metadata]
name = "instance"
namespace = "openshift-logging"

[spec]
management_state = "managed"
topology = "split"

[spec.curation]
type = "curator"

[spec.curation.curator]
schedule = "*/10 * * * *"

[spec.curation.curator.resources.limits]
memory = "256Mi"

[spec.curation.curator.resources.requests]
cpu = "200m"
"#;
        let cluster = parse_cluster_str(input).expect("should parse");
        assert_eq!(cluster.metadata.name, "instance");
        assert_eq!(cluster.spec.topology, Topology::Split);
        assert!(cluster.is_managed());
        let CurationMode::Curator(curator) = cluster.curation_mode() else {
            panic!("expected curator mode");
        };
        assert_eq!(curator.schedule.as_deref(), Some("*/10 * * * *"));
        let resources = curator.resources.as_ref().unwrap();
        assert_eq!(resources.limits.memory.as_deref(), Some("256Mi"));
        assert_eq!(resources.requests.cpu.as_deref(), Some("200m"));
    }

    #[test]
    fn parses_minimal_cluster() {
        let input = r#"
[metadata]
name = "instance"
namespace = "logging"
"#;
        let cluster = parse_cluster_str(input).expect("should parse");
        assert_eq!(cluster.spec.topology, Topology::Combined);
        assert_eq!(cluster.spec.management_state, ManagementState::Managed);
        assert_eq!(cluster.curation_mode(), CurationMode::Disabled);
        assert!(cluster.status.curation.curator_status.is_empty());
    }

    #[test]
    fn unknown_backend_is_unsupported() {
        let input = r#"
[metadata]
name = "instance"
namespace = "logging"

[spec.curation]
type = "es-ilm"
"#;
        let cluster = parse_cluster_str(input).unwrap();
        assert_eq!(cluster.curation_mode(), CurationMode::Unsupported("es-ilm"));
    }

    #[test]
    fn curation_without_type_is_disabled() {
        let input = r#"
[metadata]
name = "instance"
namespace = "logging"

[spec.curation.curator]
schedule = "0 0 * * *"
"#;
        let cluster = parse_cluster_str(input).unwrap();
        assert_eq!(cluster.curation_mode(), CurationMode::Disabled);
    }

    #[test]
    fn rejects_unknown_fields() {
        let input = r#"
[metadata]
name = "instance"
namespace = "logging"

[spec]
replicas = 3
"#;
        assert!(parse_cluster_str(input).is_err());
    }

    #[test]
    fn rejects_empty_namespace() {
        let input = r#"
[metadata]
name = "instance"
namespace = ""
"#;
        assert!(matches!(
            parse_cluster_str(input),
            Err(ConfigError::EmptyNamespace)
        ));
    }

    #[test]
    fn curation_type_string_roundtrip() {
        assert_eq!(CurationType::from("Curator".to_owned()), CurationType::Curator);
        assert_eq!(String::from(CurationType::Curator), "curator");
        assert_eq!(
            String::from(CurationType::Other("x".to_owned())),
            "x".to_owned()
        );
    }

    #[test]
    fn owner_reference_points_at_cluster() {
        let mut cluster = ClusterConfig::new("instance", "logging");
        cluster.metadata.uid = Some("abc".into());
        let owner = cluster.as_owner();
        assert_eq!(owner.kind, ResourceKind::ClusterConfig);
        assert_eq!(owner.name, "instance");
        assert_eq!(owner.uid, "abc");
        assert!(owner.controller);
    }

    #[test]
    fn parse_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cluster.toml");
        fs::write(
            &path,
            "[metadata]\nname = \"instance\"\nnamespace = \"logging\"\n",
        )
        .unwrap();
        let cluster = parse_cluster_file(&path).unwrap();
        assert_eq!(cluster.metadata.namespace, "logging");
    }
}
