use crate::types::{Namespace, ResourceName, ResourceVersion, Uid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const API_VERSION: &str = "logging.steward.io/v1";

/// Every kind of resource the store holds on behalf of the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    ClusterConfig,
    Identity,
    ConfigBundle,
    CredentialBundle,
    ScheduledJob,
}

impl ResourceKind {
    /// Kinds owned by a cluster configuration, in teardown order.
    pub const MANAGED: [ResourceKind; 4] = [
        ResourceKind::Identity,
        ResourceKind::ConfigBundle,
        ResourceKind::CredentialBundle,
        ResourceKind::ScheduledJob,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::ClusterConfig => "cluster-config",
            ResourceKind::Identity => "identity",
            ResourceKind::ConfigBundle => "config-bundle",
            ResourceKind::CredentialBundle => "credential-bundle",
            ResourceKind::ScheduledJob => "scheduled-job",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [ResourceKind::ClusterConfig]
            .into_iter()
            .chain(Self::MANAGED)
            .find(|k| k.as_str() == s)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Back-reference from a managed resource to the cluster configuration owning it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: ResourceKind,
    pub name: ResourceName,
    pub uid: Uid,
    #[serde(default)]
    pub controller: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ObjectMeta {
    pub name: ResourceName,
    pub namespace: Namespace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<ResourceVersion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    /// Set when the owner has been asked to go away; reconciliation tears down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<String>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<ResourceName>, namespace: impl Into<Namespace>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Attach `owner`, replacing any existing reference to the same uid.
    pub fn add_owner(&mut self, owner: OwnerReference) {
        self.owner_references.retain(|o| o.uid != owner.uid);
        self.owner_references.push(owner);
    }

    /// The controlling owner, if any.
    pub fn controller(&self) -> Option<&OwnerReference> {
        self.owner_references.iter().find(|o| o.controller)
    }

    pub fn is_owned_by(&self, uid: &Uid) -> bool {
        self.owner_references.iter().any(|o| o.uid == *uid)
    }

    pub fn has_label(&self, key: &str, value: &str) -> bool {
        self.labels.get(key).map(String::as_str) == Some(value)
    }
}

/// Namespace-qualified address of a stored resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ResourceKind,
    pub namespace: Namespace,
    pub name: ResourceName,
}

impl ObjectRef {
    pub fn new(
        kind: ResourceKind,
        namespace: impl Into<Namespace>,
        name: impl Into<ResourceName>,
    ) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// `namespace/name`, the form used in log lines and error messages.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}
