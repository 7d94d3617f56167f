//! Resource model for the tracked Kubernetes kinds.
//!
//! Each kind is a generic struct over its metadata type. The default
//! `ObjectMeta` is what a backing store hands out (server-assigned `uid`,
//! `resourceVersion`, ...). `ObjectMetaApply` is the desired-state form that
//! is submitted on apply: every field optional, nothing server-populated.
//!
//! Fields the simulator does not inspect are kept in flattened JSON maps so
//! an export/import cycle does not lose user data.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unmodelled JSON fields, preserved verbatim.
pub type Extra = Map<String, Value>;

/// Metadata keys populated by the API server that must not be re-submitted.
const SERVER_POPULATED_META: &[&str] = &[
    "resourceVersion",
    "creationTimestamp",
    "managedFields",
    "generation",
    "selfLink",
    "deletionTimestamp",
    "deletionGracePeriodSeconds",
];

/// Phase reported by a PersistentVolume that is bound to a claim.
pub const PHASE_BOUND: &str = "Bound";

// ── Kinds ──────────────────────────────────────────────────────────

/// One tracked object category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Pod,
    Node,
    PersistentVolume,
    PersistentVolumeClaim,
    StorageClass,
    PriorityClass,
    Namespace,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Pod,
        ResourceKind::Node,
        ResourceKind::PersistentVolume,
        ResourceKind::PersistentVolumeClaim,
        ResourceKind::StorageClass,
        ResourceKind::PriorityClass,
        ResourceKind::Namespace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "Pod",
            ResourceKind::Node => "Node",
            ResourceKind::PersistentVolume => "PersistentVolume",
            ResourceKind::PersistentVolumeClaim => "PersistentVolumeClaim",
            ResourceKind::StorageClass => "StorageClass",
            ResourceKind::PriorityClass => "PriorityClass",
            ResourceKind::Namespace => "Namespace",
        }
    }

    /// `apiVersion` stamped on objects of this kind when applied.
    pub fn api_version(&self) -> &'static str {
        match self {
            ResourceKind::StorageClass => "storage.k8s.io/v1",
            ResourceKind::PriorityClass => "scheduling.k8s.io/v1",
            _ => "v1",
        }
    }

    pub fn is_namespaced(&self) -> bool {
        matches!(
            self,
            ResourceKind::Pod | ResourceKind::PersistentVolumeClaim
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Metadata ───────────────────────────────────────────────────────

/// Metadata of a stored object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Identity assigned by the cluster the object lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ObjectMeta {
    pub fn new(name: &str, namespace: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Desired-state metadata submitted on apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetaApply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ObjectMetaApply {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Remove server-populated keys that arrived through unmodelled JSON,
    /// e.g. when a stored object was deserialized as a desired state.
    pub fn strip_server_populated(&mut self) {
        for key in SERVER_POPULATED_META {
            self.extra.remove(*key);
        }
    }
}

impl From<ObjectMeta> for ObjectMetaApply {
    fn from(meta: ObjectMeta) -> Self {
        let mut extra = meta.extra;
        for key in SERVER_POPULATED_META {
            extra.remove(*key);
        }
        Self {
            name: Some(meta.name),
            namespace: meta.namespace,
            uid: meta.uid,
            labels: meta.labels,
            annotations: meta.annotations,
            extra,
        }
    }
}

/// Reference from one object to another (e.g. a volume's claim).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

// ── Resource trait ────────────────────────────────────────────────

/// A stored object of one tracked kind together with its desired-state form.
pub trait Resource: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    const KIND: ResourceKind;

    /// Partial representation submitted on apply.
    type Desired: Clone + Send + Sync + Serialize + DeserializeOwned + 'static;

    fn metadata(&self) -> &ObjectMeta;

    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    fn desired_metadata(desired: &Self::Desired) -> &ObjectMetaApply;

    fn desired_metadata_mut(desired: &mut Self::Desired) -> &mut ObjectMetaApply;

    /// Drop server-populated state, keeping everything a user could have set.
    fn into_desired(self) -> Self::Desired;

    /// Materialize a desired state into a stored object.
    fn from_desired(
        desired: Self::Desired,
        metadata: impl FnOnce(ObjectMetaApply) -> ObjectMeta,
    ) -> Self;

    /// Set `apiVersion`/`kind` on a desired state.
    fn stamp_type(desired: &mut Self::Desired);
}

macro_rules! opaque_resource {
    ($(#[$doc:meta])* $ty:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $ty<M = ObjectMeta> {
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub api_version: Option<String>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub kind: Option<String>,
            pub metadata: M,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub spec: Option<Value>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub status: Option<Value>,
        }

        impl<M> $ty<M> {
            pub fn map_metadata<N>(self, f: impl FnOnce(M) -> N) -> $ty<N> {
                $ty {
                    api_version: self.api_version,
                    kind: self.kind,
                    metadata: f(self.metadata),
                    spec: self.spec,
                    status: self.status,
                }
            }
        }

        impl $ty {
            pub fn new(name: &str, namespace: Option<&str>) -> Self {
                Self {
                    api_version: None,
                    kind: None,
                    metadata: ObjectMeta::new(name, namespace),
                    spec: None,
                    status: None,
                }
            }
        }
    };
}

macro_rules! impl_resource {
    ($ty:ident, $kind:expr) => {
        impl Resource for $ty {
            const KIND: ResourceKind = $kind;
            type Desired = $ty<ObjectMetaApply>;

            fn metadata(&self) -> &ObjectMeta {
                &self.metadata
            }

            fn metadata_mut(&mut self) -> &mut ObjectMeta {
                &mut self.metadata
            }

            fn desired_metadata(desired: &Self::Desired) -> &ObjectMetaApply {
                &desired.metadata
            }

            fn desired_metadata_mut(desired: &mut Self::Desired) -> &mut ObjectMetaApply {
                &mut desired.metadata
            }

            fn into_desired(self) -> Self::Desired {
                self.map_metadata(ObjectMetaApply::from)
            }

            fn from_desired(
                desired: Self::Desired,
                metadata: impl FnOnce(ObjectMetaApply) -> ObjectMeta,
            ) -> Self {
                desired.map_metadata(metadata)
            }

            fn stamp_type(desired: &mut Self::Desired) {
                desired.api_version = Some(Self::KIND.api_version().to_string());
                desired.kind = Some(Self::KIND.as_str().to_string());
            }
        }
    };
}

opaque_resource!(
    /// A workload pod. Spec and status are carried opaquely.
    Pod
);
opaque_resource!(
    /// A cluster node.
    Node
);
opaque_resource!(
    /// A namespaced claim on persistent storage.
    PersistentVolumeClaim
);
opaque_resource!(
    /// A namespace.
    Namespace
);

/// A persistent volume. The claim reference and phase are modelled because
/// import has to rewrite the former based on the latter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolume<M = ObjectMeta> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub metadata: M,
    #[serde(default)]
    pub spec: PersistentVolumeSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PersistentVolumeStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_ref: Option<ObjectReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl<M> PersistentVolume<M> {
    pub fn map_metadata<N>(self, f: impl FnOnce(M) -> N) -> PersistentVolume<N> {
        PersistentVolume {
            api_version: self.api_version,
            kind: self.kind,
            metadata: f(self.metadata),
            spec: self.spec,
            status: self.status,
        }
    }

    /// Whether the last observed phase is `Bound`.
    pub fn is_bound(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .is_some_and(|phase| phase == PHASE_BOUND)
    }
}

impl PersistentVolume {
    pub fn new(name: &str) -> Self {
        Self {
            api_version: None,
            kind: None,
            metadata: ObjectMeta::new(name, None),
            spec: PersistentVolumeSpec::default(),
            status: None,
        }
    }
}

/// A storage class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageClass<M = ObjectMeta> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub metadata: M,
    #[serde(default)]
    pub provisioner: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclaim_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_binding_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_volume_expansion: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl<M> StorageClass<M> {
    pub fn map_metadata<N>(self, f: impl FnOnce(M) -> N) -> StorageClass<N> {
        StorageClass {
            api_version: self.api_version,
            kind: self.kind,
            metadata: f(self.metadata),
            provisioner: self.provisioner,
            parameters: self.parameters,
            reclaim_policy: self.reclaim_policy,
            volume_binding_mode: self.volume_binding_mode,
            allow_volume_expansion: self.allow_volume_expansion,
            extra: self.extra,
        }
    }
}

impl StorageClass {
    pub fn new(name: &str, provisioner: &str) -> Self {
        Self {
            api_version: None,
            kind: None,
            metadata: ObjectMeta::new(name, None),
            provisioner: provisioner.to_string(),
            parameters: BTreeMap::new(),
            reclaim_policy: None,
            volume_binding_mode: None,
            allow_volume_expansion: None,
            extra: Extra::new(),
        }
    }
}

/// A pod priority class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityClass<M = ObjectMeta> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub metadata: M,
    #[serde(default)]
    pub value: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preemption_policy: Option<String>,
}

impl<M> PriorityClass<M> {
    pub fn map_metadata<N>(self, f: impl FnOnce(M) -> N) -> PriorityClass<N> {
        PriorityClass {
            api_version: self.api_version,
            kind: self.kind,
            metadata: f(self.metadata),
            value: self.value,
            global_default: self.global_default,
            description: self.description,
            preemption_policy: self.preemption_policy,
        }
    }
}

impl PriorityClass {
    pub fn new(name: &str, value: i32) -> Self {
        Self {
            api_version: None,
            kind: None,
            metadata: ObjectMeta::new(name, None),
            value,
            global_default: None,
            description: None,
            preemption_policy: None,
        }
    }
}

impl_resource!(Pod, ResourceKind::Pod);
impl_resource!(Node, ResourceKind::Node);
impl_resource!(PersistentVolume, ResourceKind::PersistentVolume);
impl_resource!(PersistentVolumeClaim, ResourceKind::PersistentVolumeClaim);
impl_resource!(StorageClass, ResourceKind::StorageClass);
impl_resource!(PriorityClass, ResourceKind::PriorityClass);
impl_resource!(Namespace, ResourceKind::Namespace);

// ── Desired-state aliases ─────────────────────────────────────────

pub type PodApply = Pod<ObjectMetaApply>;
pub type NodeApply = Node<ObjectMetaApply>;
pub type PersistentVolumeApply = PersistentVolume<ObjectMetaApply>;
pub type PersistentVolumeClaimApply = PersistentVolumeClaim<ObjectMetaApply>;
pub type StorageClassApply = StorageClass<ObjectMetaApply>;
pub type PriorityClassApply = PriorityClass<ObjectMetaApply>;
pub type NamespaceApply = Namespace<ObjectMetaApply>;
