//! Reserved-name predicates.
//!
//! Kubernetes reserves the `kube-` namespace prefix and the `system-`
//! priority class prefix; objects carrying those names (and the `default`
//! namespace, which always exists) are never exported or imported.

use crate::resources::ResourceKind;

/// Prefix reserved for system namespaces.
pub const SYSTEM_NAMESPACE_PREFIX: &str = "kube-";

/// Prefix reserved for system priority classes.
pub const SYSTEM_PRIORITY_CLASS_PREFIX: &str = "system-";

/// The namespace every cluster starts with.
pub const DEFAULT_NAMESPACE: &str = "default";

pub fn has_reserved_prefix(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix)
}

pub fn is_system_namespace(name: &str) -> bool {
    has_reserved_prefix(name, SYSTEM_NAMESPACE_PREFIX)
}

pub fn is_system_priority_class(name: &str) -> bool {
    has_reserved_prefix(name, SYSTEM_PRIORITY_CLASS_PREFIX)
}

/// Namespaces that are never carried in a snapshot: system ones and `default`.
pub fn is_ignored_namespace(name: &str) -> bool {
    is_system_namespace(name) || name == DEFAULT_NAMESPACE
}

/// Whether an object of `kind` with the given name and namespace is left out
/// of snapshots.
///
/// Namespaced objects follow their namespace: anything living in a system
/// namespace or in `default` is excluded.
pub fn is_excluded(kind: ResourceKind, name: &str, namespace: Option<&str>) -> bool {
    match kind {
        ResourceKind::Namespace => is_ignored_namespace(name),
        ResourceKind::PriorityClass => is_system_priority_class(name),
        _ => namespace.is_some_and(is_ignored_namespace),
    }
}
