//! Extender wire types (scheduler extender API v1).
//!
//! Field names follow the JSON the scheduler exchanges with extenders, which
//! is not uniformly camelCase (`nodenames`, `podUID`), hence explicit renames.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use schedsim_core::{Extra, Node, Pod};

/// A list of nodes as sent to extenders that are not node-cache capable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub items: Vec<Node>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Node name → reason it was rejected.
pub type FailedNodesMap = BTreeMap<String, String>;

/// Arguments for filter and prioritize calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtenderArgs {
    pub pod: Pod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<NodeList>,
    #[serde(rename = "nodenames", default, skip_serializing_if = "Option::is_none")]
    pub node_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtenderFilterResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<NodeList>,
    #[serde(rename = "nodenames", default, skip_serializing_if = "Option::is_none")]
    pub node_names: Option<Vec<String>>,
    #[serde(rename = "failedNodes", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failed_nodes: FailedNodesMap,
    #[serde(
        rename = "failedAndUnresolvableNodes",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub failed_and_unresolvable_nodes: FailedNodesMap,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPriority {
    pub host: String,
    pub score: i64,
}

pub type HostPriorityList = Vec<HostPriority>;

/// Pods that would be evicted on one node, by full object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Victims {
    #[serde(default)]
    pub pods: Vec<Pod>,
    #[serde(rename = "numPDBViolations", default)]
    pub num_pdb_violations: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaPod {
    pub uid: String,
}

/// Pods that would be evicted on one node, by uid only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaVictims {
    #[serde(default)]
    pub pods: Vec<MetaPod>,
    #[serde(rename = "numPDBViolations", default)]
    pub num_pdb_violations: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtenderPreemptionArgs {
    pub pod: Pod,
    #[serde(rename = "nodeNameToVictims", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_name_to_victims: BTreeMap<String, Victims>,
    #[serde(
        rename = "nodeNameToMetaVictims",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub node_name_to_meta_victims: BTreeMap<String, MetaVictims>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtenderPreemptionResult {
    #[serde(
        rename = "nodeNameToMetaVictims",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub node_name_to_meta_victims: BTreeMap<String, MetaVictims>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtenderBindingArgs {
    #[serde(rename = "podName")]
    pub pod_name: String,
    #[serde(rename = "podNamespace")]
    pub pod_namespace: String,
    #[serde(rename = "podUID", default)]
    pub pod_uid: String,
    pub node: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtenderBindingResult {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}
