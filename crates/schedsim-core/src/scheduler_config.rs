//! Scheduler configuration carried in snapshots.
//!
//! Only the parts the simulator reads are modelled; everything else rides
//! along in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resources::Extra;

pub const SCHEDULER_CONFIG_API_VERSION: &str = "kubescheduler.config.k8s.io/v1beta2";
pub const SCHEDULER_CONFIG_KIND: &str = "KubeSchedulerConfiguration";
pub const DEFAULT_SCHEDULER_NAME: &str = "default-scheduler";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<SchedulerProfile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extenders: Vec<ExtenderConfig>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            api_version: Some(SCHEDULER_CONFIG_API_VERSION.to_string()),
            kind: Some(SCHEDULER_CONFIG_KIND.to_string()),
            parallelism: None,
            profiles: vec![SchedulerProfile {
                scheduler_name: Some(DEFAULT_SCHEDULER_NAME.to_string()),
                plugins: None,
                extra: Extra::new(),
            }],
            extenders: Vec::new(),
            extra: Extra::new(),
        }
    }
}

impl SchedulerConfig {
    /// The configuration the simulated scheduler runs with when extender
    /// calls go through the proxy at `url_prefix`.
    ///
    /// Extender `i` keeps every other setting; its URL becomes `url_prefix`
    /// and each configured verb becomes `<verb>/<i>`, the id the proxy
    /// forwards on. Unset verbs stay unset.
    pub fn route_extenders_through(&self, url_prefix: &str) -> SchedulerConfig {
        let mut routed = self.clone();
        for (id, extender) in routed.extenders.iter_mut().enumerate() {
            extender.url_prefix = url_prefix.to_string();
            route_verb(&mut extender.filter_verb, "filter", id);
            route_verb(&mut extender.prioritize_verb, "prioritize", id);
            route_verb(&mut extender.preempt_verb, "preempt", id);
            route_verb(&mut extender.bind_verb, "bind", id);
        }
        routed
    }
}

fn route_verb(verb: &mut Option<String>, name: &str, id: usize) {
    if verb.is_some() {
        *verb = Some(format!("{name}/{id}"));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// An external participant consulted during scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtenderConfig {
    pub url_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prioritize_verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preempt_verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_verb: Option<String>,
    #[serde(default)]
    pub weight: i64,
    #[serde(flatten)]
    pub extra: Extra,
}
