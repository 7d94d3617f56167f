//! ResultStore — per-pod record of extender decisions.
//!
//! Every extender answer is stored under the pod it was about, the phase it
//! belongs to and the extender that gave it. When a pod is exported the
//! store renders each phase as one annotation holding a JSON object keyed by
//! extender name. Records live until the pod is deleted.
//!
//! One `std::sync::Mutex` guards the whole map. Every operation holds it only
//! for in-memory map work and JSON encoding, never across an await.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use schedsim_core::{Pod, PodDecorator};

use crate::annotation::ExtenderPhase;
use crate::types::{
    ExtenderArgs, ExtenderBindingArgs, ExtenderBindingResult, ExtenderFilterResult,
    ExtenderPreemptionArgs, ExtenderPreemptionResult, HostPriorityList,
};

/// Identifies the pod a decision was made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecisionKey {
    pub namespace: String,
    pub pod_name: String,
}

impl DecisionKey {
    pub fn new(namespace: impl Into<String>, pod_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            pod_name: pod_name.into(),
        }
    }

    pub fn for_pod(pod: &Pod) -> Self {
        Self::new(
            pod.metadata.namespace.clone().unwrap_or_default(),
            pod.metadata.name.clone(),
        )
    }
}

impl fmt::Display for DecisionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.pod_name)
    }
}

/// One extender answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Filter(ExtenderFilterResult),
    Prioritize(HostPriorityList),
    Preempt(ExtenderPreemptionResult),
    Bind(ExtenderBindingResult),
}

impl Decision {
    pub fn phase(&self) -> ExtenderPhase {
        match self {
            Decision::Filter(_) => ExtenderPhase::Filter,
            Decision::Prioritize(_) => ExtenderPhase::Prioritize,
            Decision::Preempt(_) => ExtenderPhase::Preempt,
            Decision::Bind(_) => ExtenderPhase::Bind,
        }
    }
}

/// All decisions recorded for one pod, per phase and extender.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionRecord {
    pub filter: BTreeMap<String, ExtenderFilterResult>,
    pub prioritize: BTreeMap<String, HostPriorityList>,
    pub preempt: BTreeMap<String, ExtenderPreemptionResult>,
    pub bind: BTreeMap<String, ExtenderBindingResult>,
}

impl DecisionRecord {
    fn insert(&mut self, participant: String, decision: Decision) {
        match decision {
            Decision::Filter(result) => {
                self.filter.insert(participant, result);
            }
            Decision::Prioritize(result) => {
                self.prioritize.insert(participant, result);
            }
            Decision::Preempt(result) => {
                self.preempt.insert(participant, result);
            }
            Decision::Bind(result) => {
                self.bind.insert(participant, result);
            }
        }
    }

    /// JSON object for one phase, keyed by extender name.
    fn encode(&self, phase: ExtenderPhase) -> serde_json::Result<String> {
        match phase {
            ExtenderPhase::Filter => serde_json::to_string(&self.filter),
            ExtenderPhase::Prioritize => serde_json::to_string(&self.prioritize),
            ExtenderPhase::Preempt => serde_json::to_string(&self.preempt),
            ExtenderPhase::Bind => serde_json::to_string(&self.bind),
        }
    }
}

/// Thread-safe store of extender decisions.
#[derive(Default)]
pub struct ResultStore {
    records: Mutex<HashMap<DecisionKey, DecisionRecord>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The map is only mutated by single `insert`/`remove` calls, so a panic
    /// elsewhere cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, HashMap<DecisionKey, DecisionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `decision` for `key`, replacing an earlier answer from the same
    /// participant in the same phase.
    pub fn record(&self, key: DecisionKey, participant: &str, decision: Decision) {
        let phase = decision.phase();
        debug!(%key, %phase, participant, "extender decision recorded");
        self.lock()
            .entry(key)
            .or_default()
            .insert(participant.to_string(), decision);
    }

    pub fn add_filter_result(
        &self,
        args: &ExtenderArgs,
        result: ExtenderFilterResult,
        participant: &str,
    ) {
        self.record(DecisionKey::for_pod(&args.pod), participant, Decision::Filter(result));
    }

    pub fn add_prioritize_result(
        &self,
        args: &ExtenderArgs,
        result: HostPriorityList,
        participant: &str,
    ) {
        self.record(
            DecisionKey::for_pod(&args.pod),
            participant,
            Decision::Prioritize(result),
        );
    }

    pub fn add_preempt_result(
        &self,
        args: &ExtenderPreemptionArgs,
        result: ExtenderPreemptionResult,
        participant: &str,
    ) {
        self.record(DecisionKey::for_pod(&args.pod), participant, Decision::Preempt(result));
    }

    pub fn add_bind_result(
        &self,
        args: &ExtenderBindingArgs,
        result: ExtenderBindingResult,
        participant: &str,
    ) {
        let key = DecisionKey::new(args.pod_namespace.clone(), args.pod_name.clone());
        self.record(key, participant, Decision::Bind(result));
    }

    /// Attach every recorded phase to `pod` as an annotation.
    ///
    /// A pod without records is left untouched. A phase that fails to encode
    /// is skipped; the other phases are still attached.
    pub fn decorate(&self, pod: &mut Pod) {
        let key = DecisionKey::for_pod(pod);
        let records = self.lock();
        let Some(record) = records.get(&key) else {
            return;
        };
        attach_phases(pod, &key, |phase| record.encode(phase));
    }

    /// Drop everything recorded for `key`.
    pub fn delete(&self, key: &DecisionKey) {
        if self.lock().remove(key).is_some() {
            debug!(%key, "extender decisions deleted");
        }
    }

    pub fn delete_pod(&self, pod: &Pod) {
        self.delete(&DecisionKey::for_pod(pod));
    }

    /// A copy of the decisions recorded for `key`.
    pub fn record_for(&self, key: &DecisionKey) -> Option<DecisionRecord> {
        self.lock().get(key).cloned()
    }

    /// Number of pods with at least one recorded decision.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Write one annotation per phase from `encode`. A phase that fails to
/// encode is logged and left off the pod.
fn attach_phases<F>(pod: &mut Pod, key: &DecisionKey, mut encode: F)
where
    F: FnMut(ExtenderPhase) -> serde_json::Result<String>,
{
    for phase in ExtenderPhase::ALL {
        match encode(phase) {
            Ok(value) => {
                pod.metadata
                    .annotations
                    .insert(phase.annotation_key().to_string(), value);
            }
            Err(e) => {
                warn!(%key, %phase, error = %e, "failed to encode extender results");
            }
        }
    }
}

impl PodDecorator for ResultStore {
    fn decorate(&self, pod: &mut Pod) {
        ResultStore::decorate(self, pod);
    }
}

/// Parse one phase annotation back into its extender map.
pub fn decode_annotation<T: DeserializeOwned>(
    pod: &Pod,
    phase: ExtenderPhase,
) -> Option<serde_json::Result<BTreeMap<String, T>>> {
    pod.metadata
        .annotations
        .get(phase.annotation_key())
        .map(|value| serde_json::from_str(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::annotation::{BIND_RESULT, FILTER_RESULT, PREEMPT_RESULT, PRIORITIZE_RESULT};
    use crate::types::HostPriority;

    fn pod(namespace: &str, name: &str) -> Pod {
        Pod::new(name, Some(namespace))
    }

    fn filter_args(namespace: &str, name: &str) -> ExtenderArgs {
        ExtenderArgs {
            pod: pod(namespace, name),
            nodes: None,
            node_names: Some(vec!["node-1".to_string(), "node-2".to_string()]),
        }
    }

    fn passing(nodes: &[&str]) -> ExtenderFilterResult {
        ExtenderFilterResult {
            node_names: Some(nodes.iter().map(|n| n.to_string()).collect()),
            ..ExtenderFilterResult::default()
        }
    }

    #[test]
    fn key_display() {
        assert_eq!(DecisionKey::new("team-a", "web").to_string(), "team-a/web");
        assert_eq!(DecisionKey::for_pod(&pod("ns", "p")), DecisionKey::new("ns", "p"));
    }

    #[test]
    fn decorate_without_records_is_noop() {
        let store = ResultStore::new();
        let mut p = pod("team-a", "web");
        store.decorate(&mut p);
        assert!(p.metadata.annotations.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn failed_phase_leaves_other_annotations() {
        let mut p = pod("team-a", "web");
        let key = DecisionKey::for_pod(&p);

        attach_phases(&mut p, &key, |phase| match phase {
            ExtenderPhase::Prioritize => {
                Err(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
            }
            _ => Ok("{}".to_string()),
        });

        let annotations = &p.metadata.annotations;
        assert_eq!(annotations.len(), 3);
        assert!(!annotations.contains_key(PRIORITIZE_RESULT));
        for key in [FILTER_RESULT, PREEMPT_RESULT, BIND_RESULT] {
            assert_eq!(annotations.get(key).map(String::as_str), Some("{}"));
        }
    }

    #[test]
    fn decorate_attaches_every_phase() {
        let store = ResultStore::new();
        let args = filter_args("team-a", "web");
        store.add_filter_result(&args, passing(&["node-1"]), "ext-a");
        store.add_prioritize_result(
            &args,
            vec![HostPriority {
                host: "node-1".to_string(),
                score: 7,
            }],
            "ext-a",
        );

        let mut p = pod("team-a", "web");
        store.decorate(&mut p);

        let filter: BTreeMap<String, ExtenderFilterResult> =
            serde_json::from_str(&p.metadata.annotations[FILTER_RESULT]).unwrap();
        assert_eq!(filter["ext-a"].node_names.as_deref(), Some(&["node-1".to_string()][..]));
        assert_eq!(
            p.metadata.annotations[PRIORITIZE_RESULT],
            r#"{"ext-a":[{"host":"node-1","score":7}]}"#
        );
        // Phases without answers still get an (empty) annotation.
        assert_eq!(p.metadata.annotations[PREEMPT_RESULT], "{}");
        assert_eq!(p.metadata.annotations[BIND_RESULT], "{}");
    }

    #[test]
    fn last_write_wins_per_participant() {
        let store = ResultStore::new();
        let args = filter_args("team-a", "web");
        store.add_filter_result(&args, passing(&["node-1"]), "ext-a");
        store.add_filter_result(&args, passing(&["node-2"]), "ext-a");
        store.add_filter_result(&args, passing(&["node-1", "node-2"]), "ext-b");

        let record = store.record_for(&DecisionKey::new("team-a", "web")).unwrap();
        assert_eq!(record.filter.len(), 2);
        assert_eq!(record.filter["ext-a"], passing(&["node-2"]));

        let mut p = pod("team-a", "web");
        store.decorate(&mut p);
        let decoded: BTreeMap<String, ExtenderFilterResult> =
            decode_annotation(&p, ExtenderPhase::Filter).unwrap().unwrap();
        assert_eq!(decoded, record.filter);
    }

    #[test]
    fn bind_result_keyed_by_binding_args() {
        let store = ResultStore::new();
        let args = ExtenderBindingArgs {
            pod_name: "web".to_string(),
            pod_namespace: "team-a".to_string(),
            pod_uid: "u1".to_string(),
            node: "node-1".to_string(),
        };
        store.add_bind_result(&args, ExtenderBindingResult::default(), "ext-a");

        let record = store.record_for(&DecisionKey::new("team-a", "web")).unwrap();
        assert!(record.bind.contains_key("ext-a"));
        assert!(record.filter.is_empty());
    }

    #[test]
    fn preempt_result_recorded() {
        let store = ResultStore::new();
        let args = ExtenderPreemptionArgs {
            pod: pod("team-a", "web"),
            node_name_to_victims: BTreeMap::new(),
            node_name_to_meta_victims: BTreeMap::new(),
        };
        store.add_preempt_result(&args, ExtenderPreemptionResult::default(), "ext-a");
        let record = store.record_for(&DecisionKey::new("team-a", "web")).unwrap();
        assert_eq!(record.preempt.len(), 1);
    }

    #[test]
    fn delete_removes_all_phases() {
        let store = ResultStore::new();
        let args = filter_args("team-a", "web");
        store.add_filter_result(&args, passing(&["node-1"]), "ext-a");
        store.add_prioritize_result(&args, Vec::new(), "ext-a");
        store.add_filter_result(&filter_args("team-a", "other"), passing(&[]), "ext-a");

        store.delete_pod(&pod("team-a", "web"));

        assert!(store.record_for(&DecisionKey::new("team-a", "web")).is_none());
        assert_eq!(store.len(), 1);
        let mut p = pod("team-a", "web");
        store.decorate(&mut p);
        assert!(p.metadata.annotations.is_empty());
    }

    #[test]
    fn works_as_pod_decorator() {
        let store = Arc::new(ResultStore::new());
        store.add_filter_result(&filter_args("team-a", "web"), passing(&["node-1"]), "ext-a");
        let decorator: Arc<dyn PodDecorator> = store.clone();

        let mut p = pod("team-a", "web");
        decorator.decorate(&mut p);
        assert!(p.metadata.annotations.contains_key(FILTER_RESULT));
    }

    #[test]
    fn concurrent_writers_lose_nothing() {
        const KEYS: usize = 1000;
        const WRITERS: usize = 8;
        let store = Arc::new(ResultStore::new());

        std::thread::scope(|scope| {
            for writer in 0..WRITERS {
                let store = store.clone();
                scope.spawn(move || {
                    for i in (writer..KEYS).step_by(WRITERS) {
                        let key = DecisionKey::new("load", format!("pod-{i}"));
                        let score = i as i64;
                        // Two rounds: the second must win.
                        for round in 0..2 {
                            let host = format!("node-{round}");
                            store.record(key.clone(), "ext", Decision::Filter(passing(&[host.as_str()])));
                            store.record(
                                key.clone(),
                                "ext",
                                Decision::Prioritize(vec![HostPriority {
                                    host: host.clone(),
                                    score: score + round,
                                }]),
                            );
                            store.record(
                                key.clone(),
                                "ext",
                                Decision::Preempt(ExtenderPreemptionResult::default()),
                            );
                            store.record(
                                key.clone(),
                                "ext",
                                Decision::Bind(ExtenderBindingResult {
                                    error: format!("round-{round}"),
                                }),
                            );
                        }
                    }
                });
            }
        });

        assert_eq!(store.len(), KEYS);
        for i in 0..KEYS {
            let mut p = pod("load", &format!("pod-{i}"));
            store.decorate(&mut p);
            assert_eq!(p.metadata.annotations.len(), 4);

            let record = store.record_for(&DecisionKey::for_pod(&p)).unwrap();
            assert_eq!(record.filter["ext"], passing(&["node-1"]));
            assert_eq!(record.prioritize["ext"][0].score, i as i64 + 1);
            assert_eq!(record.bind["ext"].error, "round-1");
            assert_eq!(record.preempt.len(), 1);
        }
    }
}
