//! Pod annotation keys carrying recorded extender results.

use std::fmt;

pub const FILTER_RESULT: &str = "scheduler-simulator/extender-filter-result";
pub const PRIORITIZE_RESULT: &str = "scheduler-simulator/extender-prioritize-result";
pub const PREEMPT_RESULT: &str = "scheduler-simulator/extender-preempt-result";
pub const BIND_RESULT: &str = "scheduler-simulator/extender-bind-result";

/// Scheduling phase in which an extender is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtenderPhase {
    Filter,
    Prioritize,
    Preempt,
    Bind,
}

impl ExtenderPhase {
    pub const ALL: [ExtenderPhase; 4] = [
        ExtenderPhase::Filter,
        ExtenderPhase::Prioritize,
        ExtenderPhase::Preempt,
        ExtenderPhase::Bind,
    ];

    pub fn annotation_key(&self) -> &'static str {
        match self {
            ExtenderPhase::Filter => FILTER_RESULT,
            ExtenderPhase::Prioritize => PRIORITIZE_RESULT,
            ExtenderPhase::Preempt => PREEMPT_RESULT,
            ExtenderPhase::Bind => BIND_RESULT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtenderPhase::Filter => "filter",
            ExtenderPhase::Prioritize => "prioritize",
            ExtenderPhase::Preempt => "preempt",
            ExtenderPhase::Bind => "bind",
        }
    }
}

impl fmt::Display for ExtenderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
