use std::collections::HashMap;

use super::{Phase, Value, ValueSeq};

/// Field supply interface implemented by the transaction collaborator.
///
/// `None` means the field is absent in the given phase; absence is not an
/// error and evaluates to the empty sequence.
pub trait FieldSource {
    fn get_field(&self, name: &str, phase: Phase) -> Option<Value>;
}

/// Action interface: the engine signals a matched rule with its identifier
/// and resulting value sequence. Logging, blocking, and other effects live
/// entirely in the implementor.
pub trait ActionSink {
    fn on_match(&mut self, rule: &str, values: &ValueSeq);
}

/// A simple in-memory [`FieldSource`], mainly for tests and demos.
///
/// Fields registered with [`set`](Self::set) are visible in every phase;
/// [`set_at`](Self::set_at) models staged population: the value only
/// becomes visible once the transaction reaches the given phase.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    fields: HashMap<String, (Phase, Value)>,
}

impl FieldMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field visible from the earliest phase onward.
    #[must_use]
    pub fn set(self, name: &str, value: impl Into<Value>) -> Self {
        self.set_at(name, Phase::EARLIEST, value)
    }

    /// Set a field that becomes visible at `phase`.
    #[must_use]
    pub fn set_at(mut self, name: &str, phase: Phase, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_owned(), (phase, value.into()));
        self
    }

    /// Insert without consuming, for incremental population.
    pub fn insert(&mut self, name: &str, phase: Phase, value: impl Into<Value>) {
        self.fields.insert(name.to_owned(), (phase, value.into()));
    }
}

impl FieldSource for FieldMap {
    fn get_field(&self, name: &str, phase: Phase) -> Option<Value> {
        self.fields.get(name).and_then(|(available, value)| {
            if *available <= phase {
                Some(value.clone())
            } else {
                None
            }
        })
    }
}

/// Per-context evaluation state of a single node.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum NodeState {
    #[default]
    Unevaluated,
    /// On the active recursion path. Observing this state again is a
    /// violation of the acyclic invariant, never a recoverable condition.
    Evaluating,
    Evaluated(ValueSeq),
}
