use tracing::debug;

use crate::types::context::{ActionSink, FieldSource, NodeState};
use crate::types::error::EvalError;
use crate::types::node::{NodeData, NodeId};
use crate::types::{Engine, Phase, RuleOutcome, ValueSeq};

/// Per-transaction evaluation state: the memoization table plus the live
/// field source supplied by the surrounding transaction.
///
/// A transaction owns its state exclusively and is discarded at transaction
/// end; the engine it borrows is immutable and shared across transactions.
/// Each node is computed at most once per transaction; a result cached here
/// never changes for the lifetime of the transaction, even across phases.
pub struct Transaction<'e> {
    engine: &'e Engine,
    fields: &'e dyn FieldSource,
    states: Vec<NodeState>,
    done: Vec<bool>,
    phase: Phase,
}

impl<'e> Transaction<'e> {
    pub(crate) fn new(engine: &'e Engine, fields: &'e dyn FieldSource) -> Self {
        Self {
            engine,
            fields,
            states: vec![NodeState::Unevaluated; engine.dag.len()],
            done: vec![false; engine.rules.len()],
            phase: Phase::EARLIEST,
        }
    }

    /// Advance the transaction to `phase` and evaluate every not-yet-run
    /// rule bound at or before it. Rules are independent: one rule's
    /// evaluation error is captured in its outcome and its siblings run
    /// regardless.
    pub fn advance(&mut self, phase: Phase) -> Vec<RuleOutcome> {
        self.advance_inner(phase, None)
    }

    /// Like [`advance`](Self::advance), additionally signaling `sink` for
    /// every rule whose result is truthy.
    pub fn advance_with(&mut self, phase: Phase, sink: &mut dyn ActionSink) -> Vec<RuleOutcome> {
        self.advance_inner(phase, Some(sink))
    }

    /// Run all remaining phases in order and collect every outcome.
    pub fn finish(&mut self) -> Vec<RuleOutcome> {
        let mut outcomes = Vec::with_capacity(self.engine.rules.len());
        for phase in Phase::ALL {
            outcomes.extend(self.advance(phase));
        }
        outcomes
    }

    /// The phase the transaction has reached so far.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn advance_inner(
        &mut self,
        phase: Phase,
        mut sink: Option<&mut dyn ActionSink>,
    ) -> Vec<RuleOutcome> {
        self.phase = self.phase.max(phase);
        let mut outcomes = Vec::new();
        for index in 0..self.engine.rules.len() {
            let (root, rule_phase) = {
                let rule = &self.engine.rules[index];
                (rule.root, rule.phase)
            };
            if self.done[index] || rule_phase > phase {
                continue;
            }
            self.done[index] = true;

            let result = self.eval_node(root);
            let rule = &self.engine.rules[index];
            let outcome = RuleOutcome::new(&rule.id, rule_phase, result);
            debug!(rule = %rule.id, matched = outcome.matched(), "rule evaluated");
            if outcome.matched() {
                if let (Some(sink), Some(values)) = (sink.as_mut(), outcome.values()) {
                    sink.on_match(&rule.id, values);
                }
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Evaluate a rule root asking its producer for at most `limit` items.
    ///
    /// Dependencies are evaluated (and memoized) in full; only the root's
    /// producer is cut short, and a truncated result is never cached, so
    /// memoized results stay complete. Returns `None` for an unknown rule,
    /// or for one whose bound phase the transaction has not reached yet:
    /// evaluating early would memoize late-phase fields as absent.
    pub fn evaluate_first(
        &mut self,
        rule_id: &str,
        limit: usize,
    ) -> Option<Result<ValueSeq, EvalError>> {
        let (root, rule_phase) = self
            .engine
            .rules
            .iter()
            .find(|r| r.id == rule_id)
            .map(|r| (r.root, r.phase))?;
        if rule_phase > self.phase {
            return None;
        }

        if let NodeState::Evaluated(seq) = &self.states[root.index()] {
            let mut seq = seq.clone();
            seq.truncate(limit);
            return Some(Ok(seq));
        }

        let result = self.eval_uncached(root, Some(limit)).map(|mut seq| {
            seq.truncate(limit);
            seq
        });
        Some(result)
    }

    /// Depth-first memoized evaluation. A node observed in the `Evaluating`
    /// state is a violation of the acyclic invariant; the builder validates
    /// acyclicity exhaustively, so this path indicates a defect and fails
    /// the affected rule only.
    fn eval_node(&mut self, id: NodeId) -> Result<ValueSeq, EvalError> {
        match &self.states[id.index()] {
            NodeState::Evaluated(seq) => return Ok(seq.clone()),
            NodeState::Evaluating => {
                return Err(EvalError::InternalCycleViolation {
                    node: id.to_string(),
                });
            }
            NodeState::Unevaluated => {}
        }

        self.states[id.index()] = NodeState::Evaluating;
        match self.eval_uncached(id, None) {
            Ok(seq) => {
                self.states[id.index()] = NodeState::Evaluated(seq.clone());
                Ok(seq)
            }
            Err(err) => {
                // Errors are not memoized; a sibling rule re-evaluating this
                // shared node reproduces the same failure independently.
                self.states[id.index()] = NodeState::Unevaluated;
                Err(err)
            }
        }
    }

    fn eval_uncached(&mut self, id: NodeId, limit: Option<usize>) -> Result<ValueSeq, EvalError> {
        let engine = self.engine;
        match engine.dag.node(id) {
            NodeData::Literal(value) => Ok(value.to_seq()),
            NodeData::Var { name, .. } => Ok(self
                .fields
                .get_field(name, self.phase)
                .map(|v| v.to_seq())
                .unwrap_or_default()),
            NodeData::Call { operator, args } => {
                let mut arg_seqs = Vec::with_capacity(args.len());
                for arg in args {
                    arg_seqs.push(self.eval_node(*arg)?);
                }
                let spec = engine.registry.lookup(operator).ok_or_else(|| {
                    // Unreachable post-build; the builder rejects unknown
                    // operators before any evaluation.
                    EvalError::OperatorFailure {
                        operator: operator.clone(),
                        reason: "operator missing from registry".to_owned(),
                    }
                })?;
                spec.invoke(&arg_seqs, limit)
            }
        }
    }
}
