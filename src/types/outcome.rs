use std::fmt;

use super::{Phase, ValueSeq};
use crate::types::error::EvalError;

/// The result of evaluating one rule root within one transaction.
///
/// Rules are independent: a failing rule reports its error here without
/// disturbing sibling rules in the same transaction.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct RuleOutcome {
    rule: String,
    phase: Phase,
    result: Result<ValueSeq, EvalError>,
}

impl RuleOutcome {
    pub(crate) fn new(rule: &str, phase: Phase, result: Result<ValueSeq, EvalError>) -> Self {
        Self {
            rule: rule.to_owned(),
            phase,
            result,
        }
    }

    /// The rule identifier.
    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// The phase at which the rule was evaluated.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The produced sequence, or the per-rule evaluation error.
    #[must_use]
    pub fn result(&self) -> &Result<ValueSeq, EvalError> {
        &self.result
    }

    /// Whether the rule produced a truthy sequence and should fire actions.
    #[must_use]
    pub fn matched(&self) -> bool {
        self.result.as_ref().is_ok_and(ValueSeq::is_truthy)
    }

    /// The sequence, when evaluation succeeded.
    #[must_use]
    pub fn values(&self) -> Option<&ValueSeq> {
        self.result.as_ref().ok()
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(values) => write!(f, "{} @ {}: {}", self.rule, self.phase, values),
            Err(err) => write!(f, "{} @ {}: error: {}", self.rule, self.phase, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn matched_on_truthy_sequence() {
        let outcome = RuleOutcome::new(
            "r1",
            Phase::RequestHeader,
            Ok(ValueSeq::one(Value::from("GET"))),
        );
        assert!(outcome.matched());
        assert_eq!(outcome.rule(), "r1");
    }

    #[test]
    fn not_matched_on_empty() {
        let outcome = RuleOutcome::new("r1", Phase::RequestHeader, Ok(ValueSeq::empty()));
        assert!(!outcome.matched());
        assert_eq!(outcome.values(), Some(&ValueSeq::empty()));
    }

    #[test]
    fn not_matched_on_error() {
        let outcome = RuleOutcome::new(
            "r1",
            Phase::RequestHeader,
            Err(EvalError::OperatorFailure {
                operator: "rx".into(),
                reason: "bad pattern".into(),
            }),
        );
        assert!(!outcome.matched());
        assert!(outcome.values().is_none());
    }

    #[test]
    fn display_includes_phase() {
        let outcome = RuleOutcome::new(
            "basic1",
            Phase::RequestHeader,
            Ok(ValueSeq::one(Value::from("bbr"))),
        );
        assert_eq!(outcome.to_string(), "basic1 @ request-header: ['bbr']");
    }
}
