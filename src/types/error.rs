use thiserror::Error;

use super::Phase;

/// Errors detected while lowering a tree description into the DAG.
///
/// Every variant names the offending rule and, where useful, the failing
/// sub-expression, so configuration loading can report actionable detail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("unknown operator '{operator}' in rule '{rule}'")]
    UnknownOperator { rule: String, operator: String },

    #[error(
        "operator '{operator}' in rule '{rule}' expects {expected} argument(s), found {found}"
    )]
    ArityMismatch {
        rule: String,
        operator: String,
        expected: String,
        found: usize,
    },

    #[error("type mismatch in rule '{rule}': {detail}")]
    TypeMismatch { rule: String, detail: String },

    #[error("unknown template '{template}' in rule '{rule}'")]
    UnknownTemplate { rule: String, template: String },

    #[error(
        "template '{template}' in rule '{rule}' expects {expected} argument(s), found {found}"
    )]
    TemplateArityMismatch {
        rule: String,
        template: String,
        expected: usize,
        found: usize,
    },

    #[error("undefined reference '{reference}' in rule '{rule}'")]
    UndefinedReference { rule: String, reference: String },

    #[error("cyclic template expansion in rule '{rule}': {}", path.join(" -> "))]
    CycleDetected { rule: String, path: Vec<String> },

    #[error("duplicate rule id '{rule}'")]
    DuplicateRule { rule: String },

    #[error("duplicate template name '{template}'")]
    DuplicateTemplate { template: String },
}

/// Errors detected while assigning rule roots to phases.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error(
        "rule '{rule}' declares phase {declared} but depends on data first available at {required}"
    )]
    PhaseConflict {
        rule: String,
        declared: Phase,
        required: Phase,
    },
}

/// Per-rule, per-transaction evaluation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("operator '{operator}' failed: {reason}")]
    OperatorFailure { operator: String, reason: String },

    /// The cycle guard fired. The builder validates acyclicity exhaustively,
    /// so this indicates a defect, not a runtime condition; it is fatal to
    /// the affected rule's evaluation only.
    #[error("internal cycle violation at node {node}")]
    InternalCycleViolation { node: String },
}

/// Errors from operator registration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("operator '{operator}' is already registered")]
    DuplicateOperator { operator: String },
}
