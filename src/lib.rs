//! A phase-aware predicate DAG engine for inline traffic inspection rules.
//!
//! Expression trees arrive as data from an authoring front-end, are interned
//! into a deduplicated DAG with templates expanded at build time, bound to
//! transaction phases, and evaluated lazily, each shared node at most once
//! per transaction.

mod bind;
mod build;
mod error;
mod evaluate;
mod operators;
mod types;

pub use error::PaviseError;
pub use evaluate::Transaction;
pub use operators::{Arity, OpCall, OperatorFn, OperatorSpec, Registry};
pub use types::{
    call, lit, tmpl, tref, var, var_of, ActionSink, BindError, BuildError, Engine, EngineBuilder,
    EvalError, FieldCatalog, FieldMap, FieldSource, Phase, RegistryError, RuleOutcome, TemplateDef,
    TreeNode, Value, ValueSeq,
};
