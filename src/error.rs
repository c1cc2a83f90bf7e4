use thiserror::Error;

use crate::types::{BindError, BuildError, EvalError, RegistryError};

/// Unified error type covering registration, graph building, phase binding,
/// and evaluation.
///
/// Returned by [`EngineBuilder::build()`](crate::EngineBuilder::build); the
/// per-stage errors remain available for callers that match on them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaviseError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}
