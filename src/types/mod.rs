pub(crate) mod context;
mod engine;
pub(crate) mod error;
pub(crate) mod node;
mod outcome;
mod phase;
pub(crate) mod tree;
mod value;

pub use context::{ActionSink, FieldMap, FieldSource};
pub use engine::{Engine, EngineBuilder};
pub use error::{BindError, BuildError, EvalError, RegistryError};
pub use outcome::RuleOutcome;
pub use phase::{FieldCatalog, Phase};
pub use tree::{call, lit, tmpl, tref, var, var_of, TemplateDef, TreeNode};
pub use value::{Value, ValueSeq};

pub(crate) use context::NodeState;
