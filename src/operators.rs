use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::types::error::{EvalError, RegistryError};
use crate::types::{Value, ValueSeq};

/// Argument-count contract checked at build time, before any evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    #[must_use]
    pub fn accepts(&self, found: usize) -> bool {
        match self {
            Arity::Exact(n) => found == *n,
            Arity::AtLeast(n) => found >= *n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// One operator invocation: the children's already-evaluated sequences plus
/// an optional item limit from an early-terminating consumer.
pub struct OpCall<'a> {
    pub operator: &'a str,
    pub args: &'a [ValueSeq],
    pub limit: Option<usize>,
}

impl OpCall<'_> {
    /// Shorthand for an [`EvalError::OperatorFailure`] on this call.
    pub fn fail(&self, reason: impl Into<String>) -> EvalError {
        EvalError::OperatorFailure {
            operator: self.operator.to_owned(),
            reason: reason.into(),
        }
    }

    /// The single string expected in a pattern/replacement argument slot.
    fn str_arg(&self, index: usize) -> Result<&str, EvalError> {
        match self.args.get(index).map(ValueSeq::values) {
            Some([Value::Str(s)]) => Ok(s),
            _ => Err(self.fail(format!("argument {index} must be a single string"))),
        }
    }

    fn regex_arg(&self, index: usize) -> Result<Regex, EvalError> {
        let pattern = self.str_arg(index)?;
        Regex::new(pattern).map_err(|e| self.fail(format!("invalid pattern '{pattern}': {e}")))
    }
}

/// Evaluation function of a registered operator. Pure over its inputs for a
/// given context; shared read-only across concurrent transactions.
pub type OperatorFn = Arc<dyn Fn(&OpCall<'_>) -> Result<ValueSeq, EvalError> + Send + Sync>;

/// A registered operator: its build-time contracts plus evaluation function.
#[derive(Clone)]
pub struct OperatorSpec {
    name: String,
    arity: Arity,
    /// Pure operators with all-literal arguments may be folded at build time.
    pure: bool,
    /// Number of leading arguments that must be string literals in the tree,
    /// checked at build time (patterns, replacement text).
    literal_args: usize,
    eval: OperatorFn,
}

impl OperatorSpec {
    #[must_use]
    pub fn new(name: &str, arity: Arity, pure: bool, literal_args: usize, eval: OperatorFn) -> Self {
        Self {
            name: name.to_owned(),
            arity,
            pure,
            literal_args,
            eval,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    #[must_use]
    pub fn is_pure(&self) -> bool {
        self.pure
    }

    #[must_use]
    pub(crate) fn literal_args(&self) -> usize {
        self.literal_args
    }

    pub(crate) fn invoke(
        &self,
        args: &[ValueSeq],
        limit: Option<usize>,
    ) -> Result<ValueSeq, EvalError> {
        (self.eval)(&OpCall {
            operator: &self.name,
            args,
            limit,
        })
    }
}

impl fmt::Debug for OperatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorSpec")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("pure", &self.pure)
            .field("literal_args", &self.literal_args)
            .finish_non_exhaustive()
    }
}

/// Maps operator names to their specs. Open for registration until it moves
/// into an engine at build time; immutable and shareable afterwards.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    ops: HashMap<String, OperatorSpec>,
}

impl Registry {
    /// An empty registry with no operators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard registry: the built-in operator set pre-registered.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for spec in builtin_specs() {
            // Names are distinct by construction.
            let _ = registry.register(spec);
        }
        registry
    }

    /// Register an operator. Fails if the name is already taken.
    pub fn register(&mut self, spec: OperatorSpec) -> Result<(), RegistryError> {
        if self.ops.contains_key(spec.name()) {
            return Err(RegistryError::DuplicateOperator {
                operator: spec.name().to_owned(),
            });
        }
        self.ops.insert(spec.name().to_owned(), spec);
        Ok(())
    }

    /// Look up an operator by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&OperatorSpec> {
        self.ops.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

fn builtin_specs() -> Vec<OperatorSpec> {
    vec![
        OperatorSpec::new("rx", Arity::Exact(2), true, 1, Arc::new(rx)),
        OperatorSpec::new("rx_capture", Arity::Exact(2), true, 1, Arc::new(rx_capture)),
        OperatorSpec::new(
            "string_replace_rx",
            Arity::Exact(3),
            true,
            2,
            Arc::new(string_replace_rx),
        ),
        OperatorSpec::new("cat", Arity::AtLeast(1), true, 0, Arc::new(cat)),
        OperatorSpec::new("p", Arity::Exact(1), true, 0, Arc::new(p)),
    ]
}

/// `rx(pattern, input)`: emits each input value whose text matches the
/// pattern, preserving input order.
fn rx(call: &OpCall<'_>) -> Result<ValueSeq, EvalError> {
    let re = call.regex_arg(0)?;
    let mut out = ValueSeq::empty();
    for value in &call.args[1] {
        if out.at_limit(call.limit) {
            break;
        }
        if let Some(text) = value.as_text() {
            if re.is_match(&text) {
                out.push(value.clone());
            }
        }
    }
    Ok(out)
}

/// `rx_capture(pattern, input)`: emits capture-group text for each matching
/// input value; the whole match when the pattern has no groups.
fn rx_capture(call: &OpCall<'_>) -> Result<ValueSeq, EvalError> {
    let re = call.regex_arg(0)?;
    let mut out = ValueSeq::empty();
    for value in &call.args[1] {
        if out.at_limit(call.limit) {
            break;
        }
        let Some(text) = value.as_text() else {
            continue;
        };
        let Some(caps) = re.captures(&text) else {
            continue;
        };
        if caps.len() > 1 {
            for group in caps.iter().skip(1).flatten() {
                if out.at_limit(call.limit) {
                    break;
                }
                out.push(group.as_str());
            }
        } else if let Some(whole) = caps.get(0) {
            out.push(whole.as_str());
        }
    }
    Ok(out)
}

/// `string_replace_rx(pattern, replacement, input)`: replaces every match of
/// the pattern in each input value's text with the replacement.
fn string_replace_rx(call: &OpCall<'_>) -> Result<ValueSeq, EvalError> {
    let re = call.regex_arg(0)?;
    let replacement = call.str_arg(1)?;
    let mut out = ValueSeq::empty();
    for value in &call.args[2] {
        if out.at_limit(call.limit) {
            break;
        }
        if let Some(text) = value.as_text() {
            out.push(re.replace_all(&text, replacement).into_owned());
        }
    }
    Ok(out)
}

/// `cat(...)`: concatenates argument sequences into one, preserving order.
fn cat(call: &OpCall<'_>) -> Result<ValueSeq, EvalError> {
    let mut out = ValueSeq::empty();
    for arg in call.args {
        for value in arg {
            if out.at_limit(call.limit) {
                return Ok(out);
            }
            out.push(value.clone());
        }
    }
    Ok(out)
}

/// `p(input)`: boolean-normalizing wrapper producing a single `true` when
/// the input sequence is truthy and a single `false` otherwise.
fn p(call: &OpCall<'_>) -> Result<ValueSeq, EvalError> {
    Ok(ValueSeq::one(call.args[0].is_truthy()))
}
