use std::fmt;

use super::context::FieldSource;
use super::node::{Dag, NodeId};
use super::tree::{TemplateDef, TreeNode};
use super::{FieldCatalog, Phase};
use crate::error::PaviseError;
use crate::evaluate::Transaction;
use crate::operators::Registry;

/// Builder collecting templates and rule declarations before a build.
///
/// The operator registry and field catalog are open until
/// [`build()`](Self::build) consumes the builder; the resulting [`Engine`]
/// is immutable.
///
/// # Example
///
/// ```
/// use pavise::{call, lit, var, EngineBuilder, FieldMap, Phase};
///
/// let engine = EngineBuilder::new()
///     .rule("method_is_get", call("rx", vec![lit("^GET$"), var("REQUEST_METHOD")]))
///     .build()
///     .unwrap();
///
/// let fields = FieldMap::new().set("REQUEST_METHOD", "GET");
/// let mut txn = engine.transaction(&fields);
/// let outcomes = txn.advance(Phase::RequestHeader);
/// assert!(outcomes[0].matched());
/// ```
#[derive(Debug)]
pub struct EngineBuilder {
    registry: Registry,
    catalog: FieldCatalog,
    templates: Vec<TemplateDef>,
    rules: Vec<RuleDecl>,
}

#[derive(Debug)]
struct RuleDecl {
    id: String,
    phase: Option<Phase>,
    tree: TreeNode,
}

impl EngineBuilder {
    /// A builder with the standard operator registry and field catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Registry::standard(),
            catalog: FieldCatalog::standard(),
            templates: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Replace the operator registry, e.g. to add external operators.
    #[must_use]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the field catalog supplying intrinsic field phases.
    #[must_use]
    pub fn with_catalog(mut self, catalog: FieldCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Register a template definition.
    #[must_use]
    pub fn template(mut self, def: TemplateDef) -> Self {
        self.templates.push(def);
        self
    }

    /// Shorthand for registering a template by parts.
    #[must_use]
    pub fn define(self, name: &str, params: &[&str], body: TreeNode) -> Self {
        self.template(TemplateDef::new(name, params, body))
    }

    /// Declare a rule; its phase is inferred from its dependencies.
    #[must_use]
    pub fn rule(mut self, id: &str, tree: TreeNode) -> Self {
        self.rules.push(RuleDecl {
            id: id.to_owned(),
            phase: None,
            tree,
        });
        self
    }

    /// Declare a rule with an explicit phase. Binding fails if the phase is
    /// earlier than the rule's dependencies allow.
    #[must_use]
    pub fn rule_in(mut self, id: &str, phase: Phase, tree: TreeNode) -> Self {
        self.rules.push(RuleDecl {
            id: id.to_owned(),
            phase: Some(phase),
            tree,
        });
        self
    }

    /// Build, deduplicate, validate, and phase-bind all declared rules.
    ///
    /// # Errors
    ///
    /// Returns [`PaviseError`] wrapping the build or bind failure; the error
    /// names the offending rule so the caller can skip it or abort startup.
    pub fn build(self) -> Result<Engine, PaviseError> {
        let trees: Vec<(String, TreeNode)> = self
            .rules
            .iter()
            .map(|r| (r.id.clone(), r.tree.clone()))
            .collect();
        let (dag, roots) = crate::build::build(&self.registry, &self.catalog, &self.templates, &trees)?;

        let to_bind: Vec<(String, NodeId, Option<Phase>)> = self
            .rules
            .iter()
            .zip(&roots)
            .map(|(r, root)| (r.id.clone(), *root, r.phase))
            .collect();
        let phases = crate::bind::bind(&dag, &to_bind)?;

        let rules = self
            .rules
            .into_iter()
            .zip(roots)
            .zip(phases)
            .map(|((decl, root), phase)| BoundRule {
                id: decl.id,
                root,
                phase,
            })
            .collect();

        Ok(Engine {
            dag,
            registry: self.registry,
            rules,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A rule root bound to the single phase at which it becomes eligible.
#[derive(Debug)]
pub(crate) struct BoundRule {
    pub(crate) id: String,
    pub(crate) root: NodeId,
    pub(crate) phase: Phase,
}

/// A compiled, immutable rule engine. Thread-safe and designed to live
/// behind `Arc`: the DAG, registry, and bindings are read-only after build
/// and shared by every concurrent transaction.
#[derive(Debug)]
pub struct Engine {
    pub(crate) dag: Dag,
    pub(crate) registry: Registry,
    pub(crate) rules: Vec<BoundRule>,
}

impl Engine {
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Start a transaction over the given field source. State is owned by
    /// the returned value and discarded with it.
    #[must_use]
    pub fn transaction<'e>(&'e self, fields: &'e dyn FieldSource) -> Transaction<'e> {
        Transaction::new(self, fields)
    }

    /// Number of interned DAG nodes across all rules.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.dag.len()
    }

    /// Rule identifiers in declaration order.
    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }

    /// The phase a rule is bound to, if the rule exists.
    #[must_use]
    pub fn rule_phase(&self, id: &str) -> Option<Phase> {
        self.rules.iter().find(|r| r.id == id).map(|r| r.phase)
    }

    /// S-expression rendering of a rule's bound DAG, for diagnostics.
    #[must_use]
    pub fn render_rule(&self, id: &str) -> Option<String> {
        self.rules
            .iter()
            .find(|r| r.id == id)
            .map(|r| self.dag.render(r.root))
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Engine({} rules, {} nodes)",
            self.rules.len(),
            self.dag.len()
        )
    }
}
