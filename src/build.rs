use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::operators::Registry;
use crate::types::error::BuildError;
use crate::types::node::{Dag, NodeData, NodeId};
use crate::types::tree::{TemplateDef, TreeNode};
use crate::types::{FieldCatalog, Value, ValueSeq};

/// Lower every rule's tree description into one shared, interned DAG.
///
/// Returns the arena and one root handle per rule, in input order.
/// Structurally identical subtrees anywhere in the pass resolve to the same
/// handle, across rule boundaries.
pub(crate) fn build(
    registry: &Registry,
    catalog: &FieldCatalog,
    templates: &[TemplateDef],
    rules: &[(String, TreeNode)],
) -> Result<(Dag, Vec<NodeId>), BuildError> {
    check_duplicate_rules(rules)?;
    let templates = index_templates(templates)?;

    let mut builder = GraphBuilder {
        registry,
        catalog,
        templates: &templates,
        dag: Dag::new(),
        interned: HashMap::new(),
    };

    let mut roots = Vec::with_capacity(rules.len());
    for (id, tree) in rules {
        let mut expansion = Vec::new();
        let root = builder.lower(id, tree, &mut expansion)?;
        roots.push(root);
    }

    debug_assert!(builder.dag.validate(), "interned arena must be acyclic");
    debug!(
        rules = rules.len(),
        nodes = builder.dag.len(),
        "rule graph built"
    );
    Ok((builder.dag, roots))
}

fn check_duplicate_rules(rules: &[(String, TreeNode)]) -> Result<(), BuildError> {
    let mut seen = HashSet::new();
    for (id, _) in rules {
        if !seen.insert(id.as_str()) {
            return Err(BuildError::DuplicateRule { rule: id.clone() });
        }
    }
    Ok(())
}

fn index_templates(templates: &[TemplateDef]) -> Result<HashMap<&str, &TemplateDef>, BuildError> {
    let mut map = HashMap::new();
    for def in templates {
        if map.insert(def.name.as_str(), def).is_some() {
            return Err(BuildError::DuplicateTemplate {
                template: def.name.clone(),
            });
        }
    }
    Ok(map)
}

struct GraphBuilder<'a> {
    registry: &'a Registry,
    catalog: &'a FieldCatalog,
    templates: &'a HashMap<&'a str, &'a TemplateDef>,
    dag: Dag,
    interned: HashMap<NodeKey, NodeId>,
}

/// Structural identity of a node, used for hash-consing. Children are
/// already interned, so comparing child handles compares whole subtrees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Literal(LitKey),
    Var(String),
    Call(String, Vec<NodeId>),
}

/// Hashable literal identity. Floats key by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LitKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(String),
    List(Vec<LitKey>),
}

impl LitKey {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => LitKey::Null,
            Value::Bool(b) => LitKey::Bool(*b),
            Value::Int(n) => LitKey::Int(*n),
            Value::Float(n) => LitKey::Float(n.to_bits()),
            Value::Str(s) => LitKey::Str(s.clone()),
            Value::List(vs) => LitKey::List(vs.iter().map(LitKey::of).collect()),
        }
    }
}

impl GraphBuilder<'_> {
    fn lower(
        &mut self,
        rule: &str,
        tree: &TreeNode,
        expansion: &mut Vec<String>,
    ) -> Result<NodeId, BuildError> {
        match tree {
            TreeNode::Literal { value } => Ok(self.intern_literal(value.clone())),
            TreeNode::Var { name } => {
                // The name must already be a string literal here: template
                // substitution has run, so a surviving Ref or other shape is
                // an authoring error.
                let name = match name.as_ref() {
                    TreeNode::Literal {
                        value: Value::Str(s),
                    } => s.clone(),
                    TreeNode::Ref { name } => {
                        return Err(BuildError::UndefinedReference {
                            rule: rule.to_owned(),
                            reference: name.clone(),
                        });
                    }
                    other => {
                        return Err(BuildError::TypeMismatch {
                            rule: rule.to_owned(),
                            detail: format!(
                                "variable name must resolve to a string literal, got {other}"
                            ),
                        });
                    }
                };
                let phase = self.catalog.phase_of(&name);
                Ok(self.intern(NodeKey::Var(name.clone()), NodeData::Var { name, phase }))
            }
            TreeNode::Call { name, args } => self.lower_call(rule, name, args, expansion),
            TreeNode::Template { name, args } => {
                let def = match self.templates.get(name.as_str()) {
                    Some(def) => *def,
                    None => {
                        return Err(BuildError::UnknownTemplate {
                            rule: rule.to_owned(),
                            template: name.clone(),
                        });
                    }
                };
                if args.len() != def.params.len() {
                    return Err(BuildError::TemplateArityMismatch {
                        rule: rule.to_owned(),
                        template: name.clone(),
                        expected: def.params.len(),
                        found: args.len(),
                    });
                }
                if expansion.iter().any(|t| t == name) {
                    let mut path = expansion.clone();
                    path.push(name.clone());
                    return Err(BuildError::CycleDetected {
                        rule: rule.to_owned(),
                        path,
                    });
                }

                let bindings: HashMap<&str, &TreeNode> = def
                    .params
                    .iter()
                    .map(String::as_str)
                    .zip(args.iter())
                    .collect();
                let body = substitute(rule, &def.body, &bindings)?;

                expansion.push(name.clone());
                let root = self.lower(rule, &body, expansion);
                expansion.pop();
                root
            }
            TreeNode::Ref { name } => Err(BuildError::UndefinedReference {
                rule: rule.to_owned(),
                reference: name.clone(),
            }),
        }
    }

    fn lower_call(
        &mut self,
        rule: &str,
        name: &str,
        args: &[TreeNode],
        expansion: &mut Vec<String>,
    ) -> Result<NodeId, BuildError> {
        let spec = match self.registry.lookup(name) {
            Some(spec) => spec,
            None => {
                return Err(BuildError::UnknownOperator {
                    rule: rule.to_owned(),
                    operator: name.to_owned(),
                });
            }
        };
        if !spec.arity().accepts(args.len()) {
            return Err(BuildError::ArityMismatch {
                rule: rule.to_owned(),
                operator: name.to_owned(),
                expected: spec.arity().to_string(),
                found: args.len(),
            });
        }

        let mut arg_ids = Vec::with_capacity(args.len());
        for arg in args {
            arg_ids.push(self.lower(rule, arg, expansion)?);
        }

        // Pattern and replacement slots must be string literals so authoring
        // mistakes surface now, not mid-transaction.
        for (i, arg_id) in arg_ids.iter().take(spec.literal_args()).enumerate() {
            match self.dag.node(*arg_id) {
                NodeData::Literal(Value::Str(_)) => {}
                _ => {
                    return Err(BuildError::TypeMismatch {
                        rule: rule.to_owned(),
                        detail: format!(
                            "operator '{name}' requires argument {i} to be a string \
                             literal, got {}",
                            self.dag.render(*arg_id)
                        ),
                    });
                }
            }
        }

        // Literal folding: pure call over literal arguments pre-evaluates at
        // build time. A folding failure leaves the call in place so the
        // observable behavior matches the unfolded graph.
        if spec.is_pure() {
            if let Some(folded) = self.try_fold(spec.name(), &arg_ids) {
                return Ok(self.intern_literal(folded));
            }
        }

        Ok(self.intern(
            NodeKey::Call(name.to_owned(), arg_ids.clone()),
            NodeData::Call {
                operator: name.to_owned(),
                args: arg_ids,
            },
        ))
    }

    fn try_fold(&self, operator: &str, arg_ids: &[NodeId]) -> Option<Value> {
        let mut arg_seqs: Vec<ValueSeq> = Vec::with_capacity(arg_ids.len());
        for id in arg_ids {
            match self.dag.node(*id) {
                NodeData::Literal(value) => arg_seqs.push(value.to_seq()),
                _ => return None,
            }
        }
        let spec = self.registry.lookup(operator)?;
        match spec.invoke(&arg_seqs, None) {
            Ok(seq) => {
                debug!(operator, "folded pure literal call");
                Some(seq.into_value())
            }
            Err(_) => None,
        }
    }

    fn intern_literal(&mut self, value: Value) -> NodeId {
        self.intern(NodeKey::Literal(LitKey::of(&value)), NodeData::Literal(value))
    }

    fn intern(&mut self, key: NodeKey, data: NodeData) -> NodeId {
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let id = self.dag.push(data);
        self.interned.insert(key, id);
        id
    }
}

/// Structural substitution of argument subtrees for `Ref` nodes. Arguments
/// are trees, not values: nothing is evaluated here.
fn substitute(
    rule: &str,
    node: &TreeNode,
    bindings: &HashMap<&str, &TreeNode>,
) -> Result<TreeNode, BuildError> {
    match node {
        TreeNode::Ref { name } => match bindings.get(name.as_str()) {
            Some(arg) => Ok((*arg).clone()),
            None => Err(BuildError::UndefinedReference {
                rule: rule.to_owned(),
                reference: name.clone(),
            }),
        },
        TreeNode::Literal { .. } => Ok(node.clone()),
        TreeNode::Var { name } => Ok(TreeNode::Var {
            name: Box::new(substitute(rule, name, bindings)?),
        }),
        TreeNode::Call { name, args } => Ok(TreeNode::Call {
            name: name.clone(),
            args: args
                .iter()
                .map(|a| substitute(rule, a, bindings))
                .collect::<Result<_, _>>()?,
        }),
        TreeNode::Template { name, args } => Ok(TreeNode::Template {
            name: name.clone(),
            args: args
                .iter()
                .map(|a| substitute(rule, a, bindings))
                .collect::<Result<_, _>>()?,
        }),
    }
}
