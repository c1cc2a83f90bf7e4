use std::fmt;

use serde::{Deserialize, Serialize};

use super::Value;

/// A tree description node, the data form in which the authoring front-end
/// hands expressions to the engine.
///
/// Trees are plain data: the engine never parses author syntax itself.
/// `Template` and `Ref` nodes exist only pre-expansion; the built DAG
/// contains literals, variable references, and operator calls exclusively.
///
/// The serde representation is tagged, so a JSON front-end can emit e.g.
/// `{"kind": "call", "name": "rx", "args": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// A literal value.
    Literal { value: Value },
    /// A reference to a transaction field. The name is itself a subtree so
    /// a template body can write `var(ref("param"))`; it must resolve to a
    /// string literal once substitution has run.
    Var { name: Box<TreeNode> },
    /// An operator call by registered name.
    Call { name: String, args: Vec<TreeNode> },
    /// An instantiation of a named template.
    Template { name: String, args: Vec<TreeNode> },
    /// A formal-parameter reference, valid only inside a template body.
    Ref { name: String },
}

/// Build a literal tree node.
#[must_use]
pub fn lit(value: impl Into<Value>) -> TreeNode {
    TreeNode::Literal {
        value: value.into(),
    }
}

/// Build a variable reference by field name.
#[must_use]
pub fn var(name: &str) -> TreeNode {
    TreeNode::Var {
        name: Box::new(lit(name)),
    }
}

/// Build a variable reference whose name is computed by substitution,
/// e.g. `var_of(tref("name"))` inside a template body.
#[must_use]
pub fn var_of(name: TreeNode) -> TreeNode {
    TreeNode::Var {
        name: Box::new(name),
    }
}

/// Build an operator call.
#[must_use]
pub fn call(name: &str, args: Vec<TreeNode>) -> TreeNode {
    TreeNode::Call {
        name: name.to_owned(),
        args,
    }
}

/// Build a template instantiation.
#[must_use]
pub fn tmpl(name: &str, args: Vec<TreeNode>) -> TreeNode {
    TreeNode::Template {
        name: name.to_owned(),
        args,
    }
}

/// Build a template-parameter reference.
#[must_use]
pub fn tref(name: &str) -> TreeNode {
    TreeNode::Ref {
        name: name.to_owned(),
    }
}

impl fmt::Display for TreeNode {
    /// S-expression rendering, used in error reports and logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeNode::Literal { value } => write!(f, "{value}"),
            TreeNode::Var { name } => write!(f, "(var {name})"),
            TreeNode::Call { name, args } => {
                write!(f, "({name}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            TreeNode::Template { name, args } => {
                write!(f, "({name}!")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            TreeNode::Ref { name } => write!(f, "(ref {name})"),
        }
    }
}

/// A named, parameterized, reusable expression fragment.
///
/// Instantiation substitutes actual argument subtrees for every [`TreeNode::Ref`]
/// in the body at build time; templates never survive into the DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: TreeNode,
}

impl TemplateDef {
    #[must_use]
    pub fn new(name: &str, params: &[&str], body: TreeNode) -> Self {
        Self {
            name: name.to_owned(),
            params: params.iter().map(|p| (*p).to_owned()).collect(),
            body,
        }
    }
}
