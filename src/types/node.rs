use std::fmt;

use super::{Phase, Value};

/// Stable handle to a node in the [`Dag`] arena.
///
/// Handles are the only way edges are stored; the arena owns every node and
/// contexts reference nodes by handle, never by pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) u32);

impl NodeId {
    #[must_use]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A DAG vertex. Immutable once interned; identity is structural content.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeData {
    Literal(Value),
    Var { name: String, phase: Phase },
    Call { operator: String, args: Vec<NodeId> },
}

/// Arena of expression nodes with structural sharing.
///
/// Interning guarantees each distinct structure appears once, so a node may
/// have many parents. Children are always interned before their parent,
/// which means every edge points to a strictly smaller id and the arena is
/// acyclic by construction. [`validate`](Self::validate) checks the property
/// exhaustively after a build.
#[derive(Debug, Default)]
pub(crate) struct Dag {
    nodes: Vec<NodeData>,
}

impl Dag {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of interned nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("node arena exceeds u32::MAX ids"));
        self.nodes.push(data);
        id
    }

    pub(crate) fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    /// Exhaustive acyclicity check: every edge must point to an earlier id.
    /// Interning makes violations impossible; this runs after every build so
    /// the evaluator's cycle guard is provably unreachable.
    pub(crate) fn validate(&self) -> bool {
        self.nodes.iter().enumerate().all(|(i, data)| match data {
            NodeData::Call { args, .. } => args.iter().all(|a| a.index() < i),
            NodeData::Literal(_) | NodeData::Var { .. } => true,
        })
    }

    /// S-expression rendering of the subgraph rooted at `id`.
    #[must_use]
    pub fn render(&self, id: NodeId) -> String {
        match self.node(id) {
            NodeData::Literal(value) => value.to_string(),
            NodeData::Var { name, .. } => format!("(var '{name}')"),
            NodeData::Call { operator, args } => {
                let mut out = format!("({operator}");
                for arg in args {
                    out.push(' ');
                    out.push_str(&self.render(*arg));
                }
                out.push(')');
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_assigns_sequential_ids() {
        let mut dag = Dag::new();
        let a = dag.push(NodeData::Literal(Value::Int(1)));
        let b = dag.push(NodeData::Literal(Value::Int(2)));
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(dag.len(), 2);
    }

    #[test]
    fn validate_accepts_forward_edges() {
        let mut dag = Dag::new();
        let a = dag.push(NodeData::Literal(Value::from("x")));
        let _ = dag.push(NodeData::Call {
            operator: "p".to_owned(),
            args: vec![a],
        });
        assert!(dag.validate());
    }

    #[test]
    fn validate_rejects_self_edge() {
        let mut dag = Dag::new();
        // Forged by hand; interning can never produce this shape.
        dag.push(NodeData::Call {
            operator: "p".to_owned(),
            args: vec![NodeId(0)],
        });
        assert!(!dag.validate());
    }

    #[test]
    fn render_sexpr() {
        let mut dag = Dag::new();
        let pat = dag.push(NodeData::Literal(Value::from("GET")));
        let var = dag.push(NodeData::Var {
            name: "REQUEST_METHOD".to_owned(),
            phase: Phase::RequestHeader,
        });
        let call = dag.push(NodeData::Call {
            operator: "rx".to_owned(),
            args: vec![pat, var],
        });
        assert_eq!(dag.render(call), "(rx 'GET' (var 'REQUEST_METHOD'))");
    }
}
