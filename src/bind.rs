use tracing::debug;

use crate::types::error::BindError;
use crate::types::node::{Dag, NodeData, NodeId};
use crate::types::Phase;

/// Assign each rule root the phase at which it becomes eligible.
///
/// Every node's minimal phase is the latest phase among its dependencies;
/// variable references carry the intrinsic phase recorded at intern time.
/// A rule may declare a later phase, but declaring an earlier one than its
/// dependencies allow is a conflict, never a silent degradation.
pub(crate) fn bind(
    dag: &Dag,
    rules: &[(String, NodeId, Option<Phase>)],
) -> Result<Vec<Phase>, BindError> {
    let node_phases = compute_node_phases(dag);

    let mut bound = Vec::with_capacity(rules.len());
    for (id, root, declared) in rules {
        let required = node_phases[root.index()];
        let phase = match declared {
            Some(declared) if *declared < required => {
                return Err(BindError::PhaseConflict {
                    rule: id.clone(),
                    declared: *declared,
                    required,
                });
            }
            Some(declared) => *declared,
            None => required,
        };
        debug!(rule = %id, phase = %phase, "rule bound");
        bound.push(phase);
    }
    Ok(bound)
}

/// One forward pass suffices: children always precede parents in the arena.
fn compute_node_phases(dag: &Dag) -> Vec<Phase> {
    let mut phases = Vec::with_capacity(dag.len());
    for index in 0..dag.len() {
        let phase = match dag.node(NodeId(index as u32)) {
            NodeData::Literal(_) => Phase::EARLIEST,
            NodeData::Var { phase, .. } => *phase,
            NodeData::Call { args, .. } => args
                .iter()
                .map(|a| phases[a.index()])
                .max()
                .unwrap_or(Phase::EARLIEST),
        };
        phases.push(phase);
    }
    phases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;
    use crate::operators::Registry;
    use crate::types::tree::{call, lit, var, TreeNode};
    use crate::types::FieldCatalog;

    fn bind_one(tree: TreeNode, declared: Option<Phase>) -> Result<Phase, BindError> {
        let (dag, roots) = build::build(
            &Registry::standard(),
            &FieldCatalog::standard(),
            &[],
            &[("r".to_owned(), tree)],
        )
        .unwrap();
        bind(&dag, &[("r".to_owned(), roots[0], declared)]).map(|phases| phases[0])
    }

    #[test]
    fn literal_rule_binds_earliest() {
        let phase = bind_one(lit("x"), None).unwrap();
        assert_eq!(phase, Phase::RequestHeader);
    }

    #[test]
    fn node_phase_is_max_of_children() {
        let tree = call("cat", vec![var("REQUEST_METHOD"), var("RESPONSE_BODY")]);
        let phase = bind_one(tree, None).unwrap();
        assert_eq!(phase, Phase::ResponseBody);
    }

    #[test]
    fn declared_later_phase_wins() {
        let phase = bind_one(var("REQUEST_METHOD"), Some(Phase::Logging)).unwrap();
        assert_eq!(phase, Phase::Logging);
    }

    #[test]
    fn declared_earlier_phase_conflicts() {
        let tree = call("p", vec![var("RESPONSE_BODY")]);
        let err = bind_one(tree, Some(Phase::RequestHeader)).unwrap_err();
        assert_eq!(
            err,
            BindError::PhaseConflict {
                rule: "r".into(),
                declared: Phase::RequestHeader,
                required: Phase::ResponseBody,
            }
        );
    }

    #[test]
    fn declared_equal_phase_accepted() {
        let tree = call("p", vec![var("REQUEST_BODY")]);
        let phase = bind_one(tree, Some(Phase::RequestBody)).unwrap();
        assert_eq!(phase, Phase::RequestBody);
    }
}
