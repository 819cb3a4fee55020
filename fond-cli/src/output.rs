use std::collections::HashMap;
use std::path::Path;

use fond_model::{PartialState, Task, UNSET};
use fond_policy::FsapPolicy;
use fond_search::psgraph::PSGraph;
use serde::Serialize;

/// Renders a partial state as `var=val` pairs, using the task's fact names when available
/// (spec.md §6 "textual dump of `policy.out`").
pub fn format_partial_state(task: &Task, state: &PartialState) -> String {
    let mut parts = Vec::new();
    for (var, variable) in task.variables.iter().enumerate() {
        let val = state.get(var);
        if val == UNSET {
            continue;
        }
        match variable.fact_names.get(val as usize) {
            Some(name) if !name.is_empty() => parts.push(name.clone()),
            _ => parts.push(format!("{}={}", variable.name, val)),
        }
    }
    if parts.is_empty() {
        "(any state)".to_string()
    } else {
        parts.join(" & ")
    }
}

/// *List* output (spec.md §6): textual dump of `policy.out` (solution policy as
/// partial-state → action lines) and `policy.fsap` (FSAP partial-state → forbidden
/// non-det-action-id).
pub fn write_list(task: &Task, psgraph: &PSGraph, fsaps: &FsapPolicy, out_dir: &Path) -> anyhow::Result<()> {
    let mut policy_out = String::new();
    for step in psgraph.active_steps() {
        let Some(nondet) = step.op else { continue };
        policy_out.push_str(&format!("{} : {}\n", format_partial_state(task, &step.state), task.nondet(nondet).name));
    }
    std::fs::write(out_dir.join("policy.out"), policy_out)?;

    let mut policy_fsap = String::new();
    for (_, fsap) in fsaps.iter() {
        policy_fsap.push_str(&format!("{} : {}\n", format_partial_state(task, &fsap.state), task.nondet(fsap.nondet).name));
    }
    std::fs::write(out_dir.join("policy.fsap"), policy_fsap)?;
    Ok(())
}

#[derive(Serialize)]
struct ControllerStep {
    id: u32,
    action: Option<String>,
    distance: u32,
    is_goal: bool,
    is_sc: bool,
    successors: Vec<Option<u32>>,
}

#[derive(Serialize)]
struct Controller {
    goal_id: u32,
    steps: Vec<ControllerStep>,
}

/// *Controller* output (spec.md §6): a JSON serialisation of the PSGraph (nodes = solution
/// steps with id, action, distance, flags, successors per outcome).
pub fn write_controller(task: &Task, psgraph: &PSGraph, out_dir: &Path) -> anyhow::Result<()> {
    let steps = psgraph
        .active_steps()
        .map(|s| ControllerStep {
            id: s.id.to_u32(),
            action: s.op.map(|nondet| task.nondet(nondet).name.clone()),
            distance: s.distance,
            is_goal: s.is_goal,
            is_sc: s.is_sc,
            successors: s.successors.iter().map(|succ| succ.map(|id| id.to_u32())).collect(),
        })
        .collect();
    let controller = Controller {
        goal_id: psgraph.goal_id().to_u32(),
        steps,
    };
    std::fs::write(out_dir.join("controller.json"), serde_json::to_string_pretty(&controller)?)?;
    Ok(())
}

/// *Match-tree* output (spec.md §6): a compiled decision tree over the policy's partial-state
/// keys, same content as the list dump. Grounded in the teacher's `successor_generator`-style
/// match-tree compiler referenced by SPEC_FULL.md §9.6, specialised here to the *output*
/// encoding — internal policy lookups stay the linear scan spec.md §4.2 explicitly allows.
#[derive(Serialize)]
#[serde(tag = "kind")]
enum MatchNode {
    Leaf { actions: Vec<String> },
    Split {
        var: usize,
        branches: HashMap<String, MatchNode>,
        default: Box<MatchNode>,
    },
}

fn build_match_tree(items: &[(PartialState, String)], num_vars: usize, var: usize) -> MatchNode {
    if var >= num_vars || items.len() <= 1 {
        return MatchNode::Leaf {
            actions: items.iter().map(|(_, label)| label.clone()).collect(),
        };
    }

    let mut by_value: HashMap<i32, Vec<(PartialState, String)>> = HashMap::new();
    let mut wildcard: Vec<(PartialState, String)> = Vec::new();
    for (state, label) in items {
        let v = state.get(var);
        if v == UNSET {
            wildcard.push((state.clone(), label.clone()));
        } else {
            by_value.entry(v).or_default().push((state.clone(), label.clone()));
        }
    }

    if by_value.is_empty() {
        return build_match_tree(items, num_vars, var + 1);
    }

    let branches = by_value
        .into_iter()
        .map(|(v, mut its)| {
            its.extend(wildcard.iter().cloned());
            (v.to_string(), build_match_tree(&its, num_vars, var + 1))
        })
        .collect();
    let default = Box::new(build_match_tree(&wildcard, num_vars, var + 1));

    MatchNode::Split { var, branches, default }
}

pub fn write_match_tree(task: &Task, psgraph: &PSGraph, fsaps: &FsapPolicy, out_dir: &Path) -> anyhow::Result<()> {
    let mut items: Vec<(PartialState, String)> = psgraph
        .active_steps()
        .filter_map(|s| s.op.map(|nondet| (s.state.clone(), task.nondet(nondet).name.clone())))
        .collect();
    items.extend(fsaps.iter().map(|(_, f)| (f.state.clone(), format!("FORBID:{}", task.nondet(f.nondet).name))));

    let tree = build_match_tree(&items, task.num_vars(), 0);
    std::fs::write(out_dir.join("policy.matchtree.json"), serde_json::to_string_pretty(&tree)?)?;
    Ok(())
}

/// Numbered JSON snapshot of the PSGraph at a driver checkpoint (spec.md §6 "Snapshots
/// (optional)"), for offline inspection.
pub fn write_snapshot(task: &Task, psgraph: &PSGraph, out_dir: &Path, round: u32) -> anyhow::Result<()> {
    let path = out_dir.join(format!("snapshot-{round:04}.json"));
    let steps: Vec<ControllerStep> = psgraph
        .active_steps()
        .map(|s| ControllerStep {
            id: s.id.to_u32(),
            action: s.op.map(|nondet| task.nondet(nondet).name.clone()),
            distance: s.distance,
            is_goal: s.is_goal,
            is_sc: s.is_sc,
            successors: s.successors.iter().map(|succ| succ.map(|id| id.to_u32())).collect(),
        })
        .collect();
    let controller = Controller {
        goal_id: psgraph.goal_id().to_u32(),
        steps,
    };
    std::fs::write(path, serde_json::to_string_pretty(&controller)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fond_model::{Condition, Effect, NondetAction, NondetId, Operator, Variable};

    fn tiny_task() -> Task {
        let variables = vec![Variable {
            name: "x".into(),
            domain_size: 2,
            fact_names: vec!["x=0".into(), "x=1".into()],
        }];
        let op = Operator {
            name: "try".into(),
            preconditions: vec![Condition { var: 0, val: 0 }],
            effects: vec![Effect {
                var: 0,
                val: 1,
                condition: vec![],
            }],
            cost: 1,
            nondet_id: NondetId::from_u32(0),
            outcome_index: 0,
        };
        let nondet = NondetAction {
            name: "try".into(),
            outcomes: vec![fond_model::OpId::from_u32(0)],
        };
        Task::new(
            variables,
            vec![op],
            vec![nondet],
            PartialState::from_values(vec![0]),
            PartialState::from_values(vec![1]),
        )
    }

    #[test]
    fn formats_partial_state_using_fact_names() {
        let task = tiny_task();
        let formatted = format_partial_state(&task, &task.initial_state);
        assert_eq!(formatted, "x=0");
    }

    #[test]
    fn unset_state_formats_as_any_state() {
        let task = tiny_task();
        let empty = PartialState::new_unset(1);
        assert_eq!(format_partial_state(&task, &empty), "(any state)");
    }

    #[test]
    fn match_tree_leaf_for_single_item() {
        let items = vec![(PartialState::from_values(vec![0]), "try".to_string())];
        let tree = build_match_tree(&items, 1, 0);
        match tree {
            MatchNode::Leaf { actions } => assert_eq!(actions, vec!["try".to_string()]),
            MatchNode::Split { .. } => panic!("expected leaf for a single item"),
        }
    }
}
