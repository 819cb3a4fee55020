use std::collections::HashSet;

use fond_model::{OpId, PartialState, Task};
use fond_policy::FsapPolicy;

use crate::index::ReachabilityIndex;

pub type Cost = u32;

/// Clamp applied to any single cost to guard against overflow from pathological FSAP-penalty
/// accumulation; see spec.md §7, "heuristic overflow" is a warning, not an error.
const DEFAULT_COST_CAP: Cost = 100_000_000;

/// The tunable knobs of the FSAP-penalised reachability heuristic (spec.md §6).
#[derive(Clone, Copy, Debug)]
pub struct HeuristicConfig {
    pub penalize_potential_fsaps: bool,
    pub fsap_penalty: Cost,
    pub cost_cap: Cost,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        HeuristicConfig {
            penalize_potential_fsaps: false,
            fsap_penalty: 0,
            cost_cap: DEFAULT_COST_CAP,
        }
    }
}

/// Outcome of one reachability computation: either a finite cost estimate (plus, in extended
/// mode, a set of preferred operators), or "dead end" when some goal proposition is unreachable.
pub enum HeuristicResult {
    DeadEnd,
    Reachable { value: Cost, preferred: Vec<OpId> },
}

impl HeuristicResult {
    pub fn is_dead_end(&self) -> bool {
        matches!(self, HeuristicResult::DeadEnd)
    }
}

/// Computes relaxed-plan reachability from `state` (hadd-style: additive precondition cost),
/// penalised per spec.md §4.9 by the FSAP set. When `extended` is set, also extracts a relaxed
/// plan and marks its applicable-at-`state` operators as preferred.
pub fn compute(
    task: &Task,
    index: &ReachabilityIndex,
    state: &PartialState,
    goal: &PartialState,
    fsaps: Option<&FsapPolicy>,
    config: &HeuristicConfig,
    extended: bool,
) -> HeuristicResult {
    let mut cost = vec![Cost::MAX; index.num_props];
    for v in 0..task.num_vars() {
        if state.is_set(v) {
            cost[index.prop_id(v, state.get(v))] = 0;
        }
    }

    // achiever[p] = index into index.relaxed_ops of the cheapest op seen so far achieving p;
    // used only for relaxed-plan extraction in extended mode.
    let mut achiever: Vec<Option<usize>> = vec![None; index.num_props];
    let mut charged_fsaps = HashSet::new();
    let mut clamped = false;

    let mut changed = true;
    while changed {
        changed = false;
        for (op_idx, rop) in index.relaxed_ops.iter().enumerate() {
            if !rop.preconditions.iter().all(|&p| cost[p] != Cost::MAX) {
                continue;
            }
            let precond_cost: u64 = rop.preconditions.iter().map(|&p| cost[p] as u64).sum();
            let mut total = rop.base_cost as u64 + precond_cost;

            if config.penalize_potential_fsaps {
                if let Some(fsaps) = fsaps {
                    for (fsap_id, fsap) in fsaps.iter() {
                        if fsap.nondet != rop.nondet || charged_fsaps.contains(&fsap_id) {
                            continue;
                        }
                        let all_reached = (0..task.num_vars())
                            .all(|v| !fsap.state.is_set(v) || cost[index.prop_id(v, fsap.state.get(v))] != Cost::MAX);
                        if all_reached {
                            charged_fsaps.insert(fsap_id);
                            total += config.fsap_penalty as u64;
                        }
                    }
                }
            }

            let clamped_total = total.min(config.cost_cap as u64) as Cost;
            if total > config.cost_cap as u64 && !clamped {
                tracing::warn!(op = %rop.op.to_u32(), "reachability heuristic cost clamped at cap");
                clamped = true;
            }
            if clamped_total < cost[rop.effect] {
                cost[rop.effect] = clamped_total;
                achiever[rop.effect] = Some(op_idx);
                changed = true;
            }
        }
    }

    let mut value: u64 = 0;
    for v in 0..task.num_vars() {
        if goal.is_set(v) {
            let c = cost[index.prop_id(v, goal.get(v))];
            if c == Cost::MAX {
                return HeuristicResult::DeadEnd;
            }
            value += c as u64;
        }
    }
    let value = value.min(config.cost_cap as u64) as Cost;

    let preferred = if extended {
        extract_preferred(task, index, goal, &cost, &achiever, state, fsaps)
    } else {
        Vec::new()
    };

    HeuristicResult::Reachable { value, preferred }
}

/// Walks the achiever chain backward from every goal proposition, collecting the relaxed
/// plan's operators; returns those that are directly applicable at `state` and not forbidden.
fn extract_preferred(
    task: &Task,
    index: &ReachabilityIndex,
    goal: &PartialState,
    cost: &[Cost],
    achiever: &[Option<usize>],
    state: &PartialState,
    fsaps: Option<&FsapPolicy>,
) -> Vec<OpId> {
    let mut needed = Vec::new();
    for v in 0..task.num_vars() {
        if goal.is_set(v) {
            needed.push(index.prop_id(v, goal.get(v)));
        }
    }

    let mut plan_ops: HashSet<OpId> = HashSet::new();
    let mut seen_props = HashSet::new();
    while let Some(p) = needed.pop() {
        if cost[p] == 0 || !seen_props.insert(p) {
            continue;
        }
        if let Some(op_idx) = achiever[p] {
            let rop = &index.relaxed_ops[op_idx];
            plan_ops.insert(rop.op);
            for &pre in &rop.preconditions {
                needed.push(pre);
            }
        }
    }

    let forbidden = fsaps.map(|f| f.forbidden_in(state));
    plan_ops
        .into_iter()
        .filter(|&op_id| {
            let op = task.op(op_id);
            op.is_applicable(state) && forbidden.as_ref().map_or(true, |f| !f.contains_key(&op.nondet_id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fond_model::{Condition, Effect, NondetAction, NondetId, Operator, Variable};

    fn chain_task() -> Task {
        // x: 0 -> 1 -> 2, goal x=2
        let variables = vec![Variable {
            name: "x".into(),
            domain_size: 3,
            fact_names: vec![],
        }];
        let step1 = Operator {
            name: "step1".into(),
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
        let step2 = Operator {
            name: "step2".into(),
            preconditions: vec![Condition { var: 0, val: 1 }],
            effects: vec![Effect {
                var: 0,
                val: 2,
                condition: vec![],
            }],
            cost: 1,
            nondet_id: NondetId::from_u32(1),
            outcome_index: 0,
        };
        Task::new(
            variables,
            vec![step1, step2],
            vec![
                NondetAction {
                    name: "step1".into(),
                    outcomes: vec![OpId::from_u32(0)],
                },
                NondetAction {
                    name: "step2".into(),
                    outcomes: vec![OpId::from_u32(1)],
                },
            ],
            PartialState::from_values(vec![0]),
            PartialState::from_values(vec![2]),
        )
    }

    #[test]
    fn reachable_goal_gets_additive_cost() {
        let task = chain_task();
        let index = ReachabilityIndex::build(&task);
        let config = HeuristicConfig::default();
        let result = compute(&task, &index, &task.initial_state, &task.goal, None, &config, false);
        match result {
            HeuristicResult::Reachable { value, .. } => assert_eq!(value, 2),
            HeuristicResult::DeadEnd => panic!("expected reachable"),
        }
    }

    #[test]
    fn unreachable_goal_is_a_dead_end() {
        let task = chain_task();
        let index = ReachabilityIndex::build(&task);
        let config = HeuristicConfig::default();
        // var x has no operator making it reach value 2 from a state where x is unset entirely
        let empty = PartialState::new_unset(1);
        let result = compute(&task, &index, &empty, &task.goal, None, &config, false);
        assert!(result.is_dead_end());
    }

    #[test]
    fn fsap_penalty_increases_cost_when_enabled() {
        let task = chain_task();
        let index = ReachabilityIndex::build(&task);
        let mut fsaps = FsapPolicy::new();
        fsaps.add(PartialState::from_values(vec![0]), NondetId::from_u32(0));

        let unpenalized = HeuristicConfig::default();
        let base = match compute(&task, &index, &task.initial_state, &task.goal, Some(&fsaps), &unpenalized, false) {
            HeuristicResult::Reachable { value, .. } => value,
            HeuristicResult::DeadEnd => panic!(),
        };

        let penalized = HeuristicConfig {
            penalize_potential_fsaps: true,
            fsap_penalty: 1000,
            ..HeuristicConfig::default()
        };
        let with_penalty = match compute(&task, &index, &task.initial_state, &task.goal, Some(&fsaps), &penalized, false) {
            HeuristicResult::Reachable { value, .. } => value,
            HeuristicResult::DeadEnd => panic!(),
        };
        assert_eq!(with_penalty, base + 1000);
    }

    #[test]
    fn extended_mode_marks_applicable_relaxed_plan_op_as_preferred() {
        let task = chain_task();
        let index = ReachabilityIndex::build(&task);
        let config = HeuristicConfig::default();
        let result = compute(&task, &index, &task.initial_state, &task.goal, None, &config, true);
        match result {
            HeuristicResult::Reachable { preferred, .. } => {
                assert!(preferred.contains(&OpId::from_u32(0)));
            }
            HeuristicResult::DeadEnd => panic!(),
        }
    }
}
