use fond_model::{OpId, PartialState, Task};

use crate::fsap::{DeadendPolicy, FsapPolicy};
use crate::regressable::RegressableOperatorIndex;

/// A failure observed by the driver (spec.md §4.4): `failed_state` is known to be a dead end;
/// if it was reached from `prev_state` by applying outcome `prev_op`, that is recorded too.
pub struct FailedTuple {
    pub failed_state: PartialState,
    pub prev: Option<(PartialState, OpId)>,
}

/// Learns FSAPs and a dead-end from one observed failure (spec.md §4.4, steps 1-4).
///
/// `generalize` is the optional relaxed-dead-end minimisation: given a candidate state with one
/// fewer variable set, it must report whether that weaker state is still a dead end.
pub fn learn_from_failure(
    task: &Task,
    regressable: &RegressableOperatorIndex,
    failure: &FailedTuple,
    fsaps: &mut FsapPolicy,
    deadends: &mut DeadendPolicy,
    generalize: Option<&mut dyn FnMut(&PartialState) -> bool>,
) {
    let de_state = match generalize {
        Some(is_dead_end) => generalize_deadend(&failure.failed_state, is_dead_end),
        None => failure.failed_state.clone(),
    };
    deadends.add(de_state);

    for r in regressable.unconditional_matches(&failure.failed_state) {
        let state = failure.failed_state.regress(task.op(r.op), &r.context);
        fsaps.add(state, r.nondet);
    }
    for r in regressable.all_fire_matches(&failure.failed_state) {
        let state = failure.failed_state.regress(task.op(r.op), &r.context);
        fsaps.add(state, r.nondet);
    }
    if let Some((prev_state, prev_op)) = &failure.prev {
        let op = task.op(*prev_op);
        let state = failure.failed_state.regress(op, prev_state);
        fsaps.add(state, op.nondet_id);
    }
}

/// Dead-end generalisation (spec.md §4.4, optional): iteratively unset each variable and keep
/// it unset if the relaxed reachability still reports a dead end, yielding a minimal relaxed
/// dead-end partial state.
fn generalize_deadend(state: &PartialState, is_dead_end: &mut dyn FnMut(&PartialState) -> bool) -> PartialState {
    let mut current = state.clone();
    for var in 0..current.num_vars() {
        if current.is_set(var) {
            let mut trial = current.clone();
            trial.unset(var);
            if is_dead_end(&trial) {
                current = trial;
            }
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use fond_model::{Condition, Effect, NondetAction, NondetId, Operator, Variable};

    fn single_effect_task() -> Task {
        let variables = vec![Variable {
            name: "x".into(),
            domain_size: 2,
            fact_names: vec![],
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
            outcomes: vec![OpId::from_u32(0)],
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
    fn learning_from_unconditional_regression_forbids_the_producing_action() {
        let task = single_effect_task();
        let regressable = RegressableOperatorIndex::build(&task);
        let mut fsaps = FsapPolicy::new();
        let mut deadends = DeadendPolicy::new();

        let failure = FailedTuple {
            failed_state: PartialState::from_values(vec![1]),
            prev: None,
        };
        learn_from_failure(&task, &regressable, &failure, &mut fsaps, &mut deadends, None);

        assert_eq!(deadends.len(), 1);
        assert_eq!(fsaps.len(), 1);
        let (_, fsap) = fsaps.entailed(&PartialState::from_values(vec![0])).into_iter().next().unwrap();
        assert_eq!(fsap.nondet, NondetId::from_u32(0));
    }

    #[test]
    fn generalize_deadend_unsets_irrelevant_variables() {
        // var0 must stay set to remain a dead end; var1 never matters.
        let state = PartialState::from_values(vec![0, 1]);
        let mut still_dead = |s: &PartialState| s.get(0) != -1;
        let generalized = generalize_deadend(&state, &mut still_dead);
        assert_eq!(generalized.get(0), 0);
        assert_eq!(generalized.get(1), -1);
    }
}
