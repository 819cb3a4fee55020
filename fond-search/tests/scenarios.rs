//! End-to-end scenarios S1-S6 (spec.md §8 "End-to-end scenarios").

use std::time::Duration;

use fond_heuristic::HeuristicConfig;
use fond_model::{Condition, Effect, NondetAction, NondetId, OpId, Operator, PartialState, Task, Variable};
use fond_search::config::PlannerConfig;
use fond_search::weak_planner::GreedyWeakPlanner;
use fond_search::{PlanOutcome, PrpPlanner};

fn var(name: &str, domain_size: u32) -> Variable {
    Variable {
        name: name.to_string(),
        domain_size,
        fact_names: (0..domain_size).map(|v| format!("{name}={v}")).collect(),
    }
}

fn outcome(name: &str, nondet: u32, index: u32, pre: &[(u32, i32)], eff: &[(u32, i32)]) -> Operator {
    Operator {
        name: name.to_string(),
        preconditions: pre.iter().map(|&(var, val)| Condition { var, val }).collect(),
        effects: eff
            .iter()
            .map(|&(var, val)| Effect { var, val, condition: vec![] })
            .collect(),
        cost: 1,
        nondet_id: NondetId::from_u32(nondet),
        outcome_index: index,
    }
}

fn run(task: &Task, config: PlannerConfig) -> fond_search::PlanResult {
    let weak_planner = GreedyWeakPlanner::new(task).with_heuristic_config(config.heuristic);
    PrpPlanner::new(task, weak_planner, config).run(None)
}

/// S1: trivial single action, both outcomes reach the goal directly.
#[test]
fn s1_trivial_strong_cyclic() {
    let variables = vec![var("X", 2)];
    let ops = vec![
        outcome("try_a", 0, 0, &[(0, 0)], &[(0, 1)]),
        outcome("try_b", 0, 1, &[(0, 0)], &[(0, 1)]),
    ];
    let nondet = vec![NondetAction {
        name: "try".into(),
        outcomes: vec![OpId::from_u32(0), OpId::from_u32(1)],
    }];
    let task = Task::new(
        variables,
        ops,
        nondet,
        PartialState::from_values(vec![0]),
        PartialState::from_values(vec![1]),
    );

    let result = run(&task, PlannerConfig::default());
    assert!(matches!(result.outcome, PlanOutcome::StrongCyclic));
    let init_step = result.psgraph.get_step(&task.initial_state).expect("init state covered");
    let step = result.psgraph.step(init_step);
    assert!(step.is_sc);
    assert_eq!(result.psgraph.active_steps().filter(|s| !s.is_goal).count(), 1);
}

/// S2: one outcome of "try" is an unavoidable dead end, so no strong-cyclic plan exists.
#[test]
fn s2_unavoidable_deadend() {
    let variables = vec![var("X", 3)];
    let ops = vec![
        outcome("try_a", 0, 0, &[(0, 0)], &[(0, 1)]),
        outcome("try_b", 0, 1, &[(0, 0)], &[(0, 2)]),
    ];
    let nondet = vec![NondetAction {
        name: "try".into(),
        outcomes: vec![OpId::from_u32(0), OpId::from_u32(1)],
    }];
    let task = Task::new(
        variables,
        ops,
        nondet,
        PartialState::from_values(vec![0]),
        PartialState::from_values(vec![2]),
    );

    let result = run(&task, PlannerConfig::default());
    assert!(matches!(result.outcome, PlanOutcome::NotStrongCyclic));
    assert!(result.fsaps.len() >= 1, "an FSAP forbidding \"try\" at X=0 should have been learned");
    // Best-effort incumbent still contains at least the original single step.
    assert!(result.psgraph.active_steps().count() >= 1);
}

/// S3: a two-outcome loop between two actions converges to a strong-cyclic policy.
#[test]
fn s3_two_outcome_loop() {
    let variables = vec![var("X", 3)];
    let ops = vec![
        outcome("a_1", 0, 0, &[(0, 0)], &[(0, 1)]),
        outcome("a_2", 0, 1, &[(0, 0)], &[(0, 2)]),
        outcome("b_1", 1, 0, &[(0, 1)], &[(0, 0)]),
        outcome("b_2", 1, 1, &[(0, 1)], &[(0, 2)]),
    ];
    let nondet = vec![
        NondetAction {
            name: "a".into(),
            outcomes: vec![OpId::from_u32(0), OpId::from_u32(1)],
        },
        NondetAction {
            name: "b".into(),
            outcomes: vec![OpId::from_u32(2), OpId::from_u32(3)],
        },
    ];
    let task = Task::new(
        variables,
        ops,
        nondet,
        PartialState::from_values(vec![0]),
        PartialState::from_values(vec![2]),
    );

    let result = run(&task, PlannerConfig::default());
    assert!(matches!(result.outcome, PlanOutcome::StrongCyclic));
    for state in [0, 1] {
        let id = result.psgraph.get_step(&PartialState::from_values(vec![state])).expect("state covered");
        assert!(result.psgraph.step(id).is_sc, "state X={state} should be marked strong cyclic");
    }
}

/// S4: same task as S3, but with an FSAP penalty configured; the strong-cyclic plan must still
/// be found once an (irrelevant) FSAP has been learned.
#[test]
fn s4_fsap_penalty_does_not_block_solution() {
    let variables = vec![var("X", 3)];
    let ops = vec![
        outcome("a_1", 0, 0, &[(0, 0)], &[(0, 1)]),
        outcome("a_2", 0, 1, &[(0, 0)], &[(0, 2)]),
        outcome("b_1", 1, 0, &[(0, 1)], &[(0, 0)]),
        outcome("b_2", 1, 1, &[(0, 1)], &[(0, 2)]),
    ];
    let nondet = vec![
        NondetAction {
            name: "a".into(),
            outcomes: vec![OpId::from_u32(0), OpId::from_u32(1)],
        },
        NondetAction {
            name: "b".into(),
            outcomes: vec![OpId::from_u32(2), OpId::from_u32(3)],
        },
    ];
    let task = Task::new(
        variables,
        ops,
        nondet,
        PartialState::from_values(vec![0]),
        PartialState::from_values(vec![2]),
    );

    let mut config = PlannerConfig::default();
    config.heuristic = HeuristicConfig {
        penalize_potential_fsaps: true,
        fsap_penalty: 1000,
        ..HeuristicConfig::default()
    };

    let result = run(&task, config);
    assert!(matches!(result.outcome, PlanOutcome::StrongCyclic));
}

/// S5: a conditional effect is only included in the regressable-operator index when
/// precondition, condition, and post-effect are mutually consistent, and `regress` unsets the
/// effect variable while copying the condition context.
#[test]
fn s5_conditional_effect_regression() {
    use fond_policy::RegressableOperatorIndex;

    let variables = vec![var("X", 2), var("Y", 2)];
    let op = outcome("set_if_y0", 0, 0, &[], &[]);
    let op = Operator {
        effects: vec![Effect {
            var: 0,
            val: 1,
            condition: vec![Condition { var: 1, val: 0 }],
        }],
        ..op
    };
    let nondet = vec![NondetAction {
        name: "set_if_y0".into(),
        outcomes: vec![OpId::from_u32(0)],
    }];
    let task = Task::new(
        variables,
        vec![op],
        nondet,
        PartialState::from_values(vec![0, 0]),
        PartialState::from_values(vec![1, -1]),
    );

    let index = RegressableOperatorIndex::build(&task);
    let goal_query = PartialState::from_values(vec![1, -1]);
    assert!(
        index.all_fire_matches(&goal_query).next().is_some(),
        "the conditional effect must be regressable and match a state entailing its post-value"
    );

    let context = PartialState::from_values(vec![-1, 0]);
    let goal_like = PartialState::from_values(vec![1, -1]);
    let regressed = goal_like.regress(task.op(OpId::from_u32(0)), &context);
    assert_eq!(regressed.get(0), -1, "the effect variable is unset by regression");
    assert_eq!(regressed.get(1), 0, "the condition context (Y=0) is copied in");
}

/// S6: with a tight per-epoch time budget forcing more than one epoch, the result is identical
/// (up to ordering) to an unlimited single-epoch run on the same task.
#[test]
fn s6_epoch_resume_reaches_same_outcome() {
    let variables = vec![var("X", 3)];
    let ops = vec![
        outcome("a_1", 0, 0, &[(0, 0)], &[(0, 1)]),
        outcome("a_2", 0, 1, &[(0, 0)], &[(0, 2)]),
        outcome("b_1", 1, 0, &[(0, 1)], &[(0, 0)]),
        outcome("b_2", 1, 1, &[(0, 1)], &[(0, 2)]),
    ];
    let nondet = vec![
        NondetAction {
            name: "a".into(),
            outcomes: vec![OpId::from_u32(0), OpId::from_u32(1)],
        },
        NondetAction {
            name: "b".into(),
            outcomes: vec![OpId::from_u32(2), OpId::from_u32(3)],
        },
    ];
    let task = Task::new(
        variables,
        ops,
        nondet,
        PartialState::from_values(vec![0]),
        PartialState::from_values(vec![2]),
    );

    let mut config = PlannerConfig::default();
    config.epoch_max = 4;
    let weak_planner = GreedyWeakPlanner::new(&task).with_heuristic_config(config.heuristic);
    let resumed = PrpPlanner::new(&task, weak_planner, config).run(Some(Duration::from_millis(50)));

    let unlimited = run(&task, PlannerConfig::default());

    assert_eq!(
        matches!(resumed.outcome, PlanOutcome::StrongCyclic),
        matches!(unlimited.outcome, PlanOutcome::StrongCyclic)
    );
}
