use std::time::{Duration, Instant};

use fond_heuristic::{HeuristicResult, ReachabilityIndex};
use fond_model::{NondetId, OpId, PartialState, Task};
use fond_policy::{learn_from_failure, DeadendPolicy, FailedTuple, FsapPolicy, RegressableOperatorIndex};

use crate::config::PlannerConfig;
use crate::node::NodeId;
use crate::psgraph::PSGraph;
use crate::status::SearchStatus;
use crate::step::{strengthen, StepId};
use crate::weak_planner::WeakPlanner;

/// A failure observed while expanding a round (spec.md §4.4 input tuple), recorded on
/// [`SearchStatus`] and converted into [`FailedTuple`]s for `fond-policy::learn_from_failure` at
/// end of round.
pub struct FailedObservation {
    pub failed_state: PartialState,
    pub prev: Option<(PartialState, OpId)>,
}

/// Running totals reported by `fond-cli`'s ambient statistics block (SPEC_FULL.md §9.8).
#[derive(Default, Clone, Debug)]
pub struct Stats {
    pub rounds: u32,
    pub weak_plans_found: u32,
    pub weak_plans_failed: u32,
    pub fsap_count: usize,
    pub deadend_count: usize,
}

/// Why one round of the driver loop stopped.
enum RoundOutcome {
    /// The incumbent is strong cyclic: done.
    StrongCyclic,
    /// Case 6 (or case 1) fired on the original initial state: no strong cyclic solution exists.
    NoPlan,
    /// The queue ran dry and at least one failure was learned this round: the incumbent has
    /// been reset and another round should start immediately, within the same epoch.
    LearnedDeadends,
    /// The queue ran dry with nothing learned and no strong-cyclic incumbent: no further
    /// progress is possible without more information, so the search is done.
    Stuck,
    /// The round's deadline passed with the queue still non-empty.
    TimeExpired,
}

/// Safety bound on repeated dead-end-learning rounds within a single epoch, guarding against a
/// non-terminating learning loop; ordinary tasks converge in well under this many rounds.
const MAX_ROUNDS_PER_EPOCH: u32 = 10_000;

/// The FOND search driver (component 8): pops search nodes, dispatches each into one of the six
/// cases of spec.md §4.8, and learns dead-ends at the end of every round.
pub struct Driver<'t, W> {
    task: &'t Task,
    regressable: &'t RegressableOperatorIndex,
    heuristic_index: &'t ReachabilityIndex,
    weak_planner: &'t W,
}

impl<'t, W: WeakPlanner> Driver<'t, W> {
    pub fn new(task: &'t Task, regressable: &'t RegressableOperatorIndex, heuristic_index: &'t ReachabilityIndex, weak_planner: &'t W) -> Self {
        Driver {
            task,
            regressable,
            heuristic_index,
            weak_planner,
        }
    }

    /// Runs one round to completion (queue exhaustion, strong-cyclic incumbent, the
    /// no-strong-cyclic-plan terminal case, or the deadline). `status` is resumed if it was
    /// handed back from a prior, time-expired epoch.
    fn run_round(
        &self,
        psgraph: &mut PSGraph,
        fsaps: &mut FsapPolicy,
        deadends: &mut DeadendPolicy,
        config: &PlannerConfig,
        status: &mut SearchStatus,
        deadline: Option<Instant>,
        stats: &mut Stats,
        best_effort: &mut Option<PSGraph>,
    ) -> RoundOutcome {
        if status.is_fresh() {
            let goal = self.task.goal.clone();
            status.bootstrap(self.task.initial_state.clone(), goal);
        }

        loop {
            if let Some(dl) = deadline {
                if Instant::now() >= dl {
                    return RoundOutcome::TimeExpired;
                }
            }
            let Some(current_id) = status.pop_next() else {
                break;
            };
            if let Some(outcome) = self.dispatch(current_id, psgraph, fsaps, deadends, config, status, stats) {
                return outcome;
            }
        }

        psgraph.full_marking();
        if !status.failed.is_empty() {
            while let Some(failure) = status.failed.pop() {
                self.learn(self.task, fsaps, deadends, config, &failure);
            }
            stats.fsap_count = fsaps.len();
            stats.deadend_count = deadends.len();
            *best_effort = Some(psgraph.clone());
            *psgraph = PSGraph::new(self.task.goal.clone());
            return RoundOutcome::LearnedDeadends;
        }

        let initial_sc = psgraph
            .get_step(&self.task.initial_state)
            .map(|id| psgraph.step(id).is_sc)
            .unwrap_or(false);
        if initial_sc {
            RoundOutcome::StrongCyclic
        } else {
            RoundOutcome::Stuck
        }
    }

    fn learn(&self, task: &Task, fsaps: &mut FsapPolicy, deadends: &mut DeadendPolicy, config: &PlannerConfig, failure: &FailedObservation) {
        let tuple = FailedTuple {
            failed_state: failure.failed_state.clone(),
            prev: failure.prev.clone(),
        };
        if config.deadend.generalize {
            let mut is_dead_end = |s: &PartialState| self.relaxed_dead_end(task, fsaps, config, s);
            learn_from_failure(task, self.regressable, &tuple, fsaps, deadends, Some(&mut is_dead_end));
        } else {
            learn_from_failure(task, self.regressable, &tuple, fsaps, deadends, None);
        }
    }

    fn relaxed_dead_end(&self, task: &Task, fsaps: &FsapPolicy, config: &PlannerConfig, state: &PartialState) -> bool {
        matches!(
            fond_heuristic::compute(task, self.heuristic_index, state, &task.goal, Some(fsaps), &config.heuristic, false),
            HeuristicResult::DeadEnd
        )
    }

    /// Applies the six-case dispatcher of spec.md §4.8 to `current_id`. Returns `Some` to
    /// terminate the round immediately (strong cyclic incumbent or no-plan-at-init); `None` to
    /// keep popping.
    fn dispatch(
        &self,
        current_id: NodeId,
        psgraph: &mut PSGraph,
        fsaps: &mut FsapPolicy,
        deadends: &mut DeadendPolicy,
        config: &PlannerConfig,
        status: &mut SearchStatus,
        stats: &mut Stats,
    ) -> Option<RoundOutcome> {
        let current_state = status.node(current_id).full_state.clone();
        let current_goal = status.node(current_id).expected_state.clone();
        let previous_step = status.node(current_id).parent_step;
        let previous_info = status.node(current_id).previous.map(|prev_id| {
            let prev_node = status.node(prev_id);
            let outcome = status.node(current_id).prev_outcome.unwrap() as usize;
            let nondet = psgraph.step(previous_step.unwrap()).op.unwrap();
            let op = self.task.outcomes_of(nondet)[outcome];
            (prev_node.full_state.clone(), op, outcome)
        });

        // Case 1 — poisoned.
        let is_known_deadend = config.deadend.enabled && deadends.check_entailed_match(&current_state);
        let is_relaxed_deadend =
            config.deadend.enabled && config.deadend.record_online && self.relaxed_dead_end(self.task, fsaps, config, &current_state);
        if status.node(current_id).poisoned || is_known_deadend || is_relaxed_deadend {
            if current_state == self.task.initial_state {
                return Some(RoundOutcome::NoPlan);
            }
            if config.deadend.poison_search {
                status.poison_forward(current_id);
            }
            status.failed.push(FailedObservation {
                failed_state: current_state.clone(),
                prev: previous_info.clone().map(|(s, op, _)| (s, op)),
            });
            return None;
        }

        // Case 2 — duplicate full state.
        if let Some(original_id) = status.node_for_state(&current_state) {
            if original_id != current_id {
                if let Some(prev_id) = status.node(current_id).previous {
                    if let Some(pos) = status.node(prev_id).next.iter().position(|&n| n == current_id) {
                        status.node_mut(prev_id).next[pos] = original_id;
                    }
                    status.node_mut(original_id).incoming += 1;
                }
                let original_matched = status.node(original_id).matched_step;
                if let (Some(prev_step), Some(orig_step)) = (previous_step, original_matched) {
                    let (_, _, outcome) = previous_info.clone().unwrap();
                    self.strengthen_and_mark(psgraph, fsaps, prev_step, outcome, orig_step, &current_state);
                }
                status.node_mut(current_id).subsumed = true;
                return None;
            }
        } else {
            status.record_seen(current_state.clone(), current_id);
        }

        // Case 3 — predefined path.
        if let (Some(prev_step), Some((_, _, outcome))) = (previous_step, previous_info.clone()) {
            if let Some(step_id) = psgraph.step(prev_step).successors[outcome] {
                debug_assert!(current_state.entails(&psgraph.step(step_id).state));
                self.expand(psgraph, status, current_id, step_id, config);
                return None;
            }
        }

        // Case 4 — hook-up.
        if let Some(step_id) = psgraph.get_step(&current_state) {
            self.expand(psgraph, status, current_id, step_id, config);
            if let (Some(prev_step), Some((_, _, outcome))) = (previous_step, previous_info.clone()) {
                self.strengthen_and_mark(psgraph, fsaps, prev_step, outcome, step_id, &current_state);
            }
            return None;
        }

        // Case 5 — new path via the weak planner.
        let plan_goal = if config.localize { current_goal.clone() } else { self.task.goal.clone() };
        let combine = config.deadend.enabled && config.deadend.combine;
        let mut discovered_deadends = Vec::new();
        let plan = self
            .weak_planner
            .plan(self.task, &current_state, &plan_goal, Some(fsaps), combine, &mut discovered_deadends);
        for deadend in discovered_deadends {
            self.learn(
                self.task,
                fsaps,
                deadends,
                config,
                &FailedObservation { failed_state: deadend, prev: None },
            );
        }
        if let Some(plan) = plan {
            stats.weak_plans_found += 1;
            let head = self.insert_plan_as_chain(psgraph, fsaps, &plan, &current_state, &plan_goal);
            self.expand(psgraph, status, current_id, head, config);
            if let (Some(prev_step), Some((_, _, outcome))) = (previous_step, previous_info) {
                self.strengthen_and_mark(psgraph, fsaps, prev_step, outcome, head, &current_state);
            }
            return None;
        }
        stats.weak_plans_failed += 1;

        // Case 6 — dead end.
        if current_state == self.task.initial_state {
            return Some(RoundOutcome::NoPlan);
        }
        if config.deadend.poison_search {
            status.poison_forward(current_id);
        }
        status.failed.push(FailedObservation {
            failed_state: current_state,
            prev: previous_info.map(|(s, op, _)| (s, op)),
        });
        None
    }

    /// Expand(node, step) of spec.md §4.8: records the match, then — unless `step` is already a
    /// terminal (goal or strong cyclic) step — progresses `node`'s full state through every
    /// outcome of `step.op`, creating one child search node per outcome.
    ///
    /// Every child, including the one on `step.expected_id`, is simply pushed to the open list:
    /// the expected-outcome child will be popped later and immediately hit case 3, since its
    /// parent step's successor slot is already wired by the time it is dispatched. This is
    /// observably equivalent to spec.md's "the expected-outcome state continues the chain"
    /// without needing a separate code path for eager continuation.
    fn expand(&self, psgraph: &PSGraph, status: &mut SearchStatus, node_id: NodeId, step_id: StepId, config: &PlannerConfig) {
        status.mark_matched(node_id, step_id);
        let step = psgraph.step(step_id);
        if step.is_goal || step.is_sc {
            return;
        }
        let nondet = step.op.expect("non-goal step has an operator");
        let outcomes = self.task.outcomes_of(nondet).to_vec();
        let full_state = status.node(node_id).full_state.clone();
        let expected_state = status.node(node_id).expected_state.clone();

        for (outcome_idx, &op_id) in outcomes.iter().enumerate() {
            let op = self.task.op(op_id);
            let child_full = full_state.progress(op);
            // When this outcome's successor slot isn't wired yet, there is no more specific
            // sub-goal to localize on than the one already in force at this node.
            let child_expected = if config.localize {
                match psgraph.step(step_id).successors.get(outcome_idx).copied().flatten() {
                    Some(succ) => psgraph.step(succ).state.clone(),
                    None => expected_state.clone(),
                }
            } else {
                self.task.goal.clone()
            };
            status.push_child(child_full, child_expected, step_id, node_id, outcome_idx as u32);
        }
    }

    /// Wires `prev_step`'s `outcome` successor to `dst`, splitting `prev_step` if needed
    /// (spec.md §4.7's `fixed_point_regression`, via `PSGraph::fixed_point_regression`).
    fn strengthen_and_mark(&self, psgraph: &mut PSGraph, fsaps: &FsapPolicy, prev_step: StepId, outcome: usize, dst: StepId, context: &PartialState) {
        let _ = fsaps; // strengthening already happened when `dst`'s state was built/regressed.
        psgraph.fixed_point_regression(prev_step, outcome, dst, context);
    }

    /// Regresses a weak plan from its goal backward (spec.md §4.8 case 5 / §4.6), producing a
    /// chain of new solution steps wired into the PSGraph. Returns the id of the chain's head —
    /// the step whose state entails `start_state`, i.e. the first action the plan actually
    /// takes.
    fn insert_plan_as_chain(&self, psgraph: &mut PSGraph, fsaps: &FsapPolicy, plan: &[OpId], start_state: &PartialState, goal_state: &PartialState) -> StepId {
        let mut contexts = vec![start_state.clone()];
        for &op_id in plan {
            let next = contexts.last().unwrap().progress(self.task.op(op_id));
            contexts.push(next);
        }

        let mut next_partial_state = goal_state.clone();
        let mut next_step_id = psgraph.get_step(&next_partial_state).unwrap_or_else(|| psgraph.goal_id());

        for i in (0..plan.len()).rev() {
            let op_id = plan[i];
            let op = self.task.op(op_id);
            let nondet: NondetId = op.nondet_id;
            let context = &contexts[i];
            let mut state = next_partial_state.regress(op, context);
            strengthen(&mut state, nondet, context, fsaps);

            let outcomes = self.task.outcomes_of(nondet);
            let expected_id = outcomes.iter().position(|&o| o == op_id).expect("plan operator is an outcome of its own nondet action") as u32;
            let step_id = psgraph.add_step(state.clone(), nondet, outcomes.len(), expected_id);
            psgraph.connect(step_id, expected_id as usize, next_step_id);

            next_partial_state = state;
            next_step_id = step_id;
        }
        next_step_id
    }
}

/// Overall result of a PRP run (spec.md §2 component 9 / §7 error taxonomy).
pub enum PlanOutcome {
    StrongCyclic,
    NotStrongCyclic,
    TimeExhausted,
}

pub struct PlanResult {
    pub outcome: PlanOutcome,
    pub psgraph: PSGraph,
    pub fsaps: FsapPolicy,
    pub deadends: DeadendPolicy,
    pub stats: Stats,
}

/// The PRP wrapper (component 9): the epoch/time-budget controller that invokes the driver
/// repeatedly until a strong-cyclic policy is found, the time limit is exceeded, or the initial
/// state is proved a dead end.
pub struct PrpPlanner<'t, W> {
    task: &'t Task,
    regressable: RegressableOperatorIndex,
    heuristic_index: ReachabilityIndex,
    weak_planner: W,
    config: PlannerConfig,
}

impl<'t, W: WeakPlanner> PrpPlanner<'t, W> {
    pub fn new(task: &'t Task, weak_planner: W, config: PlannerConfig) -> Self {
        PrpPlanner {
            task,
            regressable: RegressableOperatorIndex::build(task),
            heuristic_index: ReachabilityIndex::build(task),
            weak_planner,
            config,
        }
    }

    /// Runs to completion. `time_budget` of `None` means unlimited (used by tests and by
    /// `fond-cli` when no `--time-limit` was given): the driver keeps re-running rounds — each
    /// pass resetting the incumbent after learning new dead-ends — until a strong-cyclic policy
    /// is found or the initial state is proved a dead end.
    ///
    /// When a `time_budget` is given, `epoch.max` slices it into that many epochs; a round that
    /// hits its epoch's deadline hands its `SearchStatus` back so the next epoch resumes exactly
    /// where it left off (spec.md §5, §8 S6).
    pub fn run(mut self, time_budget: Option<Duration>) -> PlanResult {
        let mut psgraph = PSGraph::new(self.task.goal.clone());
        let mut fsaps = FsapPolicy::new();
        let mut deadends = DeadendPolicy::new();
        let mut stats = Stats::default();

        let overall_deadline = time_budget.map(|d| Instant::now() + d);
        let epoch_count = if time_budget.is_some() { self.config.epoch_max.max(1) } else { 1 };
        let per_epoch = time_budget.map(|d| d / epoch_count);

        let mut saved_status: Option<SearchStatus> = None;
        // The last round's graph, saved just before a dead-end learning reset invalidates the
        // current incumbent — surfaced as the best-effort policy if the search never recovers
        // a strong-cyclic one (spec.md §8 S2: "the incumbent policy still contains the original
        // single step").
        let mut best_effort: Option<PSGraph> = None;

        for epoch in 0..epoch_count {
            let driver = Driver::new(self.task, &self.regressable, &self.heuristic_index, &self.weak_planner);
            let mut config = self.config.clone();
            let is_final_epoch = epoch + 1 == epoch_count;
            if is_final_epoch && self.config.final_fsap_free_round {
                config.deadend = crate::config::DeadendConfig::disabled();
            }

            let epoch_deadline = match (overall_deadline, per_epoch) {
                (Some(overall), Some(budget)) => Some(overall.min(Instant::now() + budget)),
                _ => None,
            };

            'rounds: loop {
                let mut status = saved_status.take().unwrap_or_else(|| SearchStatus::new(config.node_preference));
                stats.rounds += 1;
                let outcome = driver.run_round(
                    &mut psgraph,
                    &mut fsaps,
                    &mut deadends,
                    &config,
                    &mut status,
                    epoch_deadline,
                    &mut stats,
                    &mut best_effort,
                );

                match outcome {
                    RoundOutcome::StrongCyclic => {
                        return PlanResult {
                            outcome: PlanOutcome::StrongCyclic,
                            psgraph,
                            fsaps,
                            deadends,
                            stats,
                        };
                    }
                    RoundOutcome::NoPlan => {
                        return PlanResult {
                            outcome: PlanOutcome::NotStrongCyclic,
                            psgraph: best_effort.unwrap_or(psgraph),
                            fsaps,
                            deadends,
                            stats,
                        };
                    }
                    RoundOutcome::Stuck => {
                        return PlanResult {
                            outcome: PlanOutcome::NotStrongCyclic,
                            psgraph,
                            fsaps,
                            deadends,
                            stats,
                        };
                    }
                    RoundOutcome::TimeExpired => {
                        saved_status = Some(status);
                        break 'rounds;
                    }
                    RoundOutcome::LearnedDeadends => {
                        saved_status = None;
                        if stats.rounds >= MAX_ROUNDS_PER_EPOCH {
                            break 'rounds;
                        }
                    }
                }
            }

            if let Some(dl) = overall_deadline {
                if Instant::now() >= dl {
                    break;
                }
            }
        }

        PlanResult {
            outcome: PlanOutcome::TimeExhausted,
            psgraph,
            fsaps,
            deadends,
            stats,
        }
    }
}
