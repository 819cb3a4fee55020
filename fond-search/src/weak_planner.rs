use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use fond_heuristic::{HeuristicConfig, HeuristicResult, ReachabilityIndex};
use fond_model::{OpId, PartialState, Task};
use fond_policy::FsapPolicy;

/// The weak planner (component 1, spec.md §2): given an initial state and a goal, returns a
/// sequenced deterministic plan over the task's determinization, or reports "no plan". Its
/// internal search algorithm is explicitly a non-goal of spec.md — only this trait's contract
/// matters to the driver, so an alternative implementation can be substituted without touching
/// case 5.
///
/// `combine` enables the §4.5 dead-end-combination rule in the planner's own successor
/// computation; whenever that rule synthesises a new dead-end region (every successor at some
/// internally-visited state turned out forbidden), it is pushed onto `discovered_deadends` for
/// the caller to register via §4.4 — the weak planner only observes these in passing during its
/// search and has no policy-mutation access of its own.
pub trait WeakPlanner {
    fn plan(
        &self,
        task: &Task,
        from: &PartialState,
        goal: &PartialState,
        fsaps: Option<&FsapPolicy>,
        combine: bool,
        discovered_deadends: &mut Vec<PartialState>,
    ) -> Option<Vec<OpId>>;
}

/// A greedy best-first weak planner over the hadd relaxation (grounded on
/// `planning/planning/src/classical/heuristics.rs`'s `hadd` relaxation and general
/// best-first-search shape). Operates directly over the task's full determinization: every
/// outcome operator of every non-deterministic action is a plain deterministic STRIPS operator,
/// so ordinary `Task::applicable_ops`/`PartialState::progress` already give a correct successor
/// relation.
pub struct GreedyWeakPlanner {
    index: ReachabilityIndex,
    heuristic: HeuristicConfig,
    node_limit: usize,
}

impl GreedyWeakPlanner {
    pub fn new(task: &Task) -> Self {
        GreedyWeakPlanner {
            index: ReachabilityIndex::build(task),
            heuristic: HeuristicConfig::default(),
            node_limit: 200_000,
        }
    }

    pub fn with_heuristic_config(mut self, config: HeuristicConfig) -> Self {
        self.heuristic = config;
        self
    }
}

impl WeakPlanner for GreedyWeakPlanner {
    fn plan(
        &self,
        task: &Task,
        from: &PartialState,
        goal: &PartialState,
        fsaps: Option<&FsapPolicy>,
        combine: bool,
        discovered_deadends: &mut Vec<PartialState>,
    ) -> Option<Vec<OpId>> {
        if from.entails(goal) {
            return Some(Vec::new());
        }

        let h = |s: &PartialState| match fond_heuristic::compute(task, &self.index, s, goal, fsaps, &self.heuristic, false) {
            HeuristicResult::DeadEnd => None,
            HeuristicResult::Reachable { value, .. } => Some(value),
        };

        let mut states: Vec<PartialState> = vec![from.clone()];
        let mut parent: Vec<Option<(usize, OpId)>> = vec![None];
        let mut visited: HashSet<PartialState> = HashSet::new();
        visited.insert(from.clone());

        let mut open: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();
        let h0 = h(from)?;
        open.push(Reverse((h0, 0)));

        let mut expansions = 0usize;
        while let Some(Reverse((_, idx))) = open.pop() {
            expansions += 1;
            if expansions > self.node_limit {
                return None;
            }
            let state = states[idx].clone();
            if state.entails(goal) {
                let mut plan = Vec::new();
                let mut cur = idx;
                while let Some((p, op)) = parent[cur] {
                    plan.push(op);
                    cur = p;
                }
                plan.reverse();
                return Some(plan);
            }

            let successors = match fsaps {
                Some(f) => {
                    let result = fond_policy::deadend_successors(task, f, &state, combine);
                    if let Some(deadend) = result.new_deadend {
                        discovered_deadends.push(deadend);
                    }
                    result.ops
                }
                None => task.applicable_ops(&state),
            };
            for op_id in successors {
                let succ = state.progress(task.op(op_id));
                if visited.insert(succ.clone()) {
                    let Some(hs) = h(&succ) else { continue };
                    let new_idx = states.len();
                    states.push(succ);
                    parent.push(Some((idx, op_id)));
                    open.push(Reverse((hs, new_idx)));
                }
            }
        }
        None
    }
}
