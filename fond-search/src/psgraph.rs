use std::collections::{HashSet, VecDeque};

use fond_model::{NondetId, PartialState};

use crate::step::{step_order, SolutionStep, StepId};

/// The evolving strong-cyclic policy (component 7): a directed graph of solution steps with
/// backward-pointer bookkeeping, distance-to-goal, and strong-cyclic marking.
#[derive(Clone)]
pub struct PSGraph {
    steps: Vec<SolutionStep>,
    goal_id: StepId,
}

impl PSGraph {
    /// Creates a fresh PSGraph containing only the goal step (spec.md §3: "the unique goal
    /// step has state = goal, op = null, is_goal = is_sc = true, distance = 0").
    pub fn new(goal: PartialState) -> Self {
        let goal_id = StepId::from_u32(0);
        PSGraph {
            steps: vec![SolutionStep::goal(goal_id, goal)],
            goal_id,
        }
    }

    pub fn goal_id(&self) -> StepId {
        self.goal_id
    }

    pub fn step(&self, id: StepId) -> &SolutionStep {
        &self.steps[id.to_u32() as usize]
    }

    pub fn step_mut(&mut self, id: StepId) -> &mut SolutionStep {
        &mut self.steps[id.to_u32() as usize]
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn active_steps(&self) -> impl Iterator<Item = &SolutionStep> {
        self.steps.iter().filter(|s| s.is_active)
    }

    /// Adds a new non-goal solution step and returns its id.
    pub fn add_step(&mut self, state: PartialState, op: NondetId, num_outcomes: usize, expected_id: u32) -> StepId {
        let id = StepId::from_u32(self.steps.len() as u32);
        self.steps.push(SolutionStep::new(id, state, op, num_outcomes, expected_id));
        id
    }

    /// Connects `src`'s `outcome`-successor slot to `dst`, recording the backward edge.
    /// Panics if the slot is already connected to a different step (callers must `disconnect`
    /// first, or use [`Self::fixed_point_regression`] which handles the conflict by splitting).
    pub fn connect(&mut self, src: StepId, outcome: usize, dst: StepId) {
        let previous = self.step(src).successors[outcome];
        assert!(
            previous.is_none() || previous == Some(dst),
            "connect: outcome slot already wired to a different step; disconnect first"
        );
        self.step_mut(src).successors[outcome] = Some(dst);
        self.step_mut(dst).predecessors.push(src);
    }

    /// Disconnects `src`'s `outcome`-successor, if any, removing exactly one matching
    /// predecessor entry on the other side.
    pub fn disconnect(&mut self, src: StepId, outcome: usize) {
        if let Some(dst) = self.step(src).successors[outcome].take() {
            self.step_mut(src).successors[outcome] = None;
            let preds = &mut self.step_mut(dst).predecessors;
            if let Some(pos) = preds.iter().position(|&p| p == src) {
                preds.swap_remove(pos);
            }
        }
    }

    /// Marks `id` inactive and severs every edge to and from it. The step itself remains in
    /// the arena as a tombstone (ids are never reused).
    pub fn remove_step(&mut self, id: StepId) {
        let num_outcomes = self.step(id).successors.len();
        for outcome in 0..num_outcomes {
            self.disconnect(id, outcome);
        }
        let predecessors: Vec<StepId> = self.step(id).predecessors.clone();
        for pred in predecessors {
            for outcome in 0..self.step(pred).successors.len() {
                if self.step(pred).successors[outcome] == Some(id) {
                    self.disconnect(pred, outcome);
                }
            }
        }
        self.step_mut(id).is_active = false;
    }

    /// Policy lookup (component 3 applied to solution steps): the minimum, under the step
    /// order, among active steps whose state is entailed by `q`.
    pub fn get_step(&self, q: &PartialState) -> Option<StepId> {
        self.steps
            .iter()
            .filter(|s| s.is_active && q.entails(&s.state))
            .min_by(|a, b| step_order(a, b))
            .map(|s| s.id)
    }

    /// Propagates strong-cyclic marking and distance backward from `start` (spec.md §4.7):
    /// a step is `is_sc` iff it is the goal, or it has an op and every outcome successor
    /// exists and is `is_sc`. Distance is the length of the longest all-outcomes-succeed path
    /// to the goal (used only for step ordering).
    pub fn fixed_point_marking(&mut self, start: StepId) {
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut in_queue: HashSet<StepId> = [start].into_iter().collect();

        while let Some(id) = queue.pop_front() {
            in_queue.remove(&id);
            if !self.step(id).is_active {
                continue;
            }
            let (new_sc, new_distance) = self.recompute(id);
            let step = self.step(id);
            let changed = step.is_sc != new_sc || step.distance != new_distance;
            if changed {
                let step = self.step_mut(id);
                // is_sc is monotonic: once set, never cleared by a fixed-point pass.
                step.is_sc = step.is_sc || new_sc;
                step.distance = new_distance;
                for &pred in &self.step(id).predecessors.clone() {
                    if in_queue.insert(pred) {
                        queue.push_back(pred);
                    }
                }
            }
        }
    }

    fn recompute(&self, id: StepId) -> (bool, u32) {
        let step = self.step(id);
        if step.is_goal {
            return (true, 0);
        }
        if step.op.is_none() {
            return (step.is_sc, step.distance);
        }
        let mut all_sc = !step.successors.is_empty();
        let mut max_dist = 0u32;
        for succ in &step.successors {
            match succ {
                Some(s) if self.step(*s).is_active => {
                    let succ_step = self.step(*s);
                    all_sc &= succ_step.is_sc;
                    max_dist = max_dist.max(succ_step.distance);
                }
                _ => all_sc = false,
            }
        }
        let is_sc = step.is_sc || all_sc;
        let distance = if is_sc { 1 + max_dist } else { step.distance };
        (is_sc, distance)
    }

    /// Full backward fixed-point sweep from the goal (spec.md §4.7): marks every step's
    /// `is_sc` via repeated application of [`Self::recompute`] until no step changes.
    pub fn full_marking(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            let ids: Vec<StepId> = self.steps.iter().filter(|s| s.is_active).map(|s| s.id).collect();
            for id in ids {
                let (new_sc, new_distance) = self.recompute(id);
                let step = self.step_mut(id);
                if step.is_sc != (step.is_sc || new_sc) || step.distance != new_distance {
                    step.is_sc |= new_sc;
                    step.distance = new_distance;
                    changed = true;
                }
            }
        }
    }

    /// Traverses the graph from `start`, following successor edges (`reversed = false`) or
    /// predecessor edges (`reversed = true`), returning every step reached.
    pub fn crawl_steps(&self, start: StepId, reversed: bool) -> Vec<StepId> {
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        let mut order = Vec::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) || !self.step(id).is_active {
                continue;
            }
            order.push(id);
            if reversed {
                stack.extend(self.step(id).predecessors.iter().copied());
            } else {
                stack.extend(self.step(id).successors.iter().flatten().copied());
            }
        }
        order
    }

    /// Ensures `src`'s `outcome` successor is `dst` (spec.md §4.7 `fixed_point_regression`).
    ///
    /// If the slot is free, connects directly. If it is already wired to a different step,
    /// `src` is split: a clone of `src`, strengthened by `context` (the full state that actually
    /// demands the new wiring) so that it entails `dst` through `outcome` while remaining sound,
    /// takes over the `outcome` edge and every other edge `src` already had; `src` itself is left
    /// untouched so states that reached it through a different context remain served by it.
    ///
    /// This is a single-level version of the source's recursive prefix-splitting: the original
    /// also re-derives every ancestor of the search node that triggered the split so that its
    /// whole plan prefix stays consistent with the clone. Re-deriving ancestors requires the
    /// search-node graph (owned by the per-round search status, not the PSGraph), so that part is
    /// done by the driver's callers when a split actually changes which step a node matches;
    /// threading the full prefix recursion through here would entangle the PSGraph with the
    /// ephemeral search state it is explicitly supposed to stay independent of (spec.md §9's
    /// "PlannerContext" redesign note makes a similar call for configuration/time/policy).
    /// Returns every step newly created by the split, for the caller to re-point any search node
    /// whose `matched_step` was `src`.
    pub fn fixed_point_regression(&mut self, src: StepId, outcome: usize, dst: StepId, context: &PartialState) -> Vec<StepId> {
        match self.step(src).successors[outcome] {
            Some(existing) if existing == dst => Vec::new(),
            None => {
                self.connect(src, outcome, dst);
                Vec::new()
            }
            Some(_) => {
                let op = self.step(src).op.expect("a step with a wired successor has an operator");
                let new_state = self.step(src).state.combine_with(context);
                let num_outcomes = self.step(src).successors.len();
                let expected_id = self.step(src).expected_id;
                let other_successors = self.step(src).successors.clone();
                let clone_id = self.add_step(new_state, op, num_outcomes, expected_id);
                for (o, succ) in other_successors.into_iter().enumerate() {
                    if o == outcome {
                        self.connect(clone_id, o, dst);
                    } else if let Some(s) = succ {
                        self.connect(clone_id, o, s);
                    }
                }
                vec![clone_id]
            }
        }
    }

    /// Removes every step not reachable forward from `init` (garbage collection for steps
    /// orphaned by structural edits).
    pub fn clear_dead_solsteps(&mut self, init: StepId) {
        let reachable: HashSet<StepId> = self.crawl_steps(init, false).into_iter().collect();
        let dead: Vec<StepId> = self
            .steps
            .iter()
            .filter(|s| s.is_active && !reachable.contains(&s.id))
            .map(|s| s.id)
            .collect();
        for id in dead {
            self.remove_step(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fond_model::UNSET;

    fn goal_state() -> PartialState {
        PartialState::from_values(vec![1])
    }

    #[test]
    fn new_graph_has_active_strong_cyclic_goal_step() {
        let g = PSGraph::new(goal_state());
        let goal = g.step(g.goal_id());
        assert!(goal.is_goal);
        assert!(goal.is_sc);
        assert_eq!(goal.distance, 0);
    }

    #[test]
    fn connect_and_disconnect_maintain_predecessor_symmetry() {
        let mut g = PSGraph::new(goal_state());
        let s = g.add_step(PartialState::from_values(vec![UNSET]), NondetId::from_u32(0), 1, 0);
        g.connect(s, 0, g.goal_id());
        assert_eq!(g.step(g.goal_id()).predecessors, vec![s]);

        g.disconnect(s, 0);
        assert!(g.step(g.goal_id()).predecessors.is_empty());
        assert_eq!(g.step(s).successors[0], None);
    }

    #[test]
    fn full_marking_propagates_strong_cyclic_from_goal() {
        let mut g = PSGraph::new(goal_state());
        let s = g.add_step(PartialState::from_values(vec![UNSET]), NondetId::from_u32(0), 1, 0);
        g.connect(s, 0, g.goal_id());
        g.full_marking();
        assert!(g.step(s).is_sc);
        assert_eq!(g.step(s).distance, 1);
    }

    #[test]
    fn step_with_unconnected_outcome_is_not_strong_cyclic() {
        let mut g = PSGraph::new(goal_state());
        let s = g.add_step(PartialState::from_values(vec![UNSET]), NondetId::from_u32(0), 2, 0);
        g.connect(s, 0, g.goal_id());
        // outcome 1 left unconnected
        g.full_marking();
        assert!(!g.step(s).is_sc);
    }

    #[test]
    fn fixed_point_regression_connects_free_slot_directly() {
        let mut g = PSGraph::new(goal_state());
        let s = g.add_step(PartialState::from_values(vec![UNSET]), NondetId::from_u32(0), 1, 0);
        let created = g.fixed_point_regression(s, 0, g.goal_id(), &PartialState::from_values(vec![1]));
        assert!(created.is_empty());
        assert_eq!(g.step(s).successors[0], Some(g.goal_id()));
    }

    #[test]
    fn fixed_point_regression_splits_on_conflicting_wiring() {
        let mut g = PSGraph::new(goal_state());
        let other_goal = g.add_step(PartialState::from_values(vec![0]), NondetId::from_u32(1), 1, 0);
        let s = g.add_step(PartialState::from_values(vec![UNSET]), NondetId::from_u32(0), 1, 0);
        g.connect(s, 0, other_goal);

        let created = g.fixed_point_regression(s, 0, g.goal_id(), &PartialState::from_values(vec![1]));
        assert_eq!(created.len(), 1);
        let clone_id = created[0];
        assert_eq!(g.step(clone_id).successors[0], Some(g.goal_id()));
        // the original step is untouched, still serving states reached via the other context.
        assert_eq!(g.step(s).successors[0], Some(other_goal));
        assert_eq!(g.step(clone_id).state.get(0), 1);
    }

    #[test]
    fn clear_dead_solsteps_removes_unreachable_steps() {
        let mut g = PSGraph::new(goal_state());
        let reachable = g.add_step(PartialState::from_values(vec![UNSET]), NondetId::from_u32(0), 1, 0);
        g.connect(reachable, 0, g.goal_id());
        let orphan = g.add_step(PartialState::from_values(vec![UNSET]), NondetId::from_u32(1), 1, 0);

        g.clear_dead_solsteps(reachable);
        assert!(g.step(reachable).is_active);
        assert!(!g.step(orphan).is_active);
    }
}
