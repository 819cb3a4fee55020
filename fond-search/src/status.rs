use std::collections::{HashMap, HashSet};

use fond_model::PartialState;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::NodePreference;
use crate::node::{NodeId, PrpSearchNode};
use crate::step::StepId;

/// Everything the driver tracks for one round of expansion (spec.md §4.8 "Search Status"):
/// the open-list queue, the set of full states already seen, the map back from a full state to
/// its primary search node, the solution-step -> matching-nodes index, and the failures
/// collected for end-of-round dead-end learning.
///
/// Owned by one round; on a clean round end it is dropped, and on time expiry it is handed back
/// to the PRP wrapper so the next epoch can resume exactly where this one left off (spec.md §5).
pub struct SearchStatus {
    nodes: Vec<PrpSearchNode>,
    queue: Vec<NodeId>,
    seen: HashSet<PartialState>,
    state2searchnode: HashMap<PartialState, NodeId>,
    solstep2searchnodes: HashMap<StepId, HashSet<NodeId>>,
    pub failed: Vec<crate::driver::FailedObservation>,
    node_preference: NodePreference,
    rng: SmallRng,
}

impl SearchStatus {
    pub fn new(node_preference: NodePreference) -> Self {
        SearchStatus {
            nodes: Vec::new(),
            queue: Vec::new(),
            seen: HashSet::new(),
            state2searchnode: HashMap::new(),
            solstep2searchnodes: HashMap::new(),
            failed: Vec::new(),
            node_preference,
            rng: SmallRng::seed_from_u64(0),
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn bootstrap(&mut self, initial_state: PartialState, expected_goal: PartialState) -> NodeId {
        let id = NodeId::from_u32(self.nodes.len() as u32);
        self.nodes.push(PrpSearchNode::root(id, initial_state, expected_goal));
        self.queue.push(id);
        id
    }

    /// Re-pushes a node that was popped but could not be processed before the round's deadline,
    /// so the next epoch resumes from exactly this node (spec.md §5 cancellation semantics).
    pub fn requeue(&mut self, id: NodeId) {
        self.queue.push(id);
    }

    pub fn pop_next(&mut self) -> Option<NodeId> {
        if self.queue.is_empty() {
            return None;
        }
        let idx = match self.node_preference {
            NodePreference::Lifo => self.queue.len() - 1,
            NodePreference::Fifo => 0,
            NodePreference::NearInit => self.best_index_by_depth(false),
            NodePreference::AwayInit => self.best_index_by_depth(true),
            NodePreference::Random => self.rng.random_range(0..self.queue.len()),
        };
        Some(self.queue.swap_remove(idx))
    }

    fn best_index_by_depth(&self, furthest: bool) -> usize {
        let mut best = 0;
        for i in 1..self.queue.len() {
            let a = self.nodes[self.queue[i].to_u32() as usize].depth;
            let b = self.nodes[self.queue[best].to_u32() as usize].depth;
            if (furthest && a > b) || (!furthest && a < b) {
                best = i;
            }
        }
        best
    }

    pub fn push_child(
        &mut self,
        full_state: PartialState,
        expected_state: PartialState,
        parent_step: StepId,
        previous: NodeId,
        prev_outcome: u32,
    ) -> NodeId {
        let id = NodeId::from_u32(self.nodes.len() as u32);
        let depth = self.nodes[previous.to_u32() as usize].depth + 1;
        self.nodes.push(PrpSearchNode::child(
            id,
            full_state,
            expected_state,
            parent_step,
            previous,
            prev_outcome,
            depth,
        ));
        self.nodes[previous.to_u32() as usize].next.push(id);
        self.queue.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &PrpSearchNode {
        &self.nodes[id.to_u32() as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut PrpSearchNode {
        &mut self.nodes[id.to_u32() as usize]
    }

    pub fn has_seen(&self, state: &PartialState) -> bool {
        self.seen.contains(state)
    }

    pub fn record_seen(&mut self, state: PartialState, node: NodeId) {
        self.state2searchnode.insert(state.clone(), node);
        self.seen.insert(state);
    }

    pub fn node_for_state(&self, state: &PartialState) -> Option<NodeId> {
        self.state2searchnode.get(state).copied()
    }

    pub fn mark_matched(&mut self, node: NodeId, step: StepId) {
        self.node_mut(node).matched_step = Some(step);
        self.solstep2searchnodes.entry(step).or_default().insert(node);
    }

    pub fn nodes_matching(&self, step: StepId) -> Option<&HashSet<NodeId>> {
        self.solstep2searchnodes.get(&step)
    }

    /// Walks forward from every direct successor of `from`'s predecessors, per spec.md §4.8 case
    /// 1: starting at each predecessor of the failed node, poisoning propagates through `next`
    /// pointers, stopping at a node whose `incoming` count is greater than one (a merge point
    /// introduced by case 2, where a single poisoned branch should not condemn every branch that
    /// feeds into it).
    pub fn poison_forward(&mut self, from: NodeId) {
        self.node_mut(from).poisoned = true;
        let mut stack = self.node(from).next.clone();
        while let Some(id) = stack.pop() {
            let node = self.node_mut(id);
            if node.poisoned || node.incoming > 1 {
                continue;
            }
            node.poisoned = true;
            stack.extend(node.next.clone());
        }
    }
}
