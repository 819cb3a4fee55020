use aries_collections::create_ref_type;
use fond_model::PartialState;

use crate::step::StepId;

create_ref_type!(NodeId);

/// A node of the ephemeral per-round driver graph (spec.md §3).
#[derive(Clone, Debug)]
pub struct PrpSearchNode {
    pub id: NodeId,
    /// The full (totally assigned) state reached during expansion.
    pub full_state: PartialState,
    /// The expected partial state along the solution graph at this point.
    pub expected_state: PartialState,
    /// The solution step whose outcome led to this node, if any (absent for the init node).
    pub parent_step: Option<StepId>,
    pub previous: Option<NodeId>,
    /// Outcome index of `parent_step.op` that led from `previous` to this node.
    pub prev_outcome: Option<u32>,
    pub next: Vec<NodeId>,
    /// The solution step this node has been matched against, once expanded.
    pub matched_step: Option<StepId>,
    pub open: bool,
    pub init: bool,
    pub subsumed: bool,
    pub poisoned: bool,
    /// Number of tree edges collapsed onto this node by case 2 (duplicate full state). Starts
    /// at 1 for the edge from `previous`. Poisoning (spec.md §4.8 case 1) only propagates past a
    /// node when this count is 1, mirroring "stopping at nodes with multiple predecessors".
    pub incoming: u32,
    /// Depth in the per-round search tree (root = 0); used by the `near-init`/`away-init`
    /// open-list orderings (spec.md §6 `fondsearch.node_preference`).
    pub depth: u32,
}

impl PrpSearchNode {
    pub fn root(id: NodeId, full_state: PartialState, expected_state: PartialState) -> Self {
        PrpSearchNode {
            id,
            full_state,
            expected_state,
            parent_step: None,
            previous: None,
            prev_outcome: None,
            next: Vec::new(),
            matched_step: None,
            open: true,
            init: true,
            subsumed: false,
            poisoned: false,
            incoming: 1,
            depth: 0,
        }
    }

    pub fn child(
        id: NodeId,
        full_state: PartialState,
        expected_state: PartialState,
        parent_step: StepId,
        previous: NodeId,
        prev_outcome: u32,
        depth: u32,
    ) -> Self {
        PrpSearchNode {
            id,
            full_state,
            expected_state,
            parent_step: Some(parent_step),
            previous: Some(previous),
            prev_outcome: Some(prev_outcome),
            next: Vec::new(),
            matched_step: None,
            open: true,
            init: false,
            subsumed: false,
            poisoned: false,
            incoming: 1,
            depth,
        }
    }
}
