use std::cmp::Ordering;

use aries_collections::create_ref_type;
use fond_model::{NondetId, PartialState};
use fond_policy::FsapPolicy;

create_ref_type!(StepId);

/// A node of the PSGraph (spec.md §3): a partial state paired with the non-det action to apply
/// there, plus the graph structure needed to maintain strong-cyclic marking after edits.
#[derive(Clone, Debug)]
pub struct SolutionStep {
    pub id: StepId,
    pub state: PartialState,
    /// `None` iff this is the unique goal step.
    pub op: Option<NondetId>,
    pub distance: u32,
    /// The outcome index of `op` intended as the "expected" successor.
    pub expected_id: u32,
    /// Length equals the outcome count of `op` (empty for the goal step). `None` entries are
    /// not-yet-expanded outcomes.
    pub successors: Vec<Option<StepId>>,
    /// Multiset of predecessor steps (a predecessor may reach this step via more than one
    /// outcome, hence a plain `Vec` rather than a `HashSet`).
    pub predecessors: Vec<StepId>,
    pub is_goal: bool,
    pub is_sc: bool,
    pub is_relevant: bool,
    pub is_active: bool,
}

impl SolutionStep {
    pub fn goal(id: StepId, goal: PartialState) -> Self {
        SolutionStep {
            id,
            state: goal,
            op: None,
            distance: 0,
            expected_id: 0,
            successors: Vec::new(),
            predecessors: Vec::new(),
            is_goal: true,
            is_sc: true,
            is_relevant: true,
            is_active: true,
        }
    }

    pub fn new(id: StepId, state: PartialState, op: NondetId, num_outcomes: usize, expected_id: u32) -> Self {
        SolutionStep {
            id,
            state,
            op: Some(op),
            distance: u32::MAX,
            expected_id,
            successors: vec![None; num_outcomes],
            predecessors: Vec::new(),
            is_goal: false,
            is_sc: false,
            is_relevant: true,
            is_active: true,
        }
    }
}

/// The step order of spec.md §4.6, used whenever a query state matches multiple policy items:
/// active steps precede inactive; strong-cyclic precede non-strong-cyclic; smaller distance
/// precedes larger; ties broken by older (smaller) step id first.
pub fn step_order(a: &SolutionStep, b: &SolutionStep) -> Ordering {
    b.is_active
        .cmp(&a.is_active)
        .then_with(|| b.is_sc.cmp(&a.is_sc))
        .then_with(|| a.distance.cmp(&b.distance))
        .then_with(|| a.id.to_u32().cmp(&b.id.to_u32()))
}

/// Strengthens a freshly-regressed solution step (spec.md §4.6): given its partial state `s`
/// and the full context state `c` that produced it, for every FSAP sharing `op`'s non-det id
/// and consistent with `s` (i.e. some complete state could satisfy both, which would make the
/// policy prescribe a forbidden action), fixes the first variable that is set in the FSAP,
/// unset in `s`, and disagrees between the FSAP and `c` — copying `c`'s value into `s` there
/// breaks the FSAP's consistency with `s` without constraining the step more than necessary.
/// Iteration stops after the first variable fixed per FSAP.
pub fn strengthen(state: &mut PartialState, op: NondetId, context: &PartialState, fsaps: &FsapPolicy) {
    for (_, fsap) in fsaps.consistent(state) {
        if fsap.nondet != op {
            continue;
        }
        for var in 0..state.num_vars() {
            let fsap_val = fsap.state.get(var);
            if fsap_val == fond_model::UNSET || state.is_set(var) {
                continue;
            }
            if fsap_val != context.get(var) {
                state.set(var, context.get(var));
                break;
            }
        }
    }
}
