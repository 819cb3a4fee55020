use fond_model::{OpId, PartialState, Task, UNSET};

use crate::fsap::FsapPolicy;

/// Result of the deadend-aware successor generator (component 5).
pub struct SuccessorResult {
    /// Applicable operators whose non-det action is not currently forbidden.
    pub ops: Vec<OpId>,
    /// Present when the combination rule (optional, spec.md §4.5) synthesised a new dead-end
    /// because every applicable operator turned out to be forbidden.
    pub new_deadend: Option<PartialState>,
}

/// Wraps the base applicable-operator computation, filtering out operators whose non-det
/// action identity is forbidden in `state`. When `combine` is enabled and every applicable
/// operator ends up forbidden, synthesises a new (sound) dead-end by combining the forbidding
/// FSAPs and extending it to also exclude every other action possibly applicable in the
/// synthesised state but not at `state` itself.
pub fn deadend_successors(task: &Task, fsaps: &FsapPolicy, state: &PartialState, combine: bool) -> SuccessorResult {
    let applicable = task.applicable_ops(state);
    if applicable.is_empty() {
        return SuccessorResult { ops: applicable, new_deadend: None };
    }

    let forbidden = fsaps.forbidden_in(state);
    let filtered: Vec<OpId> = applicable
        .iter()
        .copied()
        .filter(|id| !forbidden.contains_key(&task.op(*id).nondet_id))
        .collect();

    if !filtered.is_empty() || forbidden.is_empty() || !combine {
        return SuccessorResult { ops: filtered, new_deadend: None };
    }

    let mut combined = PartialState::new_unset(task.num_vars());
    for (_, rep_state) in forbidden.values() {
        combined = combined.combine_with(rep_state);
    }

    for (_, op) in task.operators() {
        if forbidden.contains_key(&op.nondet_id) {
            continue;
        }
        let possibly_applicable = op
            .preconditions
            .iter()
            .all(|p| combined.get(p.var as usize) == UNSET || combined.get(p.var as usize) == p.val);
        if !possibly_applicable {
            continue;
        }
        if let Some(p) = op.preconditions.iter().find(|p| state.get(p.var as usize) != p.val) {
            combined.set(p.var as usize, state.get(p.var as usize));
        }
    }

    SuccessorResult { ops: filtered, new_deadend: Some(combined) }
}
