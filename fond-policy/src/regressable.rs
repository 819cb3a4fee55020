use fond_model::{NondetId, OpId, PartialState, Task, UNSET};

/// One entry of the regressable-operator index (spec.md §4.3): an operator outcome whose
/// effects can be regressed soundly from a state that entails `key`.
pub struct RegressableOp {
    pub op: OpId,
    pub nondet: NondetId,
    /// Conjunction of the operator's post-values. A state entailing this key may have been
    /// produced by this outcome.
    pub key: PartialState,
    /// Context passed to `PartialState::regress`: empty for unconditional operators, the
    /// all-fire precondition+effect-condition conjunction for conditional ones.
    pub context: PartialState,
}

/// Pre-computed sets of operators whose preconditions/effects are mutually consistent
/// (component 2), split into unconditional and "all-fire" conditional regressable operators.
/// Operators whose conditions are internally inconsistent are dropped: they cannot be
/// regressed soundly.
#[derive(Default)]
pub struct RegressableOperatorIndex {
    unconditional: Vec<RegressableOp>,
    all_fire: Vec<RegressableOp>,
}

impl RegressableOperatorIndex {
    pub fn build(task: &Task) -> Self {
        let mut unconditional = Vec::new();
        let mut all_fire = Vec::new();

        for (op_id, op) in task.operators() {
            if !op.has_conditional_effects() {
                if let Some(key) = conjoin_post_values(task.num_vars(), &op.effects) {
                    unconditional.push(RegressableOp {
                        op: op_id,
                        nondet: op.nondet_id,
                        key,
                        context: PartialState::new_unset(task.num_vars()),
                    });
                }
                continue;
            }

            let Some(context) = conjoin_precond_and_conditions(task.num_vars(), op) else {
                continue;
            };
            let Some(key) = conjoin_post_values(task.num_vars(), &op.effects) else {
                continue;
            };
            all_fire.push(RegressableOp {
                op: op_id,
                nondet: op.nondet_id,
                key,
                context,
            });
        }

        RegressableOperatorIndex { unconditional, all_fire }
    }

    pub fn unconditional_matches<'a>(
        &'a self,
        state: &'a PartialState,
    ) -> impl Iterator<Item = &'a RegressableOp> + 'a {
        self.unconditional.iter().filter(move |r| state.entails(&r.key))
    }

    pub fn all_fire_matches<'a>(&'a self, state: &'a PartialState) -> impl Iterator<Item = &'a RegressableOp> + 'a {
        self.all_fire.iter().filter(move |r| state.entails(&r.key))
    }
}

/// Merges the effects' `(var, val)` post-values into one partial state, returning `None` if two
/// effects disagree on the same variable.
fn conjoin_post_values(num_vars: usize, effects: &[fond_model::Effect]) -> Option<PartialState> {
    let mut acc = PartialState::new_unset(num_vars);
    for e in effects {
        let v = e.var as usize;
        if acc.get(v) != UNSET && acc.get(v) != e.val {
            return None;
        }
        acc.set(v, e.val);
    }
    Some(acc)
}

/// Merges an operator's preconditions with every effect's condition literals into one partial
/// state, returning `None` if any two disagree on the same variable.
fn conjoin_precond_and_conditions(num_vars: usize, op: &fond_model::Operator) -> Option<PartialState> {
    let mut acc = PartialState::new_unset(num_vars);
    for p in &op.preconditions {
        let v = p.var as usize;
        if acc.get(v) != UNSET && acc.get(v) != p.val {
            return None;
        }
        acc.set(v, p.val);
    }
    for e in &op.effects {
        for c in &e.condition {
            let v = c.var as usize;
            if acc.get(v) != UNSET && acc.get(v) != c.val {
                return None;
            }
            acc.set(v, c.val);
        }
    }
    Some(acc)
}
