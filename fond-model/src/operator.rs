use aries_collections::create_ref_type;

create_ref_type!(OpId);
create_ref_type!(NondetId);

/// A single `var = val` literal, used both as a precondition and as an effect condition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Condition {
    pub var: u32,
    pub val: i32,
}

/// One effect of an operator: sets `var` to `val` when `condition` (a conjunction of literals,
/// possibly empty) holds in the state the operator is applied to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Effect {
    pub var: u32,
    pub val: i32,
    pub condition: Vec<Condition>,
}

/// One deterministic outcome of a non-deterministic action.
///
/// All outcomes sharing a [`NondetId`] are the outcomes of the same non-deterministic action;
/// `outcome_index` is this operator's position within that action's outcome list.
#[derive(Clone, Debug)]
pub struct Operator {
    pub name: String,
    pub preconditions: Vec<Condition>,
    pub effects: Vec<Effect>,
    pub cost: u32,
    pub nondet_id: NondetId,
    pub outcome_index: u32,
}

impl Operator {
    pub fn is_applicable(&self, state: &crate::partial_state::PartialState) -> bool {
        self.preconditions.iter().all(|p| state.get(p.var as usize) == p.val)
    }

    /// Whether this operator has at least one conditional (non-vacuous) effect.
    pub fn has_conditional_effects(&self) -> bool {
        self.effects.iter().any(|e| !e.condition.is_empty())
    }
}

/// A non-deterministic action: a named group of outcome operators sharing a [`NondetId`].
#[derive(Clone, Debug)]
pub struct NondetAction {
    pub name: String,
    pub outcomes: Vec<OpId>,
}
