use crate::operator::{NondetAction, NondetId, OpId, Operator};
use crate::partial_state::PartialState;

/// One finite-domain variable of the task.
#[derive(Clone, Debug)]
pub struct Variable {
    pub name: String,
    pub domain_size: u32,
    /// `fact_names[v]` is the human-readable name of `variable = v`, when supplied by the loader.
    pub fact_names: Vec<String>,
}

/// An immutable finite-domain FOND planning task.
///
/// Built once by the loader (`fond-sas`) and never mutated afterwards: every downstream
/// component (policy, heuristic, search driver) borrows it for the lifetime of a planner run.
#[derive(Clone, Debug)]
pub struct Task {
    pub variables: Vec<Variable>,
    operators: Vec<Operator>,
    nondet_actions: Vec<NondetAction>,
    pub initial_state: PartialState,
    pub goal: PartialState,
}

impl Task {
    pub fn new(
        variables: Vec<Variable>,
        operators: Vec<Operator>,
        nondet_actions: Vec<NondetAction>,
        initial_state: PartialState,
        goal: PartialState,
    ) -> Task {
        Task {
            variables,
            operators,
            nondet_actions,
            initial_state,
            goal,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn domain_size(&self, var: usize) -> u32 {
        self.variables[var].domain_size
    }

    pub fn op(&self, id: OpId) -> &Operator {
        &self.operators[id]
    }

    pub fn operators(&self) -> impl Iterator<Item = (OpId, &Operator)> {
        self.operators.iter().enumerate().map(|(i, op)| (OpId::from_u32(i as u32), op))
    }

    pub fn num_operators(&self) -> usize {
        self.operators.len()
    }

    pub fn nondet(&self, id: NondetId) -> &NondetAction {
        &self.nondet_actions[id]
    }

    pub fn nondet_actions(&self) -> impl Iterator<Item = (NondetId, &NondetAction)> {
        self.nondet_actions
            .iter()
            .enumerate()
            .map(|(i, a)| (NondetId::from_u32(i as u32), a))
    }

    pub fn num_nondet_actions(&self) -> usize {
        self.nondet_actions.len()
    }

    pub fn outcomes_of(&self, id: NondetId) -> &[OpId] {
        &self.nondet_actions[id].outcomes
    }

    /// All operators whose preconditions hold in `state`, regardless of dead-end forbiddance.
    pub fn applicable_ops(&self, state: &PartialState) -> Vec<OpId> {
        self.operators()
            .filter(|(_, op)| op.is_applicable(state))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn is_goal(&self, state: &PartialState) -> bool {
        state.entails(&self.goal)
    }
}
