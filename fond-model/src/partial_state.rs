use crate::operator::Operator;
use std::fmt::{Display, Formatter};

/// Sentinel value denoting an unset variable in a [`PartialState`].
pub const UNSET: i32 = -1;

/// A variable-value map over the task's variables, with `UNSET` standing for "any value".
///
/// Freely copied, progressed, regressed, hashed and compared: the raw vector *is* the identity
/// of the state, which is what makes it usable as a policy key.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PartialState(Vec<i32>);

impl PartialState {
    pub fn new_unset(num_vars: usize) -> Self {
        PartialState(vec![UNSET; num_vars])
    }

    pub fn from_values(values: Vec<i32>) -> Self {
        PartialState(values)
    }

    pub fn num_vars(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, var: usize) -> i32 {
        self.0[var]
    }

    pub fn is_set(&self, var: usize) -> bool {
        self.0[var] != UNSET
    }

    pub fn set(&mut self, var: usize, val: i32) {
        self.0[var] = val;
    }

    pub fn unset(&mut self, var: usize) {
        self.0[var] = UNSET;
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    /// Number of variables that are set (not `UNSET`).
    pub fn size(&self) -> usize {
        self.0.iter().filter(|&&v| v != UNSET).count()
    }

    /// Returns a successor in which every effect of `op` whose condition is satisfied in
    /// `self` has fired. An effect with no condition always fires.
    pub fn progress(&self, op: &Operator) -> PartialState {
        let mut next = self.clone();
        for effect in &op.effects {
            if effect.condition.iter().all(|c| self.get(c.var as usize) == c.val) {
                next.set(effect.var as usize, effect.val);
            }
        }
        next
    }

    /// Computes the predecessor state under `op` assuming `context` is a complete state that
    /// would have progressed into `self` through `op`.
    ///
    /// See the module documentation of [`crate`] for the three-phase algorithm this mirrors.
    pub fn regress(&self, op: &Operator, context: &PartialState) -> PartialState {
        let mut result = self.clone();

        for effect in &op.effects {
            let fires = effect.condition.iter().all(|c| context.get(c.var as usize) == c.val);
            if fires {
                let var = effect.var as usize;
                assert!(
                    result.get(var) == UNSET || result.get(var) == effect.val,
                    "regression of {} over variable {} disagrees with the state being regressed",
                    op.name,
                    var
                );
                result.unset(var);
            }
        }

        for effect in &op.effects {
            for c in &effect.condition {
                result.set(c.var as usize, context.get(c.var as usize));
            }
        }

        for pre in &op.preconditions {
            result.set(pre.var as usize, pre.val);
        }

        result
    }

    /// `self` entails `other` iff every variable set in `other` agrees with `self`.
    pub fn entails(&self, other: &PartialState) -> bool {
        debug_assert_eq!(self.num_vars(), other.num_vars());
        (0..self.num_vars()).all(|i| other.get(i) == UNSET || self.get(i) == other.get(i))
    }

    /// Two partial states are consistent iff no variable is set in both with different values.
    pub fn consistent_with(&self, other: &PartialState) -> bool {
        debug_assert_eq!(self.num_vars(), other.num_vars());
        (0..self.num_vars()).all(|i| self.get(i) == UNSET || other.get(i) == UNSET || self.get(i) == other.get(i))
    }

    /// Copies every variable set in `other` but unset in `self`. Panics if `other` disagrees
    /// with a variable already set in `self` — callers must establish `consistent_with` first.
    pub fn combine_with(&self, other: &PartialState) -> PartialState {
        debug_assert_eq!(self.num_vars(), other.num_vars());
        let mut result = self.clone();
        for i in 0..self.num_vars() {
            if other.get(i) != UNSET {
                assert!(
                    result.get(i) == UNSET || result.get(i) == other.get(i),
                    "combine_with: variable {i} set to incompatible values"
                );
                result.set(i, other.get(i));
            }
        }
        result
    }
}

impl Display for PartialState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if *v == UNSET {
                write!(f, "v{i}=*")?;
            } else {
                write!(f, "v{i}={v}")?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{Condition, Effect, NondetId, Operator};

    fn op(preconditions: Vec<(u32, i32)>, effects: Vec<(u32, i32, Vec<(u32, i32)>)>) -> Operator {
        Operator {
            name: "test".into(),
            preconditions: preconditions.into_iter().map(|(var, val)| Condition { var, val }).collect(),
            effects: effects
                .into_iter()
                .map(|(var, val, cond)| Effect {
                    var,
                    val,
                    condition: cond.into_iter().map(|(var, val)| Condition { var, val }).collect(),
                })
                .collect(),
            cost: 1,
            nondet_id: NondetId::from_u32(0),
            outcome_index: 0,
        }
    }

    #[test]
    fn progress_fires_unconditional_and_matching_conditional_effects() {
        let s = PartialState::from_values(vec![0, 1]);
        let o = op(vec![], vec![(0, 5, vec![]), (1, 9, vec![(0, 0)])]);
        let next = s.progress(&o);
        assert_eq!(next.get(0), 5);
        assert_eq!(next.get(1), 9);
    }

    #[test]
    fn progress_skips_conditional_effect_whose_condition_fails() {
        let s = PartialState::from_values(vec![0, 1]);
        let o = op(vec![], vec![(1, 9, vec![(0, 1)])]);
        let next = s.progress(&o);
        assert_eq!(next.get(1), 1);
    }

    #[test]
    fn regress_unconditional_effect() {
        // operator sets var0 := 1 unconditionally, given successor var0=1, regress to unset.
        let successor = PartialState::from_values(vec![1, UNSET]);
        let context = PartialState::from_values(vec![1, 3]);
        let o = op(vec![], vec![(0, 1, vec![])]);
        let predecessor = successor.regress(&o, &context);
        assert_eq!(predecessor.get(0), UNSET);
    }

    #[test]
    fn regress_conditional_effect_copies_condition_and_overwrites_precondition() {
        // "if Y=0 then X=1", precondition none. successor has X=1 set (fired via context Y=0).
        let successor = PartialState::from_values(vec![1, UNSET]);
        let context = PartialState::from_values(vec![1, 0]);
        let o = op(vec![], vec![(0, 1, vec![(1, 0)])]);
        let predecessor = successor.regress(&o, &context);
        assert_eq!(predecessor.get(0), UNSET);
        assert_eq!(predecessor.get(1), 0);
    }

    #[test]
    fn regress_overwrites_precondition_variable() {
        let successor = PartialState::from_values(vec![UNSET, UNSET]);
        let context = PartialState::from_values(vec![2, 4]);
        let o = op(vec![(0, 2)], vec![(1, 7, vec![])]);
        let predecessor = successor.regress(&o, &context);
        assert_eq!(predecessor.get(0), 2);
    }

    #[test]
    fn entails_is_query_entails_key() {
        let q = PartialState::from_values(vec![1, 2]);
        let k = PartialState::from_values(vec![1, UNSET]);
        assert!(q.entails(&k));
        let k2 = PartialState::from_values(vec![1, 3]);
        assert!(!q.entails(&k2));
    }

    #[test]
    fn consistent_with_allows_unset_either_side_but_not_disagreement() {
        let a = PartialState::from_values(vec![1, UNSET]);
        let b = PartialState::from_values(vec![UNSET, 2]);
        assert!(a.consistent_with(&b));
        let c = PartialState::from_values(vec![2, UNSET]);
        assert!(!a.consistent_with(&c));
    }

    #[test]
    fn combine_with_fills_unset_variables() {
        let a = PartialState::from_values(vec![1, UNSET]);
        let b = PartialState::from_values(vec![UNSET, 2]);
        let combined = a.combine_with(&b);
        assert_eq!(combined.get(0), 1);
        assert_eq!(combined.get(1), 2);
    }

    #[test]
    #[should_panic]
    fn combine_with_panics_on_disagreement() {
        let a = PartialState::from_values(vec![1]);
        let b = PartialState::from_values(vec![2]);
        let _ = a.combine_with(&b);
    }
}
