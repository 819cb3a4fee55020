use std::collections::HashMap;

use aries_collections::create_ref_type;
use fond_model::{NondetId, PartialState};

use crate::policy::{Keyed, Policy};

create_ref_type!(FsapId);
create_ref_type!(DeadendId);

/// A forbidden-state-action pair (spec.md §3): action `nondet` must not be taken in any state
/// entailing `state`.
#[derive(Clone, Debug)]
pub struct Fsap {
    pub state: PartialState,
    pub nondet: NondetId,
}

impl Keyed for Fsap {
    fn key(&self) -> &PartialState {
        &self.state
    }
}

/// A dead-end region: every state entailing `state` cannot reach the goal under any policy.
/// Represented separately from [`Fsap`] rather than as an FSAP with a sentinel action id, since
/// that would force every FSAP consumer to special-case the sentinel.
#[derive(Clone, Debug)]
pub struct Deadend {
    pub state: PartialState,
}

impl Keyed for Deadend {
    fn key(&self) -> &PartialState {
        &self.state
    }
}

/// The FSAP set (component 4): policy of forbidden state-action pairs, indexed by non-det
/// action identity.
#[derive(Default)]
pub struct FsapPolicy {
    inner: Policy<Fsap>,
}

impl FsapPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, state: PartialState, nondet: NondetId) -> FsapId {
        FsapId::from_u32(self.inner.push(Fsap { state, nondet }) as u32)
    }

    pub fn get(&self, id: FsapId) -> &Fsap {
        self.inner.get(id.to_u32() as usize)
    }

    pub fn entailed(&self, q: &PartialState) -> Vec<(FsapId, &Fsap)> {
        self.inner.entailed(q).into_iter().map(|(i, f)| (FsapId::from_u32(i as u32), f)).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FsapId, &Fsap)> {
        self.inner.iter().map(|(i, f)| (FsapId::from_u32(i as u32), f))
    }

    /// Non-det action ids forbidden at `q`, each with the representative FSAP chosen by the
    /// FSAP tie-break order (spec.md §4.6: reverse of the step order, so the newest id wins).
    pub fn forbidden_in(&self, q: &PartialState) -> HashMap<NondetId, (FsapId, PartialState)> {
        let mut reps: HashMap<NondetId, (FsapId, PartialState)> = HashMap::new();
        for (id, fsap) in self.entailed(q) {
            let better = match reps.get(&fsap.nondet) {
                Some((cur, _)) => id.to_u32() > cur.to_u32(),
                None => true,
            };
            if better {
                reps.insert(fsap.nondet, (id, fsap.state.clone()));
            }
        }
        reps
    }
}

/// The dead-end policy: same indexing machinery as [`FsapPolicy`], storing only the partial
/// state (the forbidden action is implicitly "all of them").
#[derive(Default)]
pub struct DeadendPolicy {
    inner: Policy<Deadend>,
}

impl DeadendPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, state: PartialState) -> DeadendId {
        DeadendId::from_u32(self.inner.push(Deadend { state }) as u32)
    }

    pub fn get(&self, id: DeadendId) -> &Deadend {
        self.inner.get(id.to_u32() as usize)
    }

    pub fn check_entailed_match(&self, q: &PartialState) -> bool {
        self.inner.check_entailed_match(q)
    }

    pub fn entailed(&self, q: &PartialState) -> Vec<(DeadendId, &Deadend)> {
        self.inner.entailed(q).into_iter().map(|(i, d)| (DeadendId::from_u32(i as u32), d)).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeadendId, &Deadend)> {
        self.inner.iter().map(|(i, d)| (DeadendId::from_u32(i as u32), d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_in_picks_newest_fsap_per_nondet_action() {
        let mut fsaps = FsapPolicy::new();
        let nd = NondetId::from_u32(0);
        fsaps.add(PartialState::from_values(vec![1, -1]), nd);
        let newer = fsaps.add(PartialState::from_values(vec![1, 2]), nd);

        let q = PartialState::from_values(vec![1, 2]);
        let forbidden = fsaps.forbidden_in(&q);
        let (rep_id, _) = forbidden.get(&nd).unwrap();
        assert_eq!(*rep_id, newer);
    }

    #[test]
    fn deadend_policy_entailment_match() {
        let mut deadends = DeadendPolicy::new();
        deadends.add(PartialState::from_values(vec![0, -1]));
        assert!(deadends.check_entailed_match(&PartialState::from_values(vec![0, 3])));
        assert!(!deadends.check_entailed_match(&PartialState::from_values(vec![1, 3])));
    }
}
