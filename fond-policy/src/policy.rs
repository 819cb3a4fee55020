use fond_model::PartialState;

/// Anything indexable by a partial-state key: a solution step, an FSAP, or a dead-end region.
pub trait Keyed {
    fn key(&self) -> &PartialState;
}

/// A linear-scan entailment/consistency index over partial-state-keyed items (spec.md §4.2).
///
/// A linear scan is explicitly allowed as a correct implementation of both queries; this is
/// exactly that, plus a plain arena so callers get back small integer handles instead of having
/// to clone the payload around.
pub struct Policy<V> {
    entries: Vec<V>,
}

impl<V> Default for Policy<V> {
    fn default() -> Self {
        Policy { entries: Vec::new() }
    }
}

impl<V> Policy<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: V) -> usize {
        self.entries.push(value);
        self.entries.len() - 1
    }

    pub fn get(&self, id: usize) -> &V {
        &self.entries[id]
    }

    pub fn get_mut(&mut self, id: usize) -> &mut V {
        &mut self.entries[id]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &V)> {
        self.entries.iter().enumerate()
    }
}

impl<V: Keyed> Policy<V> {
    /// All `(id, item)` pairs whose key is entailed by `q`, i.e. `q.entails(item.key())`.
    pub fn entailed(&self, q: &PartialState) -> Vec<(usize, &V)> {
        self.entries.iter().enumerate().filter(|(_, v)| q.entails(v.key())).collect()
    }

    /// All `(id, item)` pairs whose key is consistent with `q`.
    pub fn consistent(&self, q: &PartialState) -> Vec<(usize, &V)> {
        self.entries.iter().enumerate().filter(|(_, v)| q.consistent_with(v.key())).collect()
    }

    /// Boolean form of [`Self::entailed`] that stops at the first hit.
    pub fn check_entailed_match(&self, q: &PartialState) -> bool {
        self.entries.iter().any(|v| q.entails(v.key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fond_model::PartialState;

    struct Item(PartialState);
    impl Keyed for Item {
        fn key(&self) -> &PartialState {
            &self.0
        }
    }

    #[test]
    fn entailed_returns_keys_implied_by_query() {
        let mut p = Policy::new();
        p.push(Item(PartialState::from_values(vec![1, -1])));
        p.push(Item(PartialState::from_values(vec![-1, 2])));
        p.push(Item(PartialState::from_values(vec![0, -1])));

        let q = PartialState::from_values(vec![1, 2]);
        let hits: Vec<usize> = p.entailed(&q).into_iter().map(|(id, _)| id).collect();
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn check_entailed_match_short_circuits_on_first_hit() {
        let mut p = Policy::new();
        p.push(Item(PartialState::from_values(vec![-1])));
        let q = PartialState::from_values(vec![5]);
        assert!(p.check_entailed_match(&q));

        let empty: Policy<Item> = Policy::new();
        assert!(!empty.check_entailed_match(&q));
    }
}
