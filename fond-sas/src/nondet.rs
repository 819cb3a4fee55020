/// Splits an operator name into its shared non-deterministic group key and, if present, the
/// explicit outcome index encoded after the `_DETDUP` marker (spec.md §6: "the operator-name
/// convention `base _DETDUP k ...` is recognised: everything before `_DETDUP` is the shared
/// non-det name").
///
/// The group key is the schema name (everything before `_DETDUP`) with the grounded argument
/// list re-appended, exactly as `global_operator.cc` builds `nondet_name`: it takes
/// `name.substr(0, name.find("_DETDUP"))` and then appends `name.substr(name.find(" "))`, the
/// space-separated grounded arguments that follow the marker. Without that re-append, distinct
/// grounded instances of one schema (`push_DETDUP_0 boxa l1` vs `push_DETDUP_1 boxb l2`) would
/// collapse into a single non-deterministic action merely for sharing the schema name `push`.
///
/// An operator name with no `_DETDUP` marker is its own singleton group (spec.md §8 boundary:
/// "task with no non-determinism (every action has one outcome)").
fn split_detdup(name: &str) -> (String, Option<u32>) {
    let Some(idx) = name.find("_DETDUP") else {
        return (name.to_string(), None);
    };
    let base = name[..idx].trim_end_matches(['_', ' ']);
    let rest = &name[idx + "_DETDUP".len()..];
    let digits: String = rest.trim_start_matches('_').chars().take_while(|c| c.is_ascii_digit()).collect();

    let key = match name.find(' ') {
        Some(space_idx) => format!("{base}{}", &name[space_idx..]),
        None => base.to_string(),
    };
    (key, digits.parse().ok())
}

/// One non-deterministic action grouping, in first-appearance order: the shared name and, for
/// each member operator, its index into the task's flat operator list and outcome position
/// within this group.
pub struct NondetGroup {
    pub name: String,
    /// `(operator_index, outcome_index)` pairs, outcome-ordered.
    pub members: Vec<(usize, u32)>,
}

/// Groups operator names by shared `_DETDUP` base, assigning outcome indices from the explicit
/// suffix when every member of a group has one (and they're a dense `0..n` permutation),
/// otherwise by order of appearance — the original format doesn't guarantee the suffix is always
/// present or well-formed, so falling back to appearance order is the conservative choice.
pub fn group_operators(op_names: &[String]) -> Vec<NondetGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<(usize, Option<u32>)>> = std::collections::HashMap::new();

    for (op_idx, name) in op_names.iter().enumerate() {
        let (key, suffix) = split_detdup(name);
        groups.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            Vec::new()
        });
        groups.get_mut(&key).unwrap().push((op_idx, suffix));
    }

    order
        .into_iter()
        .map(|name| {
            let members = groups.remove(&name).unwrap();
            let n = members.len();
            let all_dense_suffixes = {
                let mut seen: Vec<u32> = members.iter().filter_map(|(_, s)| *s).collect();
                seen.sort_unstable();
                seen.len() == n && seen.iter().enumerate().all(|(i, &k)| i as u32 == k)
            };
            let ordered: Vec<(usize, u32)> = if all_dense_suffixes {
                let mut m: Vec<(usize, u32)> = members.into_iter().map(|(i, s)| (i, s.unwrap())).collect();
                m.sort_by_key(|&(_, k)| k);
                m
            } else {
                members.into_iter().enumerate().map(|(k, (i, _))| (i, k as u32)).collect()
            };
            NondetGroup { name, members: ordered }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_detdup_suffixed_names_by_shared_base() {
        let names = vec!["try_DETDUP0".to_string(), "try_DETDUP1".to_string(), "other".to_string()];
        let groups = group_operators(&names);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "try");
        assert_eq!(groups[0].members, vec![(0, 0), (1, 1)]);
        assert_eq!(groups[1].name, "other");
        assert_eq!(groups[1].members, vec![(2, 0)]);
    }

    #[test]
    fn grounded_instances_of_one_schema_stay_in_distinct_groups() {
        // "push_DETDUP_0 boxa l1" and "push_DETDUP_1 boxb l2" share the schema name "push" but
        // are different grounded actions: grouping must key on the full "push boxa l1" /
        // "push boxb l2" name, not just the "push" schema, or the two outcome sets of two
        // unrelated actions would be merged into one non-deterministic action.
        let names = vec![
            "push_DETDUP_0 boxa l1".to_string(),
            "push_DETDUP_1 boxa l1".to_string(),
            "push_DETDUP_0 boxb l2".to_string(),
            "push_DETDUP_1 boxb l2".to_string(),
        ];
        let groups = group_operators(&names);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "push boxa l1");
        assert_eq!(groups[0].members, vec![(0, 0), (1, 1)]);
        assert_eq!(groups[1].name, "push boxb l2");
        assert_eq!(groups[1].members, vec![(2, 0), (3, 1)]);
    }

    #[test]
    fn every_operator_without_detdup_is_its_own_group() {
        let names = vec!["a".to_string(), "b".to_string()];
        let groups = group_operators(&names);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec![(0, 0)]);
        assert_eq!(groups[1].members, vec![(1, 0)]);
    }

    #[test]
    fn falls_back_to_appearance_order_when_suffixes_are_not_a_dense_permutation() {
        let names = vec!["x_DETDUP5".to_string(), "x_DETDUP5".to_string()];
        let groups = group_operators(&names);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![(0, 0), (1, 1)]);
    }
}
