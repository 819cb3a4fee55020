use fond_model::{NondetId, OpId, Task};

/// Flattens the task's `(var, val)` space into a single integer per proposition, so relaxed
/// reachability can use a plain `Vec<Cost>` instead of a nested map.
pub(crate) fn prop_offsets(task: &Task) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(task.num_vars());
    let mut next = 0usize;
    for v in 0..task.num_vars() {
        offsets.push(next);
        next += task.domain_size(v) as usize;
    }
    offsets
}

pub(crate) fn num_props(task: &Task) -> usize {
    (0..task.num_vars()).map(|v| task.domain_size(v) as usize).sum()
}

pub(crate) fn prop_id(offsets: &[usize], var: usize, val: i32) -> usize {
    offsets[var] + val as usize
}

/// One unary relaxed operator: "if every proposition in `preconditions` holds, `effect` holds
/// at cost `base_cost` plus whatever the op's preconditions cost". Built one per
/// `(original operator, effect)` pair, per spec.md §4.9.
pub struct RelaxedOp {
    pub op: OpId,
    pub nondet: NondetId,
    pub base_cost: u32,
    pub preconditions: Vec<usize>,
    pub effect: usize,
}

/// Pre-computed relaxed-planning-graph structure for a task: proposition numbering and the
/// unary relaxed operators derived from every `(operator, effect)` pair.
pub struct ReachabilityIndex {
    pub(crate) offsets: Vec<usize>,
    pub(crate) num_props: usize,
    pub(crate) relaxed_ops: Vec<RelaxedOp>,
}

impl ReachabilityIndex {
    pub fn build(task: &Task) -> Self {
        let offsets = prop_offsets(task);
        let mut relaxed_ops = Vec::new();
        for (op_id, op) in task.operators() {
            for effect in &op.effects {
                let mut preconditions: Vec<usize> =
                    op.preconditions.iter().map(|c| prop_id(&offsets, c.var as usize, c.val)).collect();
                preconditions.extend(effect.condition.iter().map(|c| prop_id(&offsets, c.var as usize, c.val)));
                preconditions.sort_unstable();
                preconditions.dedup();
                relaxed_ops.push(RelaxedOp {
                    op: op_id,
                    nondet: op.nondet_id,
                    base_cost: op.cost,
                    preconditions,
                    effect: prop_id(&offsets, effect.var as usize, effect.val),
                });
            }
        }
        ReachabilityIndex {
            offsets,
            num_props: num_props(task),
            relaxed_ops,
        }
    }

    pub fn prop_id(&self, var: usize, val: i32) -> usize {
        prop_id(&self.offsets, var, val)
    }
}
