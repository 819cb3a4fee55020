use std::time::Duration;

use fond_policy::{DeadendPolicy, FsapPolicy};
use fond_search::driver::{PlanOutcome, Stats};
use fond_search::psgraph::PSGraph;

/// The ambient "general statistics" block every teacher binary prints on exit (SPEC_FULL.md
/// §9.8): round count, weak-search count, solution size, FSAP count, time taken. Not the
/// Monte-Carlo trial simulator spec.md excludes as a non-goal.
pub fn print_summary(
    outcome: &PlanOutcome,
    psgraph: &PSGraph,
    fsaps: &FsapPolicy,
    deadends: &DeadendPolicy,
    stats: &Stats,
    elapsed: Duration,
) {
    let outcome_str = match outcome {
        PlanOutcome::StrongCyclic => "strong cyclic",
        PlanOutcome::NotStrongCyclic => "not strong cyclic",
        PlanOutcome::TimeExhausted => "time exhausted",
    };
    println!("\n===== fond-plan summary =====");
    println!("outcome:          {outcome_str}");
    println!("rounds:           {}", stats.rounds);
    println!("weak plans found: {}", stats.weak_plans_found);
    println!("weak plans failed:{}", stats.weak_plans_failed);
    println!("policy steps:     {}", psgraph.active_steps().count());
    println!("fsaps learned:    {}", fsaps.len());
    println!("dead-ends learned:{}", deadends.len());
    println!("time:             {:.3}s", elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use fond_model::PartialState;

    #[test]
    fn print_summary_does_not_panic_on_empty_graph() {
        let psgraph = PSGraph::new(PartialState::from_values(vec![1]));
        let fsaps = FsapPolicy::new();
        let deadends = DeadendPolicy::new();
        let stats = Stats::default();
        print_summary(&PlanOutcome::StrongCyclic, &psgraph, &fsaps, &deadends, &stats, Duration::from_secs(0));
    }
}
