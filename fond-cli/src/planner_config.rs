use fond_heuristic::HeuristicConfig;
use fond_search::config::{DeadendConfig, PlannerConfig};

use crate::opt::Opt;

/// Builds the explicit [`PlannerConfig`] threaded through the driver from CLI flags (spec.md §9
/// redesign note: no process-wide singleton).
pub fn build_config(opt: &Opt) -> PlannerConfig {
    let deadend = DeadendConfig {
        enabled: !opt.no_deadend_learning,
        generalize: !opt.no_deadend_generalize,
        poison_search: !opt.no_poison_search,
        combine: !opt.no_deadend_combine,
        record_online: opt.record_online_deadends,
    };

    let heuristic = HeuristicConfig {
        penalize_potential_fsaps: opt.penalize_potential_fsaps,
        fsap_penalty: opt.resolved_fsap_penalty(),
        ..HeuristicConfig::default()
    };

    PlannerConfig {
        deadend,
        localize: !opt.no_localize,
        heuristic,
        epoch_max: opt.resolved_epoch_max(),
        final_fsap_free_round: opt.final_fsap_free_round,
        node_preference: opt.node_preference,
        full_scd_marking: true,
    }
}
