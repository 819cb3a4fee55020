//! The FSAP-penalised relaxed reachability heuristic (spec.md §4.9, component 6).

pub mod index;
pub mod reachability;

pub use index::{ReachabilityIndex, RelaxedOp};
pub use reachability::{compute, Cost, HeuristicConfig, HeuristicResult};
