//! The policy graph, the ephemeral per-round search driver, and the PRP epoch wrapper that
//! together synthesize a strong-cyclic policy (spec.md §3-5, components 6-9).

pub mod config;
pub mod driver;
pub mod node;
pub mod psgraph;
pub mod status;
pub mod step;
pub mod weak_planner;

pub use config::{DeadendConfig, NodePreference, PlannerConfig};
pub use driver::{Driver, FailedObservation, PlanOutcome, PlanResult, PrpPlanner, Stats};
pub use node::{NodeId, PrpSearchNode};
pub use psgraph::PSGraph;
pub use status::SearchStatus;
pub use step::{step_order, strengthen, SolutionStep, StepId};
pub use weak_planner::{GreedyWeakPlanner, WeakPlanner};
