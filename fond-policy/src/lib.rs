//! Partial-state-keyed policy indexing, forbidden-state-action-pair learning, and the
//! deadend-aware successor generator (spec.md §3-4, components 2-5).

pub mod fsap;
pub mod learn;
pub mod policy;
pub mod regressable;
pub mod successor;

pub use fsap::{Deadend, DeadendId, DeadendPolicy, Fsap, FsapId, FsapPolicy};
pub use learn::{learn_from_failure, FailedTuple};
pub use policy::{Keyed, Policy};
pub use regressable::{RegressableOp, RegressableOperatorIndex};
pub use successor::{deadend_successors, SuccessorResult};
