pub mod operator;
pub mod partial_state;
pub mod task;

pub use operator::{Condition, Effect, NondetAction, NondetId, OpId, Operator};
pub use partial_state::{PartialState, UNSET};
pub use task::{Task, Variable};
