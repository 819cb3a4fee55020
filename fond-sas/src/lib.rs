//! Task loader for the finite-domain FOND planning format (spec.md §6, component "task loader").
//!
//! A non-goal of the core specification ("parsing planning task files") but a required
//! collaborator: [`parse_task`] reads a line-oriented, magic-token-delimited task description
//! into a [`fond_model::Task`].

mod error;
mod lexer;
mod nondet;
mod parser;

pub use error::TaskError;
pub use parser::parse_task;
