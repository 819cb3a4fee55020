use thiserror::Error;

/// Fatal task-loading errors (spec.md §7: "malformed task ... fatal, program exits with the
/// input-error code before any search starts").
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("line {line}: expected {expected:?}, found {found:?}")]
    UnexpectedToken { line: usize, expected: &'static str, found: String },

    #[error("line {line}: expected an integer, found {found:?}")]
    ExpectedInt { line: usize, found: String },

    #[error("unexpected end of task input while looking for {expected:?}")]
    UnexpectedEof { expected: &'static str },

    #[error("line {line}: variable index {var} out of range (task has {num_vars} variables)")]
    UnknownVariable { line: usize, var: usize, num_vars: usize },

    #[error("line {line}: value {val} out of range for variable {var} (domain size {domain_size})")]
    UnknownValue { line: usize, var: usize, val: i32, domain_size: u32 },

    #[error(
        "task contains {count} axiom rule(s) (begin_rule/end_rule); axioms are not supported. \
         See DESIGN.md: this loader rejects tasks with axioms rather than evaluating them unsafely."
    )]
    AxiomsUnsupported { count: usize },
}
