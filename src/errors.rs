use thiserror::Error;

/// Failures raised while parsing or evaluating an expression.
///
/// These never escape `resolve`/`apply_patch`; they surface only through
/// `try_evaluate` and `parse_expr` for callers that want diagnostics.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("function `{name}` expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },
}

pub type Result<T> = std::result::Result<T, EvalError>;
