use thiserror::Error;

/// Failure surfaced while building, typing, evaluating or emitting scalar graphs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScalarError {
    /// A graph is not closed over its declared inputs.
    #[error("dependency error: {0}")]
    Dependency(String),
    /// An operation cannot resolve an output type for its input types.
    #[error("type error: {0}")]
    Type(String),
    /// A literal does not fit the requested scalar type.
    #[error("domain error: {0}")]
    Domain(String),
    /// An integer-only operation received complex operands.
    #[error("complex error: {op} is not defined for complex operands")]
    Complex { op: &'static str },
    #[error("{op} expects {expected} inputs, got {found}")]
    Arity {
        op: String,
        expected: String,
        found: usize,
    },
}

impl ScalarError {
    pub fn dependency(message: impl Into<String>) -> Self {
        ScalarError::Dependency(message.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        ScalarError::Type(message.into())
    }

    pub fn domain(message: impl Into<String>) -> Self {
        ScalarError::Domain(message.into())
    }

    pub fn complex(op: &'static str) -> Self {
        ScalarError::Complex { op }
    }
}

pub type ScalarResult<T> = Result<T, ScalarError>;
