use scalar_rs::ScalarError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct CodegenError {
    message: String,
}

impl CodegenError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ScalarError> for CodegenError {
    fn from(err: ScalarError) -> Self {
        CodegenError::new(err.to_string())
    }
}

pub type CodegenResult<T> = Result<T, CodegenError>;
