use relay_repl_compiler::{CompileError, TransformError};
use relay_repl_parser::ParseError;
use relay_repl_schema::SchemaError;
use thiserror::Error;

/// Why one pipeline run failed. Each variant names the stage that failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Schema error: {0}")]
    SchemaParse(#[from] SchemaError),

    #[error("Operation parse error: {0}")]
    OperationParse(#[from] ParseError),

    #[error("Compilation error: {0}")]
    Compilation(#[from] CompileError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::SchemaParse(_) => "schema",
            PipelineError::OperationParse(_) => "operation",
            PipelineError::Compilation(_) => "compile",
            PipelineError::Transform(_) => "transform",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown transform \"{name}\"")]
    UnknownTransform { name: String },
}

pub type SelectionResult<T> = Result<T, SelectionError>;
