use relay_repl_parser::ast::Span;
use relay_repl_parser::ParseError;
use thiserror::Error;

/// Errors that can occur while building a schema from SDL
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Type \"{name}\" is defined more than once")]
    DuplicateType { name: String, span: Span },

    #[error("Unknown type \"{name}\"")]
    UnknownType { name: String, span: Span },

    #[error("Cannot extend type \"{name}\": {reason}")]
    InvalidExtension {
        name: String,
        reason: String,
        span: Span,
    },

    #[error("{message}")]
    Invalid { message: String, span: Span },
}

impl SchemaError {
    pub fn duplicate_type(name: impl Into<String>, span: Span) -> Self {
        Self::DuplicateType {
            name: name.into(),
            span,
        }
    }

    pub fn unknown_type(name: impl Into<String>, span: Span) -> Self {
        Self::UnknownType {
            name: name.into(),
            span,
        }
    }

    pub fn invalid(span: Span, message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            SchemaError::Parse(err) => err.span(),
            SchemaError::DuplicateType { span, .. }
            | SchemaError::UnknownType { span, .. }
            | SchemaError::InvalidExtension { span, .. }
            | SchemaError::Invalid { span, .. } => *span,
        }
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;
