use relay_repl_parser::ast::Span;
use thiserror::Error;

/// Errors raised while lowering a syntax tree into IR
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Unknown type '{name}'")]
    UnknownType { name: String, span: Span },

    #[error("Unknown field '{field}' on type '{parent}'")]
    UnknownField {
        parent: String,
        field: String,
        span: Span,
    },

    #[error("Unknown argument '{argument}' on {owner}")]
    UnknownArgument {
        owner: String,
        argument: String,
        span: Span,
    },

    #[error("Unknown fragment '{name}'")]
    UnknownFragment { name: String, span: Span },

    #[error("Unknown directive '@{name}'")]
    UnknownDirective { name: String, span: Span },

    #[error("Operation '{operation}' references undefined variable '${name}'")]
    UndefinedVariable {
        name: String,
        operation: String,
        span: Span,
    },

    #[error("Duplicate definition '{name}'")]
    DuplicateDefinition { name: String, span: Span },

    #[error("{message}")]
    Invalid { message: String, span: Span },
}

impl CompileError {
    pub fn unknown_type(name: impl Into<String>, span: Span) -> Self {
        Self::UnknownType {
            name: name.into(),
            span,
        }
    }

    pub fn unknown_argument(
        owner: impl Into<String>,
        argument: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::UnknownArgument {
            owner: owner.into(),
            argument: argument.into(),
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
            CompileError::UnknownType { span, .. }
            | CompileError::UnknownField { span, .. }
            | CompileError::UnknownArgument { span, .. }
            | CompileError::UnknownFragment { span, .. }
            | CompileError::UnknownDirective { span, .. }
            | CompileError::UndefinedVariable { span, .. }
            | CompileError::DuplicateDefinition { span, .. }
            | CompileError::Invalid { span, .. } => *span,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Errors raised by a document transform
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Found a circular reference from fragment '{fragment}'")]
    CircularFragment { fragment: String },

    #[error("Variable '${name}' is not in scope")]
    VariableNotInScope { name: String },

    #[error("Unknown fragment '{name}'")]
    UnknownFragment { name: String },

    #[error(
        "Cannot inline fragment spread '{fragment}' with arguments. \
         Apply fragment arguments before inlining"
    )]
    SpreadWithArguments { fragment: String },

    #[error(
        "Expected all fields on the same parent with the name or alias \
         '{response_key}' to have the same name and arguments"
    )]
    ConflictingFields { response_key: String },

    #[error("{transform}: {message}")]
    Invariant {
        transform: &'static str,
        message: String,
    },
}

pub type TransformResult<T> = Result<T, TransformError>;
