use crate::ast::Span;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {span}: expected {expected}, found {found}")]
    UnexpectedToken {
        span: Span,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input at {pos}: expected {expected}")]
    UnexpectedEof { pos: usize, expected: String },

    #[error("Invalid syntax at {span}: {message}")]
    InvalidSyntax { span: Span, message: String },

    #[error("Lexer error at {span}: unrecognised input")]
    LexerError { span: Span },

    #[error("Nesting too deep at {span}: more than {limit} levels")]
    TooDeep { span: Span, limit: usize },
}

impl ParseError {
    pub fn unexpected_token_span(
        span: Span,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            span,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            pos,
            expected: expected.into(),
        }
    }

    pub fn invalid_syntax_span(span: Span, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span,
            message: message.into(),
        }
    }

    pub fn lexer_error(span: Span) -> Self {
        Self::LexerError { span }
    }

    pub fn too_deep(span: Span, limit: usize) -> Self {
        Self::TooDeep { span, limit }
    }

    /// Source range the error points at. End-of-input errors collapse to an empty span.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { pos, .. } => Span::new(*pos, *pos),
            ParseError::InvalidSyntax { span, .. } => *span,
            ParseError::LexerError { span } => *span,
            ParseError::TooDeep { span, .. } => *span,
        }
    }

    fn label(&self) -> String {
        match self {
            ParseError::UnexpectedToken { expected, .. } => format!("expected {}", expected),
            ParseError::UnexpectedEof { expected, .. } => format!("expected {}", expected),
            ParseError::InvalidSyntax { message, .. } => message.clone(),
            ParseError::LexerError { .. } => "unrecognised input".to_string(),
            ParseError::TooDeep { limit, .. } => format!("nested deeper than {}", limit),
        }
    }

    /// Pretty-print the error with source context using ariadne
    #[cfg(feature = "pretty-errors")]
    pub fn render(&self, source: &str, filename: &str) -> String {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let span = self.span();
        let end = span.end.max(span.start + 1).min(source.len().max(1));
        let start = span.start.min(end.saturating_sub(1));

        let mut output = Vec::new();
        let written = Report::build(ReportKind::Error, filename, start)
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, start..end))
                    .with_color(Color::Red)
                    .with_message(self.label()),
            )
            .finish()
            .write((filename, Source::from(source)), &mut output);

        match written {
            Ok(()) => String::from_utf8(output).unwrap_or_else(|_| self.to_string()),
            Err(_) => self.to_string(),
        }
    }

    #[cfg(not(feature = "pretty-errors"))]
    pub fn render(&self, _source: &str, filename: &str) -> String {
        format!("{}: {} ({})", filename, self, self.label())
    }
}
