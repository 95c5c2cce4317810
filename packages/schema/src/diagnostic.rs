use relay_repl_parser::ast::Span;
use serde::Serialize;
use std::fmt;

/// Errors make an operation invalid against the schema. Warnings, such as
/// selecting a deprecated field, do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// A finding in an operation document, named after the GraphQL validation
/// rule that produced it (`scalar-leafs`, `known-type-names`, ...)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub rule: &'static str,
    pub message: String,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, rule: &'static str, message: String, span: Span) -> Self {
        Self {
            level,
            rule,
            message,
            span,
            suggestion: None,
        }
    }

    pub fn error(rule: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticLevel::Error, rule, message.into(), span)
    }

    pub fn warning(rule: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticLevel::Warning, rule, message.into(), span)
    }

    /// Attach a "did you mean" style hint
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " {}", suggestion)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_json() {
        let diagnostic = Diagnostic::error(
            "fields-on-correct-type",
            "Cannot query field \"nam\" on type \"Character\"",
            Span::new(12, 15),
        )
        .with_suggestion("Did you mean \"name\"?");
        assert!(diagnostic.is_error());
        assert_eq!(
            diagnostic.to_string(),
            "[fields-on-correct-type] Cannot query field \"nam\" on type \"Character\" Did you mean \"name\"?"
        );

        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["rule"], "fields-on-correct-type");

        let warning = Diagnostic::warning("no-deprecated", "deprecated", Span::new(0, 1));
        let json = serde_json::to_value(&warning).unwrap();
        assert!(json.get("suggestion").is_none());
    }
}
