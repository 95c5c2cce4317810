use crate::schema::{FieldDefinition, Schema};
use relay_repl_parser::ast::{OperationKind, Span};
use relay_repl_parser::{tokenize, Token};
use serde::Serialize;

/// A completion candidate for the operation editor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    pub label: String,
    /// Rendered field type, e.g. `[Episode]!`
    pub detail: String,
    pub description: Option<String>,
    pub deprecated: bool,
}

impl Completion {
    fn from_field(field: &FieldDefinition) -> Self {
        Self {
            label: field.name.clone(),
            detail: field.type_.to_string(),
            description: field.description.clone(),
            deprecated: field.deprecation_reason.is_some(),
        }
    }
}

/// Fields of `type_name` whose name starts with `prefix`, in definition order.
/// `__typename` is offered on every composite type.
pub fn suggest_fields(schema: &Schema, type_name: &str, prefix: &str) -> Vec<Completion> {
    let Some(ty) = schema.get_type(type_name) else {
        return Vec::new();
    };
    if !ty.kind.is_composite() {
        return Vec::new();
    }

    let mut completions: Vec<Completion> = ty
        .fields
        .iter()
        .filter(|field| field.name.starts_with(prefix))
        .map(Completion::from_field)
        .collect();

    if "__typename".starts_with(prefix) {
        if let Some(typename) = schema.field(type_name, "__typename") {
            completions.push(Completion::from_field(typename));
        }
    }

    completions
}

/// Field completions at byte `offset` of possibly incomplete operation text.
///
/// Works on tokens rather than a syntax tree so that text being typed still
/// gets hints. Returns nothing when the offset is not inside a selection set.
pub fn complete_at(schema: &Schema, source: &str, offset: usize) -> Vec<Completion> {
    let offset = offset.min(source.len());
    let Some(prefix_text) = source.get(..offset) else {
        return Vec::new();
    };
    let Ok(mut tokens) = tokenize(prefix_text) else {
        return Vec::new();
    };

    // A name touching the cursor is the partial word being completed
    let partial = match tokens.last() {
        Some((Token::Name(name), span)) if span.end == offset => Some(name.to_string()),
        _ => None,
    };
    if partial.is_some() {
        tokens.pop();
    }
    let prefix = partial.unwrap_or_default();

    match enclosing_type(schema, &tokens) {
        Some(type_name) => suggest_fields(schema, &type_name, &prefix),
        None => Vec::new(),
    }
}

/// Walk tokens and return the type of the innermost open selection set
fn enclosing_type(
    schema: &Schema,
    tokens: &[(Token<'_>, Span)],
) -> Option<String> {
    let mut stack: Vec<Option<String>> = Vec::new();
    let mut pending: Option<Option<String>> = None;
    let mut paren_depth = 0usize;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i].0;
        let next = tokens.get(i + 1).map(|(t, _)| t);

        if paren_depth > 0 {
            match token {
                Token::LParen => paren_depth += 1,
                Token::RParen => paren_depth -= 1,
                _ => {}
            }
            i += 1;
            continue;
        }

        match token {
            Token::LParen => paren_depth += 1,
            Token::LBrace => {
                let ty = match pending.take() {
                    Some(ty) => ty,
                    // `{ ... }` shorthand at the top level
                    None if stack.is_empty() => Some(schema.query_type().name.clone()),
                    None => None,
                };
                stack.push(ty);
            }
            Token::RBrace => {
                stack.pop();
                pending = None;
            }
            Token::At => {
                // Skip the directive name
                i += 1;
            }
            Token::Name(keyword) if stack.is_empty() => {
                if let Some(kind) = OperationKind::from_keyword(keyword) {
                    pending = Some(schema.root_type(kind).map(|t| t.name.clone()));
                } else if *keyword == "on" {
                    if let Some(Token::Name(type_name)) = next {
                        pending = Some(Some(type_name.to_string()));
                        i += 1;
                    }
                }
            }
            Token::Name("on") if matches!(next, Some(Token::Name(_))) => {
                if let Some(Token::Name(type_name)) = next {
                    pending = Some(Some(type_name.to_string()));
                }
                i += 1;
            }
            Token::Name(_) if matches!(next, Some(Token::Colon)) => {
                // Alias; the field name follows the colon
                i += 1;
            }
            Token::Name(field_name) => {
                let parent = stack.last().cloned().flatten();
                pending = Some(parent.and_then(|parent| {
                    schema
                        .field(&parent, field_name)
                        .map(|field| field.type_.inner_name().to_string())
                }));
            }
            _ => {}
        }
        i += 1;
    }

    stack.last().cloned().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_schema;

    const SCHEMA: &str = r#"
        type Query { hero: Character human(id: ID!): Human }
        interface Character { id: ID! name: String! friends: [Character] }
        type Human implements Character {
          id: ID! name: String! friends: [Character] homePlanet: String
        }
    "#;

    fn labels(completions: Vec<Completion>) -> Vec<String> {
        completions.into_iter().map(|c| c.label).collect()
    }

    #[test]
    fn test_suggest_fields_by_prefix() {
        let schema = build_schema(SCHEMA).expect("schema");
        assert_eq!(labels(suggest_fields(&schema, "Character", "n")), vec!["name"]);
        assert_eq!(
            labels(suggest_fields(&schema, "Character", "")),
            vec!["id", "name", "friends", "__typename"]
        );
        assert!(suggest_fields(&schema, "String", "").is_empty());
    }

    #[test]
    fn test_complete_inside_nested_selection() {
        let schema = build_schema(SCHEMA).expect("schema");
        let source = "query Q { hero { friends { na";
        assert_eq!(labels(complete_at(&schema, source, source.len())), vec!["name"]);
    }

    #[test]
    fn test_complete_skips_arguments_and_aliases() {
        let schema = build_schema(SCHEMA).expect("schema");
        let source = "query Q { me: human(id: \"1\") { home";
        assert_eq!(
            labels(complete_at(&schema, source, source.len())),
            vec!["homePlanet"]
        );
    }

    #[test]
    fn test_complete_in_inline_fragment_and_fragment_definition() {
        let schema = build_schema(SCHEMA).expect("schema");

        let source = "query Q { hero { ... on Human { h";
        assert_eq!(
            labels(complete_at(&schema, source, source.len())),
            vec!["homePlanet"]
        );

        let source = "fragment F on Human { id h";
        assert_eq!(
            labels(complete_at(&schema, source, source.len())),
            vec!["homePlanet"]
        );
    }

    #[test]
    fn test_complete_after_closed_selection() {
        let schema = build_schema(SCHEMA).expect("schema");
        let source = "query Q { hero { id } h";
        assert_eq!(labels(complete_at(&schema, source, source.len())), vec!["hero", "human"]);
    }

    #[test]
    fn test_no_completions_outside_selection() {
        let schema = build_schema(SCHEMA).expect("schema");
        assert!(complete_at(&schema, "query Q", 7).is_empty());
    }
}
