use crate::diagnostic::Diagnostic;
use crate::schema::{NamedType, Schema};
use relay_repl_parser::ast::*;
use relay_repl_parser::parse_document;
use std::collections::{HashMap, HashSet};

/// Directives understood by the Relay compiler without a schema declaration
pub const RELAY_DIRECTIVES: &[&str] = &["argumentDefinitions", "arguments", "relay", "connection"];

/// Parse and validate operation text. Syntax errors become a single `syntax` diagnostic.
pub fn lint_operation(schema: &Schema, source: &str) -> Vec<Diagnostic> {
    match parse_document(source) {
        Ok(document) => validate_operation(schema, &document),
        Err(err) => vec![Diagnostic::error("syntax", err.to_string(), err.span())],
    }
}

/// Validate an operation document against a schema
pub fn validate_operation(schema: &Schema, document: &Document) -> Vec<Diagnostic> {
    let mut validator = Validator::new(schema, document);
    validator.run();
    validator.diagnostics
}

struct Validator<'a> {
    schema: &'a Schema,
    document: &'a Document,
    fragments: HashMap<&'a str, &'a FragmentDefinition>,
    used_fragments: HashSet<&'a str>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Validator<'a> {
    fn new(schema: &'a Schema, document: &'a Document) -> Self {
        Self {
            schema,
            document,
            fragments: HashMap::new(),
            used_fragments: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    fn run(&mut self) {
        let document = self.document;

        for fragment in document.fragments() {
            if self.fragments.insert(&fragment.name, fragment).is_some() {
                self.diagnostics.push(Diagnostic::error(
                    "unique-fragment-names",
                    format!("There can be only one fragment named \"{}\"", fragment.name),
                    fragment.span,
                ));
            }
        }

        let operation_count = document.operations().count();
        let mut operation_names = HashSet::new();

        for definition in &document.definitions {
            match definition {
                ExecutableDefinition::Operation(op) => {
                    match &op.name {
                        Some(name) if !operation_names.insert(name.as_str()) => {
                            self.diagnostics.push(Diagnostic::error(
                                "unique-operation-names",
                                format!("There can be only one operation named \"{}\"", name),
                                op.span,
                            ));
                        }
                        None if operation_count > 1 => {
                            self.diagnostics.push(Diagnostic::error(
                                "lone-anonymous-operation",
                                "This anonymous operation must be the only defined operation",
                                op.span,
                            ));
                        }
                        _ => {}
                    }
                    self.check_operation(op);
                }
                ExecutableDefinition::Fragment(fragment) => self.check_fragment(fragment),
            }
        }

        for fragment in document.fragments() {
            if !self.used_fragments.contains(fragment.name.as_str()) {
                self.diagnostics.push(Diagnostic::warning(
                    "no-unused-fragments",
                    format!("Fragment \"{}\" is never used", fragment.name),
                    fragment.span,
                ));
            }
        }
    }

    fn check_operation(&mut self, op: &'a OperationDefinition) {
        let Some(root) = self.schema.root_type(op.kind) else {
            self.diagnostics.push(Diagnostic::error(
                "known-root-type",
                format!("Schema is not configured to execute {} operations", op.kind),
                op.span,
            ));
            return;
        };

        let mut defined = HashSet::new();
        for var in &op.variable_definitions {
            if !defined.insert(var.name.as_str()) {
                self.diagnostics.push(Diagnostic::error(
                    "unique-variable-names",
                    format!("There can be only one variable named \"${}\"", var.name),
                    var.span,
                ));
            }
            match self.schema.kind_of(&var.type_) {
                None => self.unknown_type(var.type_.inner_name(), var.span),
                Some(kind) if !kind.is_input() => {
                    self.diagnostics.push(Diagnostic::error(
                        "variables-are-input-types",
                        format!(
                            "Variable \"${}\" cannot be non-input type \"{}\"",
                            var.name, var.type_
                        ),
                        var.span,
                    ));
                }
                Some(_) => {}
            }
        }

        self.check_directives(&op.directives, Some(&defined));
        self.check_selection_set(root, &op.selection_set, Some(&defined));
    }

    fn check_fragment(&mut self, fragment: &'a FragmentDefinition) {
        let Some(ty) = self.composite_condition(&fragment.type_condition, fragment.span) else {
            return;
        };
        // Fragment variables are either local arguments or globals of the including operation
        self.check_directives(&fragment.directives, None);
        self.check_selection_set(ty, &fragment.selection_set, None);
    }

    fn check_selection_set(
        &mut self,
        parent: &'a NamedType,
        selection_set: &'a SelectionSet,
        variables: Option<&HashSet<&str>>,
    ) {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => self.check_field(parent, field, variables),
                Selection::InlineFragment(inline) => {
                    self.check_directives(&inline.directives, variables);
                    let ty = match &inline.type_condition {
                        Some(name) => match self.composite_condition(name, inline.span) {
                            Some(ty) => ty,
                            None => continue,
                        },
                        None => parent,
                    };
                    self.check_overlap(parent, ty, "an inline fragment", inline.span);
                    self.check_selection_set(ty, &inline.selection_set, variables);
                }
                Selection::FragmentSpread(spread) => {
                    self.check_directives(&spread.directives, variables);
                    self.used_fragments.insert(&spread.fragment_name);

                    let Some(&fragment) = self.fragments.get(spread.fragment_name.as_str()) else {
                        self.diagnostics.push(Diagnostic::error(
                            "known-fragment-names",
                            format!("Unknown fragment \"{}\"", spread.fragment_name),
                            spread.span,
                        ));
                        continue;
                    };
                    if let Some(ty) = self.schema.get_type(&fragment.type_condition) {
                        let what = format!("fragment \"{}\"", spread.fragment_name);
                        self.check_overlap(parent, ty, &what, spread.span);
                    }
                }
            }
        }
    }

    fn check_field(
        &mut self,
        parent: &'a NamedType,
        field: &'a Field,
        variables: Option<&HashSet<&str>>,
    ) {
        self.check_directives(&field.directives, variables);

        let Some(definition) = self.schema.field(&parent.name, &field.name) else {
            let mut diagnostic = Diagnostic::error(
                "fields-on-correct-type",
                format!(
                    "Cannot query field \"{}\" on type \"{}\"",
                    field.name, parent.name
                ),
                field.span,
            );
            if let Some(closest) =
                closest_match(&field.name, parent.fields.iter().map(|f| f.name.as_str()))
            {
                diagnostic = diagnostic.with_suggestion(format!("Did you mean \"{}\"?", closest));
            }
            self.diagnostics.push(diagnostic);
            return;
        };

        for argument in &field.arguments {
            if definition.argument(&argument.name).is_none() {
                let mut diagnostic = Diagnostic::error(
                    "known-argument-names",
                    format!(
                        "Unknown argument \"{}\" on field \"{}.{}\"",
                        argument.name, parent.name, field.name
                    ),
                    argument.span,
                );
                if let Some(closest) = closest_match(
                    &argument.name,
                    definition.arguments.iter().map(|a| a.name.as_str()),
                ) {
                    diagnostic =
                        diagnostic.with_suggestion(format!("Did you mean \"{}\"?", closest));
                }
                self.diagnostics.push(diagnostic);
            }
            self.check_value(&argument.value, argument.span, variables);
        }

        for expected in &definition.arguments {
            let provided = field.arguments.iter().any(|a| a.name == expected.name);
            if !provided && expected.type_.is_non_null() && expected.default_value.is_none() {
                self.diagnostics.push(Diagnostic::error(
                    "provided-required-arguments",
                    format!(
                        "Field \"{}\" argument \"{}\" of type \"{}\" is required, but it was not provided",
                        field.name, expected.name, expected.type_
                    ),
                    field.span,
                ));
            }
        }

        if let Some(reason) = &definition.deprecation_reason {
            self.diagnostics.push(Diagnostic::warning(
                "no-deprecated",
                format!(
                    "The field \"{}.{}\" is deprecated. {}",
                    parent.name, field.name, reason
                ),
                field.span,
            ));
        }

        let Some(field_type) = self.schema.get_type(definition.type_.inner_name()) else {
            return;
        };

        match (&field.selection_set, field_type.kind.is_leaf()) {
            (Some(_), true) => self.diagnostics.push(Diagnostic::error(
                "scalar-leafs",
                format!(
                    "Field \"{}\" must not have a selection since type \"{}\" has no subfields",
                    field.name, definition.type_
                ),
                field.span,
            )),
            (None, false) => self.diagnostics.push(
                Diagnostic::error(
                    "scalar-leafs",
                    format!(
                        "Field \"{}\" of type \"{}\" must have a selection of subfields",
                        field.name, definition.type_
                    ),
                    field.span,
                )
                .with_suggestion(format!("Did you mean \"{} {{ ... }}\"?", field.name)),
            ),
            (Some(selection_set), false) => {
                self.check_selection_set(field_type, selection_set, variables)
            }
            (None, true) => {}
        }
    }

    fn check_directives(&mut self, directives: &[Directive], variables: Option<&HashSet<&str>>) {
        for directive in directives {
            if RELAY_DIRECTIVES.contains(&directive.name.as_str()) {
                continue;
            }

            let Some(definition) = self.schema.directive(&directive.name) else {
                self.diagnostics.push(Diagnostic::error(
                    "known-directives",
                    format!("Unknown directive \"@{}\"", directive.name),
                    directive.span,
                ));
                continue;
            };

            for argument in &directive.arguments {
                if definition.argument(&argument.name).is_none() {
                    self.diagnostics.push(Diagnostic::error(
                        "known-argument-names",
                        format!(
                            "Unknown argument \"{}\" on directive \"@{}\"",
                            argument.name, directive.name
                        ),
                        argument.span,
                    ));
                }
                self.check_value(&argument.value, argument.span, variables);
            }
        }
    }

    fn check_value(&mut self, value: &Value, span: Span, variables: Option<&HashSet<&str>>) {
        match value {
            Value::Variable(name) => {
                if let Some(defined) = variables {
                    if !defined.contains(name.as_str()) {
                        self.diagnostics.push(Diagnostic::error(
                            "no-undefined-variables",
                            format!("Variable \"${}\" is not defined", name),
                            span,
                        ));
                    }
                }
            }
            Value::List(items) => {
                for item in items {
                    self.check_value(item, span, variables);
                }
            }
            Value::Object(fields) => {
                for (_, item) in fields {
                    self.check_value(item, span, variables);
                }
            }
            _ => {}
        }
    }

    /// Resolve a type condition, reporting unknown or non-composite types
    fn composite_condition(&mut self, name: &str, span: Span) -> Option<&'a NamedType> {
        let Some(ty) = self.schema.get_type(name) else {
            self.unknown_type(name, span);
            return None;
        };
        if !ty.kind.is_composite() {
            self.diagnostics.push(Diagnostic::error(
                "fragments-on-composite-types",
                format!("Fragment cannot condition on non composite type \"{}\"", name),
                span,
            ));
            return None;
        }
        Some(ty)
    }

    fn check_overlap(&mut self, parent: &NamedType, ty: &NamedType, what: &str, span: Span) {
        if !self.schema.types_overlap(&parent.name, &ty.name) {
            self.diagnostics.push(Diagnostic::error(
                "possible-fragment-spreads",
                format!(
                    "{} cannot be spread here as objects of type \"{}\" can never be of type \"{}\"",
                    capitalize(what),
                    parent.name,
                    ty.name
                ),
                span,
            ));
        }
    }

    fn unknown_type(&mut self, name: &str, span: Span) {
        let mut diagnostic = Diagnostic::error(
            "known-type-names",
            format!("Unknown type \"{}\"", name),
            span,
        );
        if let Some(closest) = closest_match(name, self.schema.types().map(|t| t.name.as_str())) {
            diagnostic = diagnostic.with_suggestion(format!("Did you mean \"{}\"?", closest));
        }
        self.diagnostics.push(diagnostic);
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Closest candidate within an edit distance of 40% of the input length, plus one
pub(crate) fn closest_match<'b>(
    input: &str,
    candidates: impl Iterator<Item = &'b str>,
) -> Option<&'b str> {
    let threshold = input.len() * 2 / 5 + 1;
    let input = input.to_lowercase();
    candidates
        .map(|candidate| (edit_distance(&input, &candidate.to_lowercase()), candidate))
        .filter(|(distance, _)| *distance <= threshold)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b_chars.len() + 1];
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (previous[j] + cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        previous = current;
    }

    previous[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_schema;
    use crate::diagnostic::DiagnosticLevel;

    const SCHEMA: &str = r#"
        type Query {
          hero(episode: Episode): Character
          human(id: ID!): Human
          search(text: String): [SearchResult]
        }
        enum Episode { NEWHOPE EMPIRE JEDI }
        interface Character { id: ID! name: String! friends: [Character] appearsIn: [Episode]! }
        type Human implements Character {
          id: ID! name: String! friends: [Character] appearsIn: [Episode]!
          height: Float @deprecated(reason: "Use heightInMeters")
        }
        type Droid implements Character {
          id: ID! name: String! friends: [Character] appearsIn: [Episode]!
        }
        type Starship { id: ID! }
        union SearchResult = Human | Droid
    "#;

    fn rules(source: &str) -> Vec<&'static str> {
        let schema = build_schema(SCHEMA).expect("schema");
        lint_operation(&schema, source)
            .into_iter()
            .map(|d| d.rule)
            .collect()
    }

    #[test]
    fn test_valid_relay_document_is_clean() {
        let source = r#"
            fragment CharacterData on Character
              @argumentDefinitions(includeAppearsIn: { type: "Boolean", defaultValue: false }) {
              id
              name
              appearsIn @include(if: $includeAppearsIn)
            }

            query UserProfile {
              hero {
                id
                ...CharacterData @arguments(includeAppearsIn: true)
                friends { id ...CharacterData @arguments(includeAppearsIn: false) }
              }
            }
        "#;
        assert!(rules(source).is_empty());
    }

    #[test]
    fn test_unknown_field_has_suggestion() {
        let schema = build_schema(SCHEMA).expect("schema");
        let diagnostics = lint_operation(&schema, "query Q { hero { nmae } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule, "fields-on-correct-type");
        assert_eq!(diagnostics[0].suggestion.as_deref(), Some("Did you mean \"name\"?"));
    }

    #[test]
    fn test_leaf_and_composite_selections() {
        assert_eq!(rules("query Q { hero }"), vec!["scalar-leafs"]);
        assert_eq!(rules("query Q { hero { id { x } } }"), vec!["scalar-leafs"]);
    }

    #[test]
    fn test_missing_required_argument() {
        assert_eq!(
            rules("query Q { human { id } }"),
            vec!["provided-required-arguments"]
        );
    }

    #[test]
    fn test_unknown_and_unused_fragments() {
        let found = rules("query Q { hero { ...Missing } } fragment Unused on Droid { id }");
        assert!(found.contains(&"known-fragment-names"));
        assert!(found.contains(&"no-unused-fragments"));
    }

    #[test]
    fn test_impossible_spread() {
        let found = rules("query Q { hero { ... on Starship { id } } }");
        assert_eq!(found, vec!["possible-fragment-spreads"]);
    }

    #[test]
    fn test_undefined_operation_variable() {
        assert_eq!(
            rules("query Q { hero(episode: $ep) { id } }"),
            vec!["no-undefined-variables"]
        );
        assert!(rules("query Q($ep: Episode) { hero(episode: $ep) { id } }").is_empty());
    }

    #[test]
    fn test_unknown_directive() {
        assert_eq!(rules("query Q { hero @live { id } }"), vec!["known-directives"]);
    }

    #[test]
    fn test_deprecated_field_is_warning() {
        let schema = build_schema(SCHEMA).expect("schema");
        let diagnostics = lint_operation(&schema, "query Q { human(id: 1) { height } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].level, DiagnosticLevel::Warning);
        assert_eq!(diagnostics[0].rule, "no-deprecated");
    }

    #[test]
    fn test_syntax_error_becomes_diagnostic() {
        assert_eq!(rules("query Q { hero {"), vec!["syntax"]);
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let depth = 10_000;
        let source = format!(
            "query Q {}id{}",
            "{ hero ".repeat(depth),
            " }".repeat(depth)
        );
        assert_eq!(rules(&source), vec!["syntax"]);
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(closest_match("nmae", ["id", "name"].into_iter()), Some("name"));
        assert_eq!(closest_match("zzz", ["id", "name"].into_iter()), None);
    }
}
