use crate::context::CompilerContext;
use crate::ir::{
    ConditionValue, ConstantValue, DisplayArguments, DisplayDirectives, ExecutableDefinition,
    Selection, VariableDefinition,
};
use crate::schema::CompilerSchema;

/// Print every document of `context` and join them with a blank line
pub fn print_context(context: &CompilerContext) -> String {
    context
        .documents()
        .iter()
        .map(|document| print_document(context.schema(), document))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print one document as GraphQL text ending with a newline
pub fn print_document(schema: &CompilerSchema, document: &ExecutableDefinition) -> String {
    let mut printer = Printer::new(schema);
    printer.print_document(document);
    printer.buffer
}

/// Output buffer with two-space indentation
struct Printer<'a> {
    schema: &'a CompilerSchema,
    buffer: String,
    indent_level: usize,
}

impl<'a> Printer<'a> {
    fn new(schema: &'a CompilerSchema) -> Self {
        Self {
            schema,
            buffer: String::new(),
            indent_level: 0,
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        self.add_indented(text);
        self.add("\n");
    }

    fn add_indented(&mut self, text: &str) {
        for _ in 0..self.indent_level {
            self.buffer.push_str("  ");
        }
        self.buffer.push_str(text);
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn print_document(&mut self, document: &ExecutableDefinition) {
        match document {
            ExecutableDefinition::Operation(op) => {
                self.add(&format!("{} {}", op.kind, op.name));
                self.print_variable_definitions(&op.variable_definitions);
                self.add(&DisplayDirectives(&op.directives).to_string());
                self.print_selections(&op.selections);
            }
            ExecutableDefinition::Fragment(fragment) => {
                self.add(&format!(
                    "fragment {} on {}",
                    fragment.name,
                    self.schema.type_name(fragment.type_condition)
                ));
                self.print_argument_definitions(&fragment.variable_definitions);
                self.add(&DisplayDirectives(&fragment.directives).to_string());
                self.print_selections(&fragment.selections);
            }
        }
        self.add("\n");
    }

    /// `(\n  $a: T = v\n)`
    fn print_variable_definitions(&mut self, definitions: &[VariableDefinition]) {
        if definitions.is_empty() {
            return;
        }
        self.add("(\n");
        for definition in definitions {
            let mut line = format!(
                "  ${}: {}",
                definition.name,
                self.schema.display_type(&definition.type_)
            );
            if let Some(value) = non_null_default(definition) {
                line.push_str(&format!(" = {}", value));
            }
            self.add(&line);
            self.add("\n");
        }
        self.add(")");
    }

    /// ` @argumentDefinitions(\n  a: {type: "T", defaultValue: v}\n)`
    fn print_argument_definitions(&mut self, definitions: &[VariableDefinition]) {
        if definitions.is_empty() {
            return;
        }
        self.add(" @argumentDefinitions(\n");
        for definition in definitions {
            let mut line = format!(
                "  {}: {{type: \"{}\"",
                definition.name,
                self.schema.display_type(&definition.type_)
            );
            if let Some(value) = non_null_default(definition) {
                line.push_str(&format!(", defaultValue: {}", value));
            }
            line.push('}');
            self.add(&line);
            self.add("\n");
        }
        self.add(")");
    }

    fn print_selections(&mut self, selections: &[Selection]) {
        if selections.is_empty() {
            return;
        }
        self.add(" {\n");
        self.indent();
        for selection in selections {
            self.print_selection(selection, "");
        }
        self.dedent();
        self.add_indented("}");
    }

    /// `parent_directives` carries conditions pushed down from enclosing `Condition` nodes
    fn print_selection(&mut self, selection: &Selection, parent_directives: &str) {
        match selection {
            Selection::ScalarField(field) => {
                let line = format!(
                    "{}{}{}{}",
                    field_name(field.alias.as_deref(), &field.name),
                    DisplayArguments(&field.arguments),
                    parent_directives,
                    DisplayDirectives(&field.directives)
                );
                self.add_line(&line);
            }
            Selection::LinkedField(field) => {
                let head = format!(
                    "{}{}{}{}",
                    field_name(field.alias.as_deref(), &field.name),
                    DisplayArguments(&field.arguments),
                    parent_directives,
                    DisplayDirectives(&field.directives)
                );
                self.add_indented(&head);
                self.print_selections(&field.selections);
                self.add("\n");
            }
            Selection::InlineFragment(inline) => {
                let head = format!(
                    "... on {}{}{}",
                    self.schema.type_name(inline.type_condition),
                    parent_directives,
                    DisplayDirectives(&inline.directives)
                );
                self.add_indented(&head);
                self.print_selections(&inline.selections);
                self.add("\n");
            }
            Selection::FragmentSpread(spread) => {
                let arguments = DisplayArguments(&spread.arguments).to_string();
                let arguments = if arguments.is_empty() {
                    arguments
                } else {
                    format!(" @arguments{}", arguments)
                };
                let line = format!(
                    "...{}{}{}{}",
                    spread.fragment,
                    parent_directives,
                    arguments,
                    DisplayDirectives(&spread.directives)
                );
                self.add_line(&line);
            }
            Selection::Condition(condition) => {
                let value = match &condition.value {
                    ConditionValue::Constant(value) => value.to_string(),
                    ConditionValue::Variable(variable) => format!("${}", variable.name),
                };
                let directive = format!(
                    " @{}(if: {}){}",
                    if condition.passing_value { "include" } else { "skip" },
                    value,
                    parent_directives
                );
                for child in &condition.selections {
                    self.print_selection(child, &directive);
                }
            }
        }
    }
}

fn field_name(alias: Option<&str>, name: &str) -> String {
    match alias {
        Some(alias) if alias != name => format!("{}: {}", alias, name),
        _ => name.to_string(),
    }
}

fn non_null_default(definition: &VariableDefinition) -> Option<&ConstantValue> {
    definition
        .default_value
        .as_ref()
        .filter(|value| **value != ConstantValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_ir;
    use relay_repl_parser::parse_document;
    use std::sync::Arc;

    const SDL: &str = r#"
        type Query { user(id: ID!, size: Int): User }
        type User { id: ID! name: String avatar(size: Int): String friends(first: Int): [User] }
    "#;

    fn print(source: &str) -> String {
        let schema = Arc::new(CompilerSchema::parse(SDL).expect("schema"));
        let documents = build_ir(&schema, &parse_document(source).expect("parse")).expect("lower");
        let mut context = CompilerContext::new(schema);
        context.add_all(documents).expect("add");
        print_context(&context)
    }

    #[test]
    fn test_prints_variables_and_arguments() {
        let output = print(
            "query Q($id: ID!, $size: Int = 32) { user(id: $id) { me: id avatar(size: $size) } }",
        );
        assert_eq!(
            output,
            "query Q(\n  $id: ID!\n  $size: Int = 32\n) {\n  user(id: $id) {\n    me: id\n    avatar(size: $size)\n  }\n}\n"
        );
    }

    #[test]
    fn test_conditions_are_pushed_down_to_each_child() {
        let output = print(
            "query Q($a: Boolean!) { user(id: 1) { ... @include(if: $a) { id name } } }",
        );
        assert!(
            output.contains("    ... on User @include(if: $a) {\n      id\n      name\n    }\n")
        );

        let output = print(
            "query Q($a: Boolean!, $b: Boolean!) { user(id: 1) { name @include(if: $a) @skip(if: $b) } }",
        );
        assert!(output.contains("    name @include(if: $a) @skip(if: $b)\n"));
    }

    #[test]
    fn test_prints_fragments_and_spreads() {
        let output = print(
            r#"
            fragment F on User @argumentDefinitions(n: {type: "Int", defaultValue: 3}, m: {type: "Int"}) {
              friends(first: $n) { id }
            }
            query Q { user(id: 1) { ...F @arguments(n: 5, m: null) } }
            "#,
        );
        assert_eq!(
            output,
            "fragment F on User @argumentDefinitions(\n  n: {type: \"Int\", defaultValue: 3}\n  m: {type: \"Int\"}\n) {\n  friends(first: $n) {\n    id\n  }\n}\n\nquery Q {\n  user(id: 1) {\n    ...F @arguments(n: 5)\n  }\n}\n"
        );
    }
}
