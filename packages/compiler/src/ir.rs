//! Intermediate representation of executable documents.
//!
//! Unlike the syntax tree, IR nodes are typed against a `CompilerSchema`:
//! fields point at their definition, type conditions are resolved ids and
//! `@include` / `@skip` are lifted into `Condition` nodes.

use crate::schema::{FieldId, TypeId, TypeReference};
use relay_repl_parser::ast::OperationKind;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutableDefinition {
    Operation(Operation),
    Fragment(Fragment),
}

impl ExecutableDefinition {
    pub fn name(&self) -> &str {
        match self {
            ExecutableDefinition::Operation(op) => &op.name,
            ExecutableDefinition::Fragment(fragment) => &fragment.name,
        }
    }

    /// Parent type of the top-level selections
    pub fn type_(&self) -> TypeId {
        match self {
            ExecutableDefinition::Operation(op) => op.type_,
            ExecutableDefinition::Fragment(fragment) => fragment.type_condition,
        }
    }

    pub fn directives(&self) -> &[Directive] {
        match self {
            ExecutableDefinition::Operation(op) => &op.directives,
            ExecutableDefinition::Fragment(fragment) => &fragment.directives,
        }
    }

    pub fn selections(&self) -> &[Selection] {
        match self {
            ExecutableDefinition::Operation(op) => &op.selections,
            ExecutableDefinition::Fragment(fragment) => &fragment.selections,
        }
    }

    pub fn selections_mut(&mut self) -> &mut Vec<Selection> {
        match self {
            ExecutableDefinition::Operation(op) => &mut op.selections,
            ExecutableDefinition::Fragment(fragment) => &mut fragment.selections,
        }
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self, ExecutableDefinition::Fragment(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub kind: OperationKind,
    /// Root type for `kind`
    pub type_: TypeId,
    pub variable_definitions: Vec<VariableDefinition>,
    pub directives: Vec<Directive>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub type_condition: TypeId,
    /// Declared through `@argumentDefinitions`
    pub variable_definitions: Vec<VariableDefinition>,
    /// Variables referenced but not declared, expected from the enclosing operation
    pub used_global_variables: Vec<VariableDefinition>,
    pub directives: Vec<Directive>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub type_: TypeReference,
    pub default_value: Option<ConstantValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    ScalarField(ScalarField),
    LinkedField(LinkedField),
    InlineFragment(InlineFragment),
    FragmentSpread(FragmentSpread),
    Condition(Condition),
}

impl Selection {
    pub fn is_field(&self) -> bool {
        matches!(self, Selection::ScalarField(_) | Selection::LinkedField(_))
    }

    pub fn selections(&self) -> Option<&[Selection]> {
        match self {
            Selection::LinkedField(field) => Some(&field.selections),
            Selection::InlineFragment(inline) => Some(&inline.selections),
            Selection::Condition(condition) => Some(&condition.selections),
            Selection::ScalarField(_) | Selection::FragmentSpread(_) => None,
        }
    }

    /// Key under which equivalent selections are merged or deduplicated.
    /// Selections of different kinds never share an identifier.
    pub fn identifier(&self) -> String {
        match self {
            Selection::ScalarField(field) => {
                format!(
                    "{}{}",
                    field.alias_or_name(),
                    DisplayDirectives(&field.directives)
                )
            }
            Selection::LinkedField(field) => {
                format!(
                    "{}{}",
                    field.alias_or_name(),
                    DisplayDirectives(&field.directives)
                )
            }
            Selection::InlineFragment(inline) => format!(
                "I:{}{}",
                inline.type_condition.index(),
                DisplayDirectives(&inline.directives)
            ),
            Selection::FragmentSpread(spread) => format!(
                "...{}{}{}",
                spread.fragment,
                DisplayArguments(&spread.arguments),
                DisplayDirectives(&spread.directives)
            ),
            Selection::Condition(condition) => {
                let value = match &condition.value {
                    ConditionValue::Constant(value) => value.to_string(),
                    ConditionValue::Variable(variable) => format!("${}", variable.name),
                };
                format!("C:{}{}", value, condition.passing_value)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    pub alias: Option<String>,
    pub name: String,
    pub definition: FieldId,
    pub arguments: Vec<Argument>,
    pub directives: Vec<Directive>,
}

impl ScalarField {
    pub fn alias_or_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkedField {
    pub alias: Option<String>,
    pub name: String,
    pub definition: FieldId,
    /// Field type; its inner type is the parent of `selections`
    pub type_: TypeReference,
    pub arguments: Vec<Argument>,
    pub directives: Vec<Directive>,
    pub selections: Vec<Selection>,
}

impl LinkedField {
    pub fn alias_or_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    pub type_condition: TypeId,
    pub directives: Vec<Directive>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpread {
    pub fragment: String,
    /// Values passed through `@arguments`
    pub arguments: Vec<Argument>,
    pub directives: Vec<Directive>,
}

/// Selections guarded by `@include` (`passing_value == true`) or `@skip`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub value: ConditionValue,
    pub passing_value: bool,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Constant(bool),
    Variable(Variable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: Value,
}

/// Variable reference, typed by the location it is used in
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub type_: TypeReference,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Constant(ConstantValue),
    Variable(Variable),
    /// Lists and objects that contain at least one variable
    List(Vec<Value>),
    Object(Vec<(String, Value)>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(String),
    Float(String),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<ConstantValue>),
    Object(Vec<(String, ConstantValue)>),
}

impl Value {
    /// Collapse a list or object into a constant when it holds no variables
    pub fn list(items: Vec<Value>) -> Value {
        if items.iter().all(|item| matches!(item, Value::Constant(_))) {
            Value::Constant(ConstantValue::List(
                items.into_iter().filter_map(Value::into_constant).collect(),
            ))
        } else {
            Value::List(items)
        }
    }

    pub fn object(fields: Vec<(String, Value)>) -> Value {
        if fields.iter().all(|(_, value)| matches!(value, Value::Constant(_))) {
            Value::Constant(ConstantValue::Object(
                fields
                    .into_iter()
                    .filter_map(|(name, value)| value.into_constant().map(|v| (name, v)))
                    .collect(),
            ))
        } else {
            Value::Object(fields)
        }
    }

    pub fn into_constant(self) -> Option<ConstantValue> {
        match self {
            Value::Constant(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Constant(value) => write!(f, "{}", value),
            Value::Variable(variable) => write!(f, "${}", variable.name),
            Value::List(items) => write_list(f, items),
            Value::Object(fields) => write_object(f, fields),
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Int(n) | ConstantValue::Float(n) => f.write_str(n),
            ConstantValue::String(s) => {
                let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
                f.write_str(&quoted)
            }
            ConstantValue::Boolean(b) => write!(f, "{}", b),
            ConstantValue::Null => f.write_str("null"),
            ConstantValue::Enum(name) => f.write_str(name),
            ConstantValue::List(items) => write_list(f, items),
            ConstantValue::Object(fields) => write_object(f, fields),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

fn write_object<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    fields: &[(String, T)],
) -> fmt::Result {
    f.write_str("{")?;
    for (i, (name, value)) in fields.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {}", name, value)?;
    }
    f.write_str("}")
}

/// `(a: 1, b: $x)`; empty when there are no arguments with a non-null value
pub struct DisplayArguments<'a>(pub &'a [Argument]);

impl fmt::Display for DisplayArguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printed = self
            .0
            .iter()
            .filter(|arg| arg.value != Value::Constant(ConstantValue::Null))
            .peekable();
        if printed.peek().is_none() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, arg) in printed.enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", arg.name, arg.value)?;
        }
        f.write_str(")")
    }
}

/// ` @a(x: 1) @b`, with a leading space when non-empty
pub struct DisplayDirectives<'a>(pub &'a [Directive]);

impl fmt::Display for DisplayDirectives<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for directive in self.0 {
            write!(f, " @{}{}", directive.name, DisplayArguments(&directive.arguments))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_display() {
        let value = ConstantValue::Object(vec![
            ("first".to_string(), ConstantValue::Int("10".to_string())),
            ("query".to_string(), ConstantValue::String("say \"hi\"".to_string())),
            (
                "episodes".to_string(),
                ConstantValue::List(vec![
                    ConstantValue::Enum("JEDI".to_string()),
                    ConstantValue::Null,
                ]),
            ),
        ]);
        assert_eq!(
            value.to_string(),
            r#"{first: 10, query: "say \"hi\"", episodes: [JEDI, null]}"#
        );
    }

    #[test]
    fn test_arguments_omit_null_values() {
        let args = vec![
            Argument {
                name: "a".to_string(),
                value: Value::Constant(ConstantValue::Null),
            },
            Argument {
                name: "b".to_string(),
                value: Value::Constant(ConstantValue::Boolean(true)),
            },
        ];
        assert_eq!(DisplayArguments(&args).to_string(), "(b: true)");
        assert_eq!(DisplayArguments(&args[..1]).to_string(), "");
    }

    #[test]
    fn test_list_collapses_to_constant() {
        let value = Value::list(vec![
            Value::Constant(ConstantValue::Int("1".to_string())),
            Value::Constant(ConstantValue::Int("2".to_string())),
        ]);
        assert_eq!(
            value,
            Value::Constant(ConstantValue::List(vec![
                ConstantValue::Int("1".to_string()),
                ConstantValue::Int("2".to_string()),
            ]))
        );
    }

    #[test]
    fn test_condition_identifier() {
        let condition = Selection::Condition(Condition {
            value: ConditionValue::Constant(false),
            passing_value: true,
            selections: Vec::new(),
        });
        assert_eq!(condition.identifier(), "C:falsetrue");
    }
}
