use crate::context::CompilerContext;
use crate::error::{TransformError, TransformResult};
use crate::ir::{
    Argument, Condition, ConditionValue, ConstantValue, Directive, ExecutableDefinition, Fragment,
    FragmentSpread, InlineFragment, LinkedField, Operation, ScalarField, Selection, Value,
    Variable, VariableDefinition,
};
use std::collections::HashMap;
use tracing::trace;

/// Variable name to its value in the current scope. Values are either
/// constants or variables of the enclosing operation.
type Scope = HashMap<String, Value>;

enum AppliedFragment {
    /// Being expanded; meeting it again means a cycle
    Pending,
    /// `None` when every selection was dropped
    Resolved(Option<Fragment>),
}

/// Evaluate every operation under its own variable scope.
///
/// Each spread is replaced by a spread of a copy of its fragment specialized for
/// the spread's arguments, named `Fragment_<hash>` when arguments are passed.
/// Conditions on literal values are resolved. Fragments that no operation
/// reaches are removed.
pub fn apply_fragment_arguments(context: &CompilerContext) -> TransformResult<CompilerContext> {
    let mut state = ApplyArguments {
        context,
        fragments: HashMap::new(),
        order: Vec::new(),
    };

    let mut documents = Vec::new();
    for document in context.documents() {
        let ExecutableDefinition::Operation(op) = document else {
            continue;
        };
        let scope = root_scope(&op.variable_definitions);
        if let Some(selections) = state.transform_selections(&scope, &op.selections)? {
            documents.push(ExecutableDefinition::Operation(Operation {
                name: op.name.clone(),
                kind: op.kind,
                type_: op.type_,
                variable_definitions: op.variable_definitions.clone(),
                directives: transform_directives(&scope, &op.directives)?,
                selections,
            }));
        }
    }

    for name in state.order {
        if let Some(AppliedFragment::Resolved(Some(fragment))) = state.fragments.remove(&name) {
            documents.push(ExecutableDefinition::Fragment(fragment));
        }
    }

    Ok(context.with_documents(documents))
}

struct ApplyArguments<'a> {
    context: &'a CompilerContext,
    fragments: HashMap<String, AppliedFragment>,
    /// Applied fragment names in discovery order
    order: Vec<String>,
}

impl ApplyArguments<'_> {
    /// `None` when nothing is left after resolving conditions
    fn transform_selections(
        &mut self,
        scope: &Scope,
        selections: &[Selection],
    ) -> TransformResult<Option<Vec<Selection>>> {
        let mut next = Vec::with_capacity(selections.len());
        for selection in selections {
            match selection {
                Selection::ScalarField(field) => {
                    next.push(Selection::ScalarField(ScalarField {
                        alias: field.alias.clone(),
                        name: field.name.clone(),
                        definition: field.definition,
                        arguments: transform_arguments(scope, &field.arguments)?,
                        directives: transform_directives(scope, &field.directives)?,
                    }));
                }
                Selection::LinkedField(field) => {
                    if let Some(selections) = self.transform_selections(scope, &field.selections)? {
                        next.push(Selection::LinkedField(LinkedField {
                            alias: field.alias.clone(),
                            name: field.name.clone(),
                            definition: field.definition,
                            type_: field.type_.clone(),
                            arguments: transform_arguments(scope, &field.arguments)?,
                            directives: transform_directives(scope, &field.directives)?,
                            selections,
                        }));
                    }
                }
                Selection::InlineFragment(inline) => {
                    if let Some(selections) =
                        self.transform_selections(scope, &inline.selections)?
                    {
                        next.push(Selection::InlineFragment(InlineFragment {
                            type_condition: inline.type_condition,
                            directives: transform_directives(scope, &inline.directives)?,
                            selections,
                        }));
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if let Some(name) = self.transform_spread(scope, spread)? {
                        next.push(Selection::FragmentSpread(FragmentSpread {
                            fragment: name,
                            arguments: Vec::new(),
                            directives: transform_directives(scope, &spread.directives)?,
                        }));
                    }
                }
                Selection::Condition(condition) => {
                    next.extend(self.transform_condition(scope, condition)?);
                }
            }
        }
        Ok(if next.is_empty() { None } else { Some(next) })
    }

    fn transform_condition(
        &mut self,
        scope: &Scope,
        condition: &Condition,
    ) -> TransformResult<Vec<Selection>> {
        let value = match &condition.value {
            ConditionValue::Constant(value) => Value::Constant(ConstantValue::Boolean(*value)),
            ConditionValue::Variable(variable) => lookup(scope, &variable.name)?,
        };

        match value {
            // Literal conditions are inlined when they pass and dropped otherwise
            Value::Constant(value) => {
                if value != ConstantValue::Boolean(condition.passing_value) {
                    return Ok(Vec::new());
                }
                Ok(self
                    .transform_selections(scope, &condition.selections)?
                    .unwrap_or_default())
            }
            Value::Variable(variable) => {
                let Some(selections) = self.transform_selections(scope, &condition.selections)?
                else {
                    return Ok(Vec::new());
                };
                Ok(vec![Selection::Condition(Condition {
                    value: ConditionValue::Variable(variable),
                    passing_value: condition.passing_value,
                    selections,
                })])
            }
            Value::List(_) | Value::Object(_) => Err(TransformError::Invariant {
                transform: "apply_fragment_arguments",
                message: "Expected a condition to be a Boolean or a variable".to_string(),
            }),
        }
    }

    /// Name of the applied fragment, or `None` if it turned out empty
    fn transform_spread(
        &mut self,
        scope: &Scope,
        spread: &FragmentSpread,
    ) -> TransformResult<Option<String>> {
        let context = self.context;
        let fragment =
            context
                .get_fragment(&spread.fragment)
                .ok_or_else(|| TransformError::UnknownFragment {
                    name: spread.fragment.clone(),
                })?;

        let name = match hash_arguments(scope, &spread.arguments)? {
            Some(hash) => format!("{}_{}", fragment.name, hash),
            None => fragment.name.clone(),
        };

        match self.fragments.get(&name) {
            Some(AppliedFragment::Resolved(applied)) => {
                return Ok(applied.as_ref().map(|fragment| fragment.name.clone()))
            }
            Some(AppliedFragment::Pending) => {
                return Err(TransformError::CircularFragment {
                    fragment: fragment.name.clone(),
                })
            }
            None => {}
        }

        let fragment_scope = fragment_scope(fragment, &spread.arguments, scope)?;
        self.fragments.insert(name.clone(), AppliedFragment::Pending);
        self.order.push(name.clone());
        trace!(fragment = %fragment.name, applied = %name, "applying fragment arguments");

        let applied = match self.transform_selections(&fragment_scope, &fragment.selections)? {
            Some(selections) => Some(Fragment {
                name: name.clone(),
                type_condition: fragment.type_condition,
                variable_definitions: Vec::new(),
                used_global_variables: Vec::new(),
                directives: transform_directives(&fragment_scope, &fragment.directives)?,
                selections,
            }),
            None => None,
        };
        let result = applied.as_ref().map(|_| name.clone());
        self.fragments.insert(name, AppliedFragment::Resolved(applied));
        Ok(result)
    }
}

fn root_scope(definitions: &[VariableDefinition]) -> Scope {
    definitions
        .iter()
        .map(|definition| {
            (
                definition.name.clone(),
                Value::Variable(Variable {
                    name: definition.name.clone(),
                    type_: definition.type_.clone(),
                }),
            )
        })
        .collect()
}

/// Local arguments take the passed value or their default; globals come from
/// the enclosing scope
fn fragment_scope(
    fragment: &Fragment,
    arguments: &[Argument],
    parent: &Scope,
) -> TransformResult<Scope> {
    let mut scope = Scope::new();
    for definition in &fragment.variable_definitions {
        let value = match arguments.iter().find(|arg| arg.name == definition.name) {
            Some(arg) => resolve_value(parent, &arg.value)?,
            None => Value::Constant(
                definition
                    .default_value
                    .clone()
                    .unwrap_or(ConstantValue::Null),
            ),
        };
        scope.insert(definition.name.clone(), value);
    }
    for definition in &fragment.used_global_variables {
        scope.insert(definition.name.clone(), lookup(parent, &definition.name)?);
    }
    Ok(scope)
}

fn lookup(scope: &Scope, name: &str) -> TransformResult<Value> {
    scope
        .get(name)
        .cloned()
        .ok_or_else(|| TransformError::VariableNotInScope {
            name: name.to_string(),
        })
}

fn resolve_value(scope: &Scope, value: &Value) -> TransformResult<Value> {
    Ok(match value {
        Value::Constant(_) => value.clone(),
        Value::Variable(variable) => lookup(scope, &variable.name)?,
        Value::List(items) => Value::list(
            items
                .iter()
                .map(|item| resolve_value(scope, item))
                .collect::<TransformResult<_>>()?,
        ),
        Value::Object(fields) => Value::object(
            fields
                .iter()
                .map(|(name, value)| Ok((name.clone(), resolve_value(scope, value)?)))
                .collect::<TransformResult<_>>()?,
        ),
    })
}

fn transform_arguments(scope: &Scope, arguments: &[Argument]) -> TransformResult<Vec<Argument>> {
    arguments
        .iter()
        .map(|arg| {
            Ok(Argument {
                name: arg.name.clone(),
                value: resolve_value(scope, &arg.value)?,
            })
        })
        .collect()
}

fn transform_directives(
    scope: &Scope,
    directives: &[Directive],
) -> TransformResult<Vec<Directive>> {
    directives
        .iter()
        .map(|directive| {
            Ok(Directive {
                name: directive.name.clone(),
                arguments: transform_arguments(scope, &directive.arguments)?,
            })
        })
        .collect()
}

/// Stable hash of the resolved spread arguments, `None` without arguments
fn hash_arguments(scope: &Scope, arguments: &[Argument]) -> TransformResult<Option<String>> {
    if arguments.is_empty() {
        return Ok(None);
    }
    let mut sorted: Vec<&Argument> = arguments.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut key = String::new();
    for arg in sorted {
        let value = resolve_value(scope, &arg.value)?;
        key.push_str(&format!("{}:{};", arg.name, value));
    }
    Ok(Some(format!("{:x}", crc32fast::hash(key.as_bytes()))))
}
