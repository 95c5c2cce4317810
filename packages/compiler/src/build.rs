use crate::error::{CompileError, CompileResult};
use crate::ir::{
    Argument, Condition, ConditionValue, ConstantValue, Directive, ExecutableDefinition, Fragment,
    FragmentSpread, InlineFragment, LinkedField, Operation, ScalarField, Selection, Value,
    Variable, VariableDefinition,
};
use crate::schema::{CompilerSchema, TypeId, TypeReference};
use relay_repl_parser::ast::{self, Span};
use relay_repl_parser::parse_type;
use relay_repl_schema::TypeKind;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

const ARGUMENT_DEFINITIONS: &str = "argumentDefinitions";
const ARGUMENTS: &str = "arguments";

/// What a spread needs to know about a fragment before the fragment is lowered
struct FragmentSignature {
    type_condition: TypeId,
    arguments: Vec<VariableDefinition>,
}

/// Lower a parsed operation document into typed IR.
///
/// Definitions keep their document order.
#[instrument(skip_all, fields(definitions = document.definitions.len()))]
pub fn build_ir(
    schema: &CompilerSchema,
    document: &ast::Document,
) -> CompileResult<Vec<ExecutableDefinition>> {
    let signatures = collect_signatures(schema, document)?;

    let mut definitions = Vec::with_capacity(document.definitions.len());
    for definition in &document.definitions {
        let builder = Builder::new(schema, &signatures);
        definitions.push(match definition {
            ast::ExecutableDefinition::Operation(op) => {
                ExecutableDefinition::Operation(builder.build_operation(op)?)
            }
            ast::ExecutableDefinition::Fragment(fragment) => {
                ExecutableDefinition::Fragment(builder.build_fragment(fragment)?)
            }
        });
    }

    debug!(count = definitions.len(), "lowered document to IR");
    Ok(definitions)
}

fn collect_signatures<'a>(
    schema: &CompilerSchema,
    document: &'a ast::Document,
) -> CompileResult<HashMap<&'a str, FragmentSignature>> {
    let mut names = HashSet::new();
    let mut signatures = HashMap::new();

    for definition in &document.definitions {
        let (name, span) = match definition {
            ast::ExecutableDefinition::Operation(op) => match &op.name {
                Some(name) => (name.as_str(), op.span),
                None => {
                    return Err(CompileError::invalid(
                        op.span,
                        "Anonymous operations are not supported, give the operation a name",
                    ))
                }
            },
            ast::ExecutableDefinition::Fragment(fragment) => {
                (fragment.name.as_str(), fragment.span)
            }
        };
        if !names.insert(name) {
            return Err(CompileError::DuplicateDefinition {
                name: name.to_string(),
                span,
            });
        }

        if let ast::ExecutableDefinition::Fragment(fragment) = definition {
            let type_condition = schema
                .get_type(&fragment.type_condition)
                .ok_or_else(|| CompileError::unknown_type(&fragment.type_condition, span))?;
            if !schema.is_composite(type_condition) {
                return Err(CompileError::invalid(
                    span,
                    format!(
                        "Fragment '{}' cannot condition on non composite type '{}'",
                        fragment.name, fragment.type_condition
                    ),
                ));
            }
            let arguments = argument_definitions(schema, fragment)?;
            signatures.insert(
                name,
                FragmentSignature {
                    type_condition,
                    arguments,
                },
            );
        }
    }

    Ok(signatures)
}

/// Parse `@argumentDefinitions(name: {type: "T", defaultValue: v}, ...)`
fn argument_definitions(
    schema: &CompilerSchema,
    fragment: &ast::FragmentDefinition,
) -> CompileResult<Vec<VariableDefinition>> {
    let Some(directive) = fragment
        .directives
        .iter()
        .find(|d| d.name == ARGUMENT_DEFINITIONS)
    else {
        return Ok(Vec::new());
    };

    let mut definitions: Vec<VariableDefinition> = Vec::new();
    for arg in &directive.arguments {
        let ast::Value::Object(fields) = &arg.value else {
            return Err(CompileError::invalid(
                arg.span,
                format!(
                    "Expected @argumentDefinitions entry '{}' to be an object with a 'type'",
                    arg.name
                ),
            ));
        };

        let mut type_text = None;
        let mut default_value = None;
        for (key, value) in fields {
            match (key.as_str(), value) {
                ("type", ast::Value::String(text)) => type_text = Some(text),
                ("type", _) => {
                    return Err(CompileError::invalid(
                        arg.span,
                        format!("Expected the type of argument '{}' to be a string", arg.name),
                    ))
                }
                ("defaultValue", value) => default_value = Some(value),
                (other, _) => {
                    return Err(CompileError::invalid(
                        arg.span,
                        format!("Unexpected key '{}' in @argumentDefinitions", other),
                    ))
                }
            }
        }

        let text = type_text.ok_or_else(|| {
            CompileError::invalid(
                arg.span,
                format!("Missing 'type' for fragment argument '{}'", arg.name),
            )
        })?;
        let syntax = parse_type(text).map_err(|err| {
            CompileError::invalid(
                arg.span,
                format!("Invalid type '{}' for argument '{}': {}", text, arg.name, err),
            )
        })?;
        let type_ = schema
            .type_reference(&syntax)
            .ok_or_else(|| CompileError::unknown_type(syntax.inner_name(), arg.span))?;
        if !schema.kind(type_.inner()).is_input() {
            return Err(CompileError::invalid(
                arg.span,
                format!("Fragment argument '{}' cannot be of non-input type '{}'", arg.name, text),
            ));
        }
        if definitions.iter().any(|d| d.name == arg.name) {
            return Err(CompileError::invalid(
                arg.span,
                format!("Fragment argument '{}' is defined more than once", arg.name),
            ));
        }

        let default_value = default_value
            .map(|value| build_constant(schema, value, &type_, arg.span))
            .transpose()?;
        definitions.push(VariableDefinition {
            name: arg.name.clone(),
            type_,
            default_value,
        });
    }

    Ok(definitions)
}

/// Lowers one definition. Tracks declared variables and infers the types of
/// undeclared ones from their usages.
struct Builder<'a> {
    schema: &'a CompilerSchema,
    signatures: &'a HashMap<&'a str, FragmentSignature>,
    defined: Vec<VariableDefinition>,
    inferred: Vec<(String, TypeReference, Span)>,
}

impl<'a> Builder<'a> {
    fn new(
        schema: &'a CompilerSchema,
        signatures: &'a HashMap<&'a str, FragmentSignature>,
    ) -> Self {
        Self {
            schema,
            signatures,
            defined: Vec::new(),
            inferred: Vec::new(),
        }
    }

    fn build_operation(mut self, op: &ast::OperationDefinition) -> CompileResult<Operation> {
        let schema = self.schema;
        let name = op
            .name
            .clone()
            .ok_or_else(|| {
                CompileError::invalid(op.span, "Anonymous operations are not supported")
            })?;
        let type_ = schema.root_type(op.kind).ok_or_else(|| {
            CompileError::invalid(
                op.span,
                format!("Schema does not define a {} root type", op.kind),
            )
        })?;

        for definition in &op.variable_definitions {
            let type_ = schema.type_reference(&definition.type_).ok_or_else(|| {
                CompileError::unknown_type(definition.type_.inner_name(), definition.span)
            })?;
            if !schema.kind(type_.inner()).is_input() {
                return Err(CompileError::invalid(
                    definition.span,
                    format!(
                        "Variable '${}' cannot be of non-input type '{}'",
                        definition.name, definition.type_
                    ),
                ));
            }
            if self.defined.iter().any(|d| d.name == definition.name) {
                return Err(CompileError::invalid(
                    definition.span,
                    format!("Variable '${}' is defined more than once", definition.name),
                ));
            }
            let default_value = definition
                .default_value
                .as_ref()
                .map(|value| build_constant(schema, value, &type_, definition.span))
                .transpose()?;
            self.defined.push(VariableDefinition {
                name: definition.name.clone(),
                type_,
                default_value,
            });
        }

        let directives = self.build_directives(&op.directives)?;
        let selections = self.build_selections(type_, &op.selection_set)?;

        if let Some((variable, _, span)) = self.inferred.first() {
            return Err(CompileError::UndefinedVariable {
                name: variable.clone(),
                operation: name,
                span: *span,
            });
        }

        Ok(Operation {
            name,
            kind: op.kind,
            type_,
            variable_definitions: self.defined,
            directives,
            selections,
        })
    }

    fn build_fragment(mut self, fragment: &ast::FragmentDefinition) -> CompileResult<Fragment> {
        let signatures = self.signatures;
        let signature =
            signatures
                .get(fragment.name.as_str())
                .ok_or_else(|| CompileError::UnknownFragment {
                    name: fragment.name.clone(),
                    span: fragment.span,
                })?;
        self.defined = signature.arguments.clone();

        let directives = self.build_directives(&fragment.directives)?;
        let selections = self.build_selections(signature.type_condition, &fragment.selection_set)?;

        let used_global_variables = self
            .inferred
            .into_iter()
            .map(|(name, type_, _)| VariableDefinition {
                name,
                type_,
                default_value: None,
            })
            .collect();

        Ok(Fragment {
            name: fragment.name.clone(),
            type_condition: signature.type_condition,
            variable_definitions: self.defined,
            used_global_variables,
            directives,
            selections,
        })
    }

    fn build_selections(
        &mut self,
        parent: TypeId,
        selection_set: &ast::SelectionSet,
    ) -> CompileResult<Vec<Selection>> {
        selection_set
            .items
            .iter()
            .map(|item| self.build_selection(parent, item))
            .collect()
    }

    fn build_selection(
        &mut self,
        parent: TypeId,
        selection: &ast::Selection,
    ) -> CompileResult<Selection> {
        let (built, directives) = match selection {
            ast::Selection::Field(field) => (self.build_field(parent, field)?, &field.directives),
            ast::Selection::FragmentSpread(spread) => {
                (self.build_spread(parent, spread)?, &spread.directives)
            }
            ast::Selection::InlineFragment(inline) => {
                (self.build_inline_fragment(parent, inline)?, &inline.directives)
            }
        };

        // The first condition ends up innermost
        let conditions = self.build_conditions(directives)?;
        Ok(conditions
            .into_iter()
            .fold(built, |inner, (value, passing_value)| {
                Selection::Condition(Condition {
                    value,
                    passing_value,
                    selections: vec![inner],
                })
            }))
    }

    fn build_field(&mut self, parent: TypeId, field: &ast::Field) -> CompileResult<Selection> {
        let schema = self.schema;
        let definition =
            schema
                .named_field(parent, &field.name)
                .ok_or_else(|| CompileError::UnknownField {
                    parent: schema.type_name(parent).to_string(),
                    field: field.name.clone(),
                    span: field.span,
                })?;
        let info = schema.field(definition);

        let owner = format!("field '{}.{}'", schema.type_name(parent), field.name);
        let arguments = self.build_arguments(&field.arguments, &owner, |name| {
            info.argument(name).map(|arg| &arg.type_)
        })?;
        let directives = self.build_directives(&field.directives)?;
        let alias = field.alias.clone().filter(|alias| *alias != field.name);
        let type_ = info.type_.clone();
        let is_composite = schema.is_composite(type_.inner());

        match &field.selection_set {
            None if is_composite => Err(CompileError::invalid(
                field.span,
                format!(
                    "Expected at least one selection for non-scalar field '{}' on type '{}'",
                    field.name,
                    schema.display_type(&type_)
                ),
            )),
            None => Ok(Selection::ScalarField(ScalarField {
                alias,
                name: field.name.clone(),
                definition,
                arguments,
                directives,
            })),
            Some(selection_set) if !is_composite => Err(CompileError::invalid(
                selection_set.span,
                format!(
                    "Expected no selections for scalar field '{}' on type '{}'",
                    field.name,
                    schema.display_type(&type_)
                ),
            )),
            Some(selection_set) => {
                let selections = self.build_selections(type_.inner(), selection_set)?;
                Ok(Selection::LinkedField(LinkedField {
                    alias,
                    name: field.name.clone(),
                    definition,
                    type_,
                    arguments,
                    directives,
                    selections,
                }))
            }
        }
    }

    fn build_spread(
        &mut self,
        parent: TypeId,
        spread: &ast::FragmentSpread,
    ) -> CompileResult<Selection> {
        let schema = self.schema;
        let signatures = self.signatures;
        let name = &spread.fragment_name;
        let signature =
            signatures
                .get(name.as_str())
                .ok_or_else(|| CompileError::UnknownFragment {
                    name: name.clone(),
                    span: spread.span,
                })?;

        if !schema.types_overlap(parent, signature.type_condition) {
            return Err(CompileError::invalid(
                spread.span,
                format!(
                    "Fragment '{}' cannot be spread here as objects of type '{}' can never be of type '{}'",
                    name,
                    schema.type_name(parent),
                    schema.type_name(signature.type_condition)
                ),
            ));
        }

        let owner = format!("fragment '{}'", name);
        let mut arguments = Vec::new();
        for directive in spread.directives.iter().filter(|d| d.name == ARGUMENTS) {
            let built = self.build_arguments(&directive.arguments, &owner, |arg| {
                signature
                    .arguments
                    .iter()
                    .find(|definition| definition.name == arg)
                    .map(|definition| &definition.type_)
            })?;
            arguments.extend(built);
        }

        let directives = self.build_directives(&spread.directives)?;
        Ok(Selection::FragmentSpread(FragmentSpread {
            fragment: name.clone(),
            arguments,
            directives,
        }))
    }

    fn build_inline_fragment(
        &mut self,
        parent: TypeId,
        inline: &ast::InlineFragment,
    ) -> CompileResult<Selection> {
        let schema = self.schema;
        let type_condition = match &inline.type_condition {
            None => parent,
            Some(name) => {
                let id = schema
                    .get_type(name)
                    .ok_or_else(|| CompileError::unknown_type(name, inline.span))?;
                if !schema.is_composite(id) {
                    return Err(CompileError::invalid(
                        inline.span,
                        format!(
                            "Inline fragment cannot condition on non composite type '{}'",
                            name
                        ),
                    ));
                }
                if !schema.types_overlap(parent, id) {
                    return Err(CompileError::invalid(
                        inline.span,
                        format!(
                            "Inline fragment on '{}' cannot be spread within type '{}'",
                            name,
                            schema.type_name(parent)
                        ),
                    ));
                }
                id
            }
        };

        let directives = self.build_directives(&inline.directives)?;
        let selections = self.build_selections(type_condition, &inline.selection_set)?;
        Ok(Selection::InlineFragment(InlineFragment {
            type_condition,
            directives,
            selections,
        }))
    }

    /// Lower arguments, typing each one through `lookup`
    fn build_arguments<'t>(
        &mut self,
        arguments: &[ast::Argument],
        owner: &str,
        lookup: impl Fn(&str) -> Option<&'t TypeReference>,
    ) -> CompileResult<Vec<Argument>> {
        let mut built: Vec<Argument> = Vec::with_capacity(arguments.len());
        for arg in arguments {
            let type_ = lookup(&arg.name)
                .ok_or_else(|| CompileError::unknown_argument(owner, &arg.name, arg.span))?;
            if built.iter().any(|b| b.name == arg.name) {
                return Err(CompileError::invalid(
                    arg.span,
                    format!("Argument '{}' on {} is passed more than once", arg.name, owner),
                ));
            }
            built.push(Argument {
                name: arg.name.clone(),
                value: self.build_value(&arg.value, type_, arg.span)?,
            });
        }
        Ok(built)
    }

    /// Directives other than conditions and the fragment-argument directives
    fn build_directives(&mut self, directives: &[ast::Directive]) -> CompileResult<Vec<Directive>> {
        let schema = self.schema;
        let mut built = Vec::new();
        for directive in directives {
            if matches!(
                directive.name.as_str(),
                "include" | "skip" | ARGUMENTS | ARGUMENT_DEFINITIONS
            ) {
                continue;
            }
            let definition =
                schema
                    .directive(&directive.name)
                    .ok_or_else(|| CompileError::UnknownDirective {
                        name: directive.name.clone(),
                        span: directive.span,
                    })?;
            let owner = format!("directive '@{}'", directive.name);
            let arguments = self.build_arguments(&directive.arguments, &owner, |name| {
                definition.argument(name).map(|arg| &arg.type_)
            })?;
            built.push(Directive {
                name: directive.name.clone(),
                arguments,
            });
        }
        Ok(built)
    }

    /// `@include` / `@skip` as `(value, passing_value)`, literals first and
    /// then variables by name
    fn build_conditions(
        &mut self,
        directives: &[ast::Directive],
    ) -> CompileResult<Vec<(ConditionValue, bool)>> {
        let mut conditions = Vec::new();
        for directive in directives {
            let passing_value = match directive.name.as_str() {
                "include" => true,
                "skip" => false,
                _ => continue,
            };
            let arg = match directive.arguments.as_slice() {
                [arg] if arg.name == "if" => arg,
                _ => {
                    return Err(CompileError::invalid(
                        directive.span,
                        format!(
                            "Expected @{} to have a single argument named 'if'",
                            directive.name
                        ),
                    ))
                }
            };
            let value = match &arg.value {
                ast::Value::Boolean(value) => ConditionValue::Constant(*value),
                ast::Value::Variable(name) => {
                    let boolean = self.boolean_type(arg.span)?;
                    self.use_variable(name, &boolean, arg.span)?;
                    ConditionValue::Variable(Variable {
                        name: name.clone(),
                        type_: boolean,
                    })
                }
                other => {
                    return Err(CompileError::invalid(
                        arg.span,
                        format!(
                            "Expected @{}(if: ...) to be a variable or a Boolean literal, found {}",
                            directive.name, other
                        ),
                    ))
                }
            };
            conditions.push((value, passing_value));
        }

        conditions.sort_by(|(a, _), (b, _)| match (a, b) {
            (ConditionValue::Variable(a), ConditionValue::Variable(b)) => a.name.cmp(&b.name),
            (ConditionValue::Variable(_), ConditionValue::Constant(_)) => Ordering::Greater,
            (ConditionValue::Constant(_), ConditionValue::Variable(_)) => Ordering::Less,
            _ => Ordering::Equal,
        });
        Ok(conditions)
    }

    fn boolean_type(&self, span: Span) -> CompileResult<TypeReference> {
        let boolean = self
            .schema
            .get_type("Boolean")
            .ok_or_else(|| CompileError::unknown_type("Boolean", span))?;
        Ok(TypeReference::Named(boolean).non_null())
    }

    fn build_value(
        &mut self,
        value: &ast::Value,
        expected: &TypeReference,
        span: Span,
    ) -> CompileResult<Value> {
        let schema = self.schema;
        if value.is_const() {
            return build_constant(schema, value, expected, span).map(Value::Constant);
        }

        match value {
            ast::Value::Variable(name) => {
                self.use_variable(name, expected, span)?;
                Ok(Value::Variable(Variable {
                    name: name.clone(),
                    type_: expected.clone(),
                }))
            }
            ast::Value::List(items) => {
                let item_type = expected.list_item().ok_or_else(|| {
                    CompileError::invalid(
                        span,
                        format!(
                            "Expected a value of type '{}', found a list",
                            schema.display_type(expected)
                        ),
                    )
                })?;
                let items = items
                    .iter()
                    .map(|item| self.build_value(item, item_type, span))
                    .collect::<CompileResult<Vec<_>>>()?;
                Ok(Value::list(items))
            }
            ast::Value::Object(fields) => {
                if let Some(item_type) = expected.list_item() {
                    return self.build_value(value, item_type, span);
                }
                let input = expected.inner();
                if schema.kind(input) != TypeKind::InputObject {
                    return Err(CompileError::invalid(
                        span,
                        format!(
                            "Expected a value of type '{}', found an object",
                            schema.display_type(expected)
                        ),
                    ));
                }
                let mut built = Vec::with_capacity(fields.len());
                for (name, field_value) in fields {
                    let field = schema.input_field(input, name).ok_or_else(|| {
                        CompileError::unknown_argument(
                            format!("input type '{}'", schema.type_name(input)),
                            name,
                            span,
                        )
                    })?;
                    built.push((name.clone(), self.build_value(field_value, &field.type_, span)?));
                }
                Ok(Value::object(built))
            }
            other => build_constant(schema, other, expected, span).map(Value::Constant),
        }
    }

    /// Record a variable usage at a location of type `used_as`
    fn use_variable(
        &mut self,
        name: &str,
        used_as: &TypeReference,
        span: Span,
    ) -> CompileResult<()> {
        let schema = self.schema;

        if let Some(definition) = self.defined.iter().find(|d| d.name == name) {
            // A default makes the variable effectively non-null
            let effective = match &definition.default_value {
                Some(value) if *value != ConstantValue::Null => {
                    definition.type_.nullable().clone().non_null()
                }
                _ => definition.type_.clone(),
            };
            if !schema.is_type_subtype_of(&effective, used_as) {
                return Err(CompileError::invalid(
                    span,
                    format!(
                        "Variable '${}' was defined as type '{}' but used in a location expecting the type '{}'",
                        name,
                        schema.display_type(&definition.type_),
                        schema.display_type(used_as)
                    ),
                ));
            }
            return Ok(());
        }

        match self.inferred.iter_mut().find(|(n, _, _)| n == name) {
            None => self
                .inferred
                .push((name.to_string(), used_as.clone(), span)),
            Some((_, previous, _)) => {
                let narrower = schema.is_type_subtype_of(used_as, previous);
                if !narrower && !schema.is_type_subtype_of(previous, used_as) {
                    return Err(CompileError::invalid(
                        span,
                        format!(
                            "Variable '${}' was used in locations expecting the conflicting types '{}' and '{}'",
                            name,
                            schema.display_type(previous),
                            schema.display_type(used_as)
                        ),
                    ));
                }
                if narrower {
                    *previous = used_as.clone();
                }
            }
        }
        Ok(())
    }
}

/// Lower a literal that may not contain variables, checking it against `expected`
fn build_constant(
    schema: &CompilerSchema,
    value: &ast::Value,
    expected: &TypeReference,
    span: Span,
) -> CompileResult<ConstantValue> {
    let mismatch = || {
        CompileError::invalid(
            span,
            format!(
                "Expected a value of type '{}', found {}",
                schema.display_type(expected),
                value
            ),
        )
    };

    match value {
        ast::Value::Variable(name) => {
            return Err(CompileError::invalid(
                span,
                format!("Variable '${}' cannot be used in a constant value", name),
            ))
        }
        ast::Value::Null if expected.is_non_null() => return Err(mismatch()),
        ast::Value::Null => return Ok(ConstantValue::Null),
        _ => {}
    }

    if let Some(item_type) = expected.list_item() {
        return match value {
            ast::Value::List(items) => items
                .iter()
                .map(|item| build_constant(schema, item, item_type, span))
                .collect::<CompileResult<Vec<_>>>()
                .map(ConstantValue::List),
            // A single item is accepted where a list is expected
            other => build_constant(schema, other, item_type, span),
        };
    }

    let id = expected.inner();
    match schema.kind(id) {
        TypeKind::InputObject => {
            let ast::Value::Object(fields) = value else {
                return Err(mismatch());
            };
            let mut built = Vec::with_capacity(fields.len());
            for (name, field_value) in fields {
                let field = schema.input_field(id, name).ok_or_else(|| {
                    CompileError::unknown_argument(
                        format!("input type '{}'", schema.type_name(id)),
                        name,
                        span,
                    )
                })?;
                let value = build_constant(schema, field_value, &field.type_, span)?;
                built.push((name.clone(), value));
            }
            Ok(ConstantValue::Object(built))
        }
        TypeKind::Enum => match value {
            ast::Value::Enum(name) if schema.has_enum_value(id, name) => {
                Ok(ConstantValue::Enum(name.clone()))
            }
            _ => Err(mismatch()),
        },
        TypeKind::Scalar => scalar_literal(schema.type_name(id), value).ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

fn scalar_literal(type_name: &str, value: &ast::Value) -> Option<ConstantValue> {
    use ast::Value as V;
    match (type_name, value) {
        ("Int" | "Float" | "ID", V::Int(n)) => Some(ConstantValue::Int(n.clone())),
        ("Float", V::Float(n)) => Some(ConstantValue::Float(n.clone())),
        ("String" | "ID", V::String(s)) => Some(ConstantValue::String(s.clone())),
        ("Boolean", V::Boolean(b)) => Some(ConstantValue::Boolean(*b)),
        ("Int" | "Float" | "String" | "Boolean" | "ID", _) => None,
        // Custom scalars accept any literal
        (_, other) => untyped_constant(other),
    }
}

fn untyped_constant(value: &ast::Value) -> Option<ConstantValue> {
    Some(match value {
        ast::Value::Variable(_) => return None,
        ast::Value::Int(n) => ConstantValue::Int(n.clone()),
        ast::Value::Float(n) => ConstantValue::Float(n.clone()),
        ast::Value::String(s) => ConstantValue::String(s.clone()),
        ast::Value::Boolean(b) => ConstantValue::Boolean(*b),
        ast::Value::Null => ConstantValue::Null,
        ast::Value::Enum(name) => ConstantValue::Enum(name.clone()),
        ast::Value::List(items) => {
            ConstantValue::List(items.iter().map(untyped_constant).collect::<Option<_>>()?)
        }
        ast::Value::Object(fields) => ConstantValue::Object(
            fields
                .iter()
                .map(|(name, value)| untyped_constant(value).map(|v| (name.clone(), v)))
                .collect::<Option<_>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_repl_parser::parse_document;

    const SDL: &str = r#"
        type Query {
          hero(episode: Episode): Character
          human(id: ID!): Human
          search(text: String!, first: Int = 10): [SearchResult]
        }
        enum Episode { NEWHOPE EMPIRE JEDI }
        interface Character { id: ID! name: String! friends: [Character] }
        type Human implements Character {
          id: ID! name: String! friends: [Character] height(unit: String): Float
        }
        type Droid implements Character { id: ID! name: String! friends: [Character] }
        type Starship { id: ID! name: String! }
        union SearchResult = Human | Droid | Starship
    "#;

    fn lower(source: &str) -> CompileResult<Vec<ExecutableDefinition>> {
        let schema = CompilerSchema::parse(SDL).expect("schema");
        let document = parse_document(source).expect("parse");
        build_ir(&schema, &document)
    }

    fn operation(definitions: &[ExecutableDefinition]) -> &Operation {
        definitions
            .iter()
            .find_map(|d| match d {
                ExecutableDefinition::Operation(op) => Some(op),
                _ => None,
            })
            .expect("operation")
    }

    #[test]
    fn test_lowers_fields_and_aliases() {
        let definitions =
            lower("query Q { hero(episode: JEDI) { id name: name twin: name } }").expect("lower");
        let op = operation(&definitions);
        let Selection::LinkedField(hero) = &op.selections[0] else {
            panic!("expected linked field");
        };
        assert_eq!(hero.arguments[0].value.to_string(), "JEDI");
        let aliases: Vec<_> = hero
            .selections
            .iter()
            .map(|s| match s {
                Selection::ScalarField(f) => f.alias.clone(),
                _ => panic!("expected scalar"),
            })
            .collect();
        assert_eq!(aliases, vec![None, None, Some("twin".to_string())]);
    }

    #[test]
    fn test_include_and_skip_become_conditions() {
        let definitions = lower(
            "query Q($a: Boolean!, $b: Boolean!) { hero { name @skip(if: $b) @include(if: $a) id @include(if: true) } }",
        )
        .expect("lower");
        let op = operation(&definitions);
        let Selection::LinkedField(hero) = &op.selections[0] else {
            panic!("expected linked field");
        };

        // Sorted by variable name, the first condition is innermost
        let Selection::Condition(outer) = &hero.selections[0] else {
            panic!("expected condition");
        };
        assert!(!outer.passing_value);
        assert!(matches!(&outer.value, ConditionValue::Variable(v) if v.name == "b"));
        let Selection::Condition(inner) = &outer.selections[0] else {
            panic!("expected nested condition");
        };
        assert!(inner.passing_value);
        assert!(matches!(inner.selections[0], Selection::ScalarField(_)));

        let Selection::Condition(literal) = &hero.selections[1] else {
            panic!("expected condition");
        };
        assert_eq!(literal.value, ConditionValue::Constant(true));
    }

    #[test]
    fn test_fragment_arguments_and_inferred_globals() {
        let definitions = lower(
            r#"
            fragment F on Human @argumentDefinitions(unit: {type: "String", defaultValue: "METER"}) {
              height(unit: $unit)
              friends @include(if: $withFriends) { id }
            }
            query Q($withFriends: Boolean!) { human(id: "1") { ...F @arguments(unit: "FOOT") } }
            "#,
        )
        .expect("lower");

        let ExecutableDefinition::Fragment(fragment) = &definitions[0] else {
            panic!("expected fragment");
        };
        assert_eq!(fragment.variable_definitions.len(), 1);
        assert_eq!(
            fragment.variable_definitions[0].default_value,
            Some(ConstantValue::String("METER".to_string()))
        );
        assert_eq!(fragment.used_global_variables.len(), 1);
        assert_eq!(fragment.used_global_variables[0].name, "withFriends");

        let op = operation(&definitions);
        let Selection::LinkedField(human) = &op.selections[0] else {
            panic!("expected linked field");
        };
        let Selection::FragmentSpread(spread) = &human.selections[0] else {
            panic!("expected spread");
        };
        assert_eq!(spread.arguments[0].value.to_string(), "\"FOOT\"");
        assert!(spread.directives.is_empty());
    }

    #[test]
    fn test_undefined_operation_variable() {
        let err = lower("query Q { hero(episode: $episode) { id } }").unwrap_err();
        assert!(matches!(
            err,
            CompileError::UndefinedVariable { ref name, ref operation, .. }
                if name == "episode" && operation == "Q"
        ));
    }

    #[test]
    fn test_variable_type_mismatch() {
        let err = lower("query Q($id: String) { human(id: $id) { id } }").unwrap_err();
        assert!(err.to_string().contains("used in a location expecting the type 'ID!'"));

        // A default value makes a nullable variable acceptable
        assert!(lower("query Q($id: ID = \"1\") { human(id: $id) { id } }").is_ok());
    }

    #[test]
    fn test_literal_type_checks() {
        assert!(lower("query Q { hero(episode: SITH) { id } }").is_err());
        assert!(lower("query Q { human(id: 4) { id } }").is_ok());
        assert!(lower("query Q { search(text: 4) { __typename } }").is_err());
        assert!(lower("query Q { human(id: null) { id } }").is_err());
    }

    #[test]
    fn test_rejects_unknown_names() {
        assert!(matches!(
            lower("query Q { villain { id } }"),
            Err(CompileError::UnknownField { .. })
        ));
        assert!(matches!(
            lower("query Q { human(name: \"x\") { id } }"),
            Err(CompileError::UnknownArgument { .. })
        ));
        assert!(matches!(
            lower("query Q { hero { ...Missing } }"),
            Err(CompileError::UnknownFragment { .. })
        ));
        assert!(matches!(
            lower("query Q { hero @cached { id } }"),
            Err(CompileError::UnknownDirective { .. })
        ));
        assert!(matches!(
            lower("query Q { hero { ... on Alien { id } } }"),
            Err(CompileError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_rejects_structural_errors() {
        assert!(lower("{ hero { id } }").is_err());
        assert!(lower("query Q { hero }").is_err());
        assert!(lower("query Q { hero { id { x } } }").is_err());
        assert!(lower("mutation M { hero { id } }").is_err());
        assert!(matches!(
            lower("query Q { hero { id } } query Q { hero { name } }"),
            Err(CompileError::DuplicateDefinition { .. })
        ));
        assert!(lower("fragment S on Starship { id } query Q { hero { ...S } }").is_err());
    }

    #[test]
    fn test_relay_client_directives_are_accepted() {
        let definitions =
            lower("query Q { hero { friends @connection(key: \"Hero_friends\") { id } } }")
                .expect("lower");
        let op = operation(&definitions);
        let Selection::LinkedField(hero) = &op.selections[0] else {
            panic!("expected linked field");
        };
        let Selection::LinkedField(friends) = &hero.selections[0] else {
            panic!("expected linked field");
        };
        assert_eq!(friends.directives[0].name, "connection");
    }

    #[test]
    fn test_malformed_argument_definitions() {
        assert!(lower("fragment F on Human @argumentDefinitions(a: \"Int\") { id } query Q { human(id: 1) { ...F } }").is_err());
        assert!(lower("fragment F on Human @argumentDefinitions(a: {type: \"Nope\"}) { id } query Q { human(id: 1) { ...F } }").is_err());
        assert!(lower("fragment F on Human { id } query Q { human(id: 1) { ...F @arguments(a: 1) } }").is_err());
    }
}
