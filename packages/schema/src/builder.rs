use crate::error::{SchemaError, SchemaResult};
use crate::schema::*;
use relay_repl_parser::ast::{
    self, OperationKind, SchemaDefinition, SchemaDocument, Span, TypeDefinition,
    TypeDefinitionKind, TypeSystemDefinition, Value,
};
use relay_repl_parser::parse_schema;
use std::collections::{HashMap, HashSet};
use tracing::debug;

const BUILTIN_DIRECTIVES: &str = r#"
    "Directs the executor to include this field or fragment only when the `if` argument is true."
    directive @include(if: Boolean!) on FIELD | FRAGMENT_SPREAD | INLINE_FRAGMENT

    "Directs the executor to skip this field or fragment when the `if` argument is true."
    directive @skip(if: Boolean!) on FIELD | FRAGMENT_SPREAD | INLINE_FRAGMENT

    "Marks an element of a GraphQL schema as no longer supported."
    directive @deprecated(reason: String = "No longer supported")
      on FIELD_DEFINITION | ARGUMENT_DEFINITION | INPUT_FIELD_DEFINITION | ENUM_VALUE

    "Exposes a URL that specifies the behaviour of this scalar."
    directive @specifiedBy(url: String!) on SCALAR
"#;

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// Parse SDL text and build a validated [`Schema`]
pub fn build_schema(source: &str) -> SchemaResult<Schema> {
    let document = parse_schema(source)?;
    build_schema_from_document(&document)
}

/// Build a validated [`Schema`] from an already parsed SDL document
pub fn build_schema_from_document(document: &SchemaDocument) -> SchemaResult<Schema> {
    let mut builder = SchemaBuilder::new()?;
    let mut schema_definition: Option<&SchemaDefinition> = None;
    let mut extensions = Vec::new();

    for definition in &document.definitions {
        match definition {
            TypeSystemDefinition::Schema(def) => {
                if schema_definition.is_some() {
                    return Err(SchemaError::invalid(
                        def.span,
                        "Must provide only one schema definition",
                    ));
                }
                schema_definition = Some(def);
            }
            TypeSystemDefinition::Type(def) => builder.add_type(def)?,
            TypeSystemDefinition::TypeExtension(def) => extensions.push(def),
            TypeSystemDefinition::Directive(def) => builder.add_directive(def)?,
        }
    }

    // Extensions may precede the type they extend
    for extension in extensions {
        builder.extend_type(extension)?;
    }

    let schema = builder.finish(schema_definition)?;
    validate_schema(&schema)?;

    debug!(
        types = schema.types().count(),
        directives = schema.directives().len(),
        "built schema"
    );
    Ok(schema)
}

struct SchemaBuilder {
    types: Vec<NamedType>,
    index: HashMap<String, usize>,
    directives: Vec<DirectiveDefinition>,
    user_directives: HashSet<String>,
}

impl SchemaBuilder {
    fn new() -> SchemaResult<Self> {
        let mut builder = Self {
            types: Vec::new(),
            index: HashMap::new(),
            directives: Vec::new(),
            user_directives: HashSet::new(),
        };

        for name in BUILTIN_SCALARS {
            builder.push_type(NamedType::new(*name, TypeKind::Scalar, None));
        }

        for definition in parse_schema(BUILTIN_DIRECTIVES)?.definitions {
            if let TypeSystemDefinition::Directive(def) = definition {
                let mut directive = directive_definition(&def);
                directive.span = None;
                builder.directives.push(directive);
            }
        }

        Ok(builder)
    }

    fn push_type(&mut self, ty: NamedType) {
        self.index.insert(ty.name.clone(), self.types.len());
        self.types.push(ty);
    }

    fn add_type(&mut self, def: &TypeDefinition) -> SchemaResult<()> {
        if let Some(&existing) = self.index.get(&def.name) {
            let existing = &self.types[existing];
            // Redeclaring a built-in scalar is allowed
            if existing.span.is_none() && matches!(def.kind, TypeDefinitionKind::Scalar) {
                return Ok(());
            }
            return Err(SchemaError::duplicate_type(&def.name, def.span));
        }

        let mut ty = NamedType::new(&def.name, type_kind(&def.kind), Some(def.span));
        ty.description = def.description.clone();
        merge_definition(&mut ty, &def.kind);
        self.push_type(ty);
        Ok(())
    }

    fn extend_type(&mut self, def: &TypeDefinition) -> SchemaResult<()> {
        let Some(&index) = self.index.get(&def.name) else {
            return Err(SchemaError::InvalidExtension {
                name: def.name.clone(),
                reason: "the type is not defined".to_string(),
                span: def.span,
            });
        };

        let ty = &mut self.types[index];
        let kind = type_kind(&def.kind);
        if ty.kind != kind {
            return Err(SchemaError::InvalidExtension {
                name: def.name.clone(),
                reason: format!(
                    "it is a {} and cannot be extended with '{}'",
                    ty.kind.as_str(),
                    kind.as_str()
                ),
                span: def.span,
            });
        }

        merge_definition(ty, &def.kind);
        Ok(())
    }

    fn add_directive(&mut self, def: &ast::DirectiveDefinition) -> SchemaResult<()> {
        if !self.user_directives.insert(def.name.clone()) {
            return Err(SchemaError::invalid(
                def.span,
                format!("Directive \"@{}\" is defined more than once", def.name),
            ));
        }

        // User definitions replace built-ins of the same name
        self.directives.retain(|d| d.name != def.name);
        self.directives.push(directive_definition(def));
        Ok(())
    }

    fn finish(self, schema_definition: Option<&SchemaDefinition>) -> SchemaResult<Schema> {
        let mut roots: [Option<usize>; 3] = [None, None, None];

        match schema_definition {
            Some(def) => {
                for operation in &def.operation_types {
                    let slot = &mut roots[root_slot(operation.kind)];
                    if slot.is_some() {
                        return Err(SchemaError::invalid(
                            operation.span,
                            format!("There can be only one {} type in schema", operation.kind),
                        ));
                    }
                    let index = self
                        .index
                        .get(&operation.type_name)
                        .copied()
                        .ok_or_else(|| {
                            SchemaError::unknown_type(&operation.type_name, operation.span)
                        })?;
                    *slot = Some(index);
                }
            }
            None => {
                for (kind, name) in [
                    (OperationKind::Query, "Query"),
                    (OperationKind::Mutation, "Mutation"),
                    (OperationKind::Subscription, "Subscription"),
                ] {
                    roots[root_slot(kind)] = self.index.get(name).copied();
                }
            }
        }

        for (kind, root) in [
            OperationKind::Query,
            OperationKind::Mutation,
            OperationKind::Subscription,
        ]
        .into_iter()
        .zip(roots)
        {
            if let Some(index) = root {
                let ty = &self.types[index];
                if ty.kind != TypeKind::Object {
                    return Err(SchemaError::invalid(
                        ty.span.unwrap_or_default(),
                        format!(
                            "{} root type must be an object type, it cannot be \"{}\"",
                            kind, ty.name
                        ),
                    ));
                }
            }
        }

        let [query, mutation, subscription] = roots;
        let query = query.ok_or_else(|| {
            SchemaError::invalid(
                schema_definition.map(|def| def.span).unwrap_or_default(),
                "Schema does not define a query root type",
            )
        })?;

        Ok(Schema::new(
            self.types,
            query,
            mutation,
            subscription,
            self.directives,
        ))
    }
}

fn root_slot(kind: OperationKind) -> usize {
    match kind {
        OperationKind::Query => 0,
        OperationKind::Mutation => 1,
        OperationKind::Subscription => 2,
    }
}

fn type_kind(kind: &TypeDefinitionKind) -> TypeKind {
    match kind {
        TypeDefinitionKind::Scalar => TypeKind::Scalar,
        TypeDefinitionKind::Object { .. } => TypeKind::Object,
        TypeDefinitionKind::Interface { .. } => TypeKind::Interface,
        TypeDefinitionKind::Union { .. } => TypeKind::Union,
        TypeDefinitionKind::Enum { .. } => TypeKind::Enum,
        TypeDefinitionKind::InputObject { .. } => TypeKind::InputObject,
    }
}

/// Append the members of a definition or extension to `ty`
fn merge_definition(ty: &mut NamedType, kind: &TypeDefinitionKind) {
    match kind {
        TypeDefinitionKind::Scalar => {}
        TypeDefinitionKind::Object { interfaces, fields }
        | TypeDefinitionKind::Interface { interfaces, fields } => {
            ty.interfaces.extend(interfaces.iter().cloned());
            ty.fields.extend(fields.iter().map(field_definition));
        }
        TypeDefinitionKind::Union { members } => {
            ty.members.extend(members.iter().cloned());
        }
        TypeDefinitionKind::Enum { values } => {
            ty.enum_values.extend(values.iter().map(|value| EnumValue {
                name: value.name.clone(),
                description: value.description.clone(),
                deprecation_reason: deprecation_reason(&value.directives),
            }));
        }
        TypeDefinitionKind::InputObject { fields } => {
            ty.input_fields.extend(fields.iter().map(input_value));
        }
    }
}

fn field_definition(def: &ast::FieldDefinition) -> FieldDefinition {
    FieldDefinition {
        name: def.name.clone(),
        description: def.description.clone(),
        arguments: def.arguments.iter().map(input_value).collect(),
        type_: def.type_.clone(),
        deprecation_reason: deprecation_reason(&def.directives),
        span: Some(def.span),
    }
}

fn input_value(def: &ast::InputValueDefinition) -> InputValue {
    InputValue {
        name: def.name.clone(),
        description: def.description.clone(),
        type_: def.type_.clone(),
        default_value: def.default_value.clone(),
        span: Some(def.span),
    }
}

fn directive_definition(def: &ast::DirectiveDefinition) -> DirectiveDefinition {
    DirectiveDefinition {
        name: def.name.clone(),
        description: def.description.clone(),
        arguments: def.arguments.iter().map(input_value).collect(),
        locations: def.locations.clone(),
        repeatable: def.repeatable,
        span: Some(def.span),
    }
}

fn deprecation_reason(directives: &[ast::Directive]) -> Option<String> {
    let directive = directives.iter().find(|d| d.name == "deprecated")?;
    match directive.argument("reason").map(|arg| &arg.value) {
        Some(Value::String(reason)) => Some(reason.clone()),
        _ => Some(DEFAULT_DEPRECATION_REASON.to_string()),
    }
}

// ----------------------------------------------------------------------------
// Validation
// ----------------------------------------------------------------------------

fn validate_schema(schema: &Schema) -> SchemaResult<()> {
    for ty in schema.types() {
        validate_type(schema, ty)?;
    }

    for directive in schema.directives() {
        let span = directive.span.unwrap_or_default();
        validate_arguments(
            schema,
            &format!("@{}", directive.name),
            &directive.arguments,
            span,
        )?;
    }

    Ok(())
}

fn validate_type(schema: &Schema, ty: &NamedType) -> SchemaResult<()> {
    let span = ty.span.unwrap_or_default();

    match ty.kind {
        TypeKind::Scalar => Ok(()),
        TypeKind::Object | TypeKind::Interface => {
            if ty.fields.is_empty() {
                return Err(SchemaError::invalid(
                    span,
                    format!("Type \"{}\" must define one or more fields", ty.name),
                ));
            }

            let mut seen = HashSet::new();
            for field in &ty.fields {
                let field_span = field.span.unwrap_or(span);
                let coordinate = format!("{}.{}", ty.name, field.name);

                if !seen.insert(field.name.as_str()) {
                    return Err(SchemaError::invalid(
                        field_span,
                        format!("Field \"{}\" can only be defined once", coordinate),
                    ));
                }
                if field.name.starts_with("__") {
                    return Err(SchemaError::invalid(
                        field_span,
                        format!(
                            "Name \"{}\" must not begin with \"__\", which is reserved",
                            field.name
                        ),
                    ));
                }

                let kind = require_type(schema, &field.type_, field_span)?;
                if !kind.is_output() {
                    return Err(SchemaError::invalid(
                        field_span,
                        format!(
                            "The type of \"{}\" must be an output type but got \"{}\"",
                            coordinate, field.type_
                        ),
                    ));
                }

                validate_arguments(schema, &coordinate, &field.arguments, field_span)?;
            }

            validate_interfaces(schema, ty)
        }
        TypeKind::Union => {
            if ty.members.is_empty() {
                return Err(SchemaError::invalid(
                    span,
                    format!("Union type \"{}\" must define one or more member types", ty.name),
                ));
            }

            let mut seen = HashSet::new();
            for member in &ty.members {
                if !seen.insert(member.as_str()) {
                    return Err(SchemaError::invalid(
                        span,
                        format!(
                            "Union type \"{}\" can only include type \"{}\" once",
                            ty.name, member
                        ),
                    ));
                }
                let member_type = schema
                    .get_type(member)
                    .ok_or_else(|| SchemaError::unknown_type(member, span))?;
                if member_type.kind != TypeKind::Object {
                    return Err(SchemaError::invalid(
                        span,
                        format!(
                            "Union type \"{}\" can only include object types, it cannot include \"{}\"",
                            ty.name, member
                        ),
                    ));
                }
            }
            Ok(())
        }
        TypeKind::Enum => {
            if ty.enum_values.is_empty() {
                return Err(SchemaError::invalid(
                    span,
                    format!("Enum type \"{}\" must define one or more values", ty.name),
                ));
            }

            let mut seen = HashSet::new();
            for value in &ty.enum_values {
                if !seen.insert(value.name.as_str()) {
                    return Err(SchemaError::invalid(
                        span,
                        format!(
                            "Enum value \"{}.{}\" can only be defined once",
                            ty.name, value.name
                        ),
                    ));
                }
            }
            Ok(())
        }
        TypeKind::InputObject => {
            if ty.input_fields.is_empty() {
                return Err(SchemaError::invalid(
                    span,
                    format!("Input object type \"{}\" must define one or more fields", ty.name),
                ));
            }
            validate_arguments(schema, &ty.name, &ty.input_fields, span)
        }
    }
}

/// Validate argument or input field definitions owned by `owner`
fn validate_arguments(
    schema: &Schema,
    owner: &str,
    values: &[InputValue],
    fallback_span: Span,
) -> SchemaResult<()> {
    let mut seen = HashSet::new();
    for value in values {
        let span = value.span.unwrap_or(fallback_span);
        if !seen.insert(value.name.as_str()) {
            return Err(SchemaError::invalid(
                span,
                format!("Argument \"{}({}:)\" can only be defined once", owner, value.name),
            ));
        }

        let kind = require_type(schema, &value.type_, span)?;
        if !kind.is_input() {
            return Err(SchemaError::invalid(
                span,
                format!(
                    "The type of \"{}({}:)\" must be an input type but got \"{}\"",
                    owner, value.name, value.type_
                ),
            ));
        }
    }
    Ok(())
}

fn validate_interfaces(schema: &Schema, ty: &NamedType) -> SchemaResult<()> {
    let span = ty.span.unwrap_or_default();

    for name in &ty.interfaces {
        let interface = schema
            .get_type(name)
            .ok_or_else(|| SchemaError::unknown_type(name, span))?;

        if interface.kind != TypeKind::Interface {
            return Err(SchemaError::invalid(
                span,
                format!(
                    "Type \"{}\" must only implement interface types, it cannot implement \"{}\"",
                    ty.name, name
                ),
            ));
        }
        if interface.name == ty.name {
            return Err(SchemaError::invalid(
                span,
                format!("Type \"{}\" cannot implement itself", ty.name),
            ));
        }

        for expected in &interface.fields {
            let Some(field) = ty.field(&expected.name) else {
                return Err(SchemaError::invalid(
                    span,
                    format!(
                        "Interface field \"{}.{}\" expected but \"{}\" does not provide it",
                        interface.name, expected.name, ty.name
                    ),
                ));
            };

            if !schema.is_subtype(&field.type_, &expected.type_) {
                return Err(SchemaError::invalid(
                    field.span.unwrap_or(span),
                    format!(
                        "Interface field \"{}.{}\" expects type \"{}\" but \"{}.{}\" is type \"{}\"",
                        interface.name,
                        expected.name,
                        expected.type_,
                        ty.name,
                        field.name,
                        field.type_
                    ),
                ));
            }

            for expected_arg in &expected.arguments {
                let matches = field
                    .argument(&expected_arg.name)
                    .is_some_and(|arg| arg.type_ == expected_arg.type_);
                if !matches {
                    return Err(SchemaError::invalid(
                        field.span.unwrap_or(span),
                        format!(
                            "Interface field argument \"{}.{}({}:)\" expected but \"{}.{}\" does not provide it",
                            interface.name, expected.name, expected_arg.name, ty.name, field.name
                        ),
                    ));
                }
            }
        }
    }

    Ok(())
}

fn require_type(schema: &Schema, ty: &ast::Type, span: Span) -> SchemaResult<TypeKind> {
    schema
        .kind_of(ty)
        .ok_or_else(|| SchemaError::unknown_type(ty.inner_name(), span))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_scalars_and_directives() {
        let schema = build_schema("type Query { a: Int }").expect("schema");
        for name in BUILTIN_SCALARS {
            assert_eq!(schema.get_type(name).map(|t| t.kind), Some(TypeKind::Scalar));
        }
        assert!(schema.directive("include").is_some());
        assert!(schema.directive("skip").is_some());
        assert_eq!(schema.query_type().name, "Query");
        assert!(schema.mutation_type().is_none());
    }

    #[test]
    fn test_explicit_schema_definition() {
        let schema = build_schema(
            "schema { query: Root mutation: Writes } type Root { a: Int } type Writes { b: Int }",
        )
        .expect("schema");
        assert_eq!(schema.query_type().name, "Root");
        assert_eq!(schema.mutation_type().map(|t| t.name.as_str()), Some("Writes"));
    }

    #[test]
    fn test_missing_query_root() {
        let err = build_schema("type Foo { a: Int }").expect_err("should fail");
        assert!(err.to_string().contains("query root type"));
    }

    #[test]
    fn test_unknown_field_type() {
        let err = build_schema("type Query { a: Missing }").expect_err("should fail");
        assert!(matches!(err, SchemaError::UnknownType { ref name, .. } if name == "Missing"));
    }

    #[test]
    fn test_duplicate_type() {
        let err =
            build_schema("type Query { a: Int } type Query { b: Int }").expect_err("should fail");
        assert!(matches!(err, SchemaError::DuplicateType { .. }));
    }

    #[test]
    fn test_redeclared_builtin_scalar_is_allowed() {
        assert!(build_schema("scalar String type Query { a: String }").is_ok());
    }

    #[test]
    fn test_interface_field_must_be_implemented() {
        let err = build_schema(
            "type Query { n: Node } interface Node { id: ID! } type User implements Node { name: String }",
        )
        .expect_err("should fail");
        assert!(err.to_string().contains("Node.id"));
    }

    #[test]
    fn test_covariant_interface_field() {
        let schema = build_schema(
            r#"
            type Query { n: Node }
            interface Node { id: ID friend: Node }
            type User implements Node { id: ID! friend: User }
            "#,
        );
        assert!(schema.is_ok());
    }

    #[test]
    fn test_union_members_must_be_objects() {
        let err = build_schema("type Query { s: S } enum E { A } union S = E")
            .expect_err("should fail");
        assert!(err.to_string().contains("only include object types"));
    }

    #[test]
    fn test_input_type_in_output_position() {
        let err =
            build_schema("type Query { a: In } input In { x: Int }").expect_err("should fail");
        assert!(err.to_string().contains("output type"));
    }

    #[test]
    fn test_output_type_in_argument_position() {
        let err = build_schema("type Query { a(x: Query): Int }").expect_err("should fail");
        assert!(err.to_string().contains("input type"));
    }

    #[test]
    fn test_extensions_merge_in_any_order() {
        let schema = build_schema(
            "extend type Query { b: String } type Query { a: Int } extend enum E { B } enum E { A }",
        )
        .expect("schema");
        assert!(schema.field("Query", "b").is_some());
        assert!(schema.get_type("E").is_some_and(|e| e.has_enum_value("B")));
    }

    #[test]
    fn test_extension_of_unknown_type() {
        let err = build_schema("type Query { a: Int } extend type Nope { b: Int }")
            .expect_err("should fail");
        assert!(matches!(err, SchemaError::InvalidExtension { .. }));
    }

    #[test]
    fn test_extension_kind_mismatch() {
        let err = build_schema("type Query { a: Int } enum E { A } extend type E { b: Int }")
            .expect_err("should fail");
        assert!(matches!(err, SchemaError::InvalidExtension { .. }));
    }

    #[test]
    fn test_deprecation_reason() {
        let schema = build_schema(
            r#"type Query { old: Int @deprecated newer: Int @deprecated(reason: "use x") }"#,
        )
        .expect("schema");
        assert_eq!(
            schema.field("Query", "old").and_then(|f| f.deprecation_reason.as_deref()),
            Some("No longer supported")
        );
        assert_eq!(
            schema.field("Query", "newer").and_then(|f| f.deprecation_reason.as_deref()),
            Some("use x")
        );
    }

    #[test]
    fn test_custom_directive_overrides_builtin() {
        let schema = build_schema(
            "directive @deprecated(reason: String, since: String) on FIELD_DEFINITION type Query { a: Int }",
        )
        .expect("schema");
        let deprecated = schema.directive("deprecated").expect("directive");
        assert!(deprecated.argument("since").is_some());
    }

    #[test]
    fn test_parse_error_is_wrapped() {
        assert!(matches!(build_schema("type {"), Err(SchemaError::Parse(_))));
    }
}
