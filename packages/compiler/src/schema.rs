use relay_repl_parser::ast::{self, OperationKind, Span, TypeSystemDefinition};
use relay_repl_parser::parse_schema;
use relay_repl_schema::{build_schema, InputValue, Schema, SchemaError, SchemaResult, TypeKind};
use std::collections::HashMap;
use std::fmt;

/// Directives understood by the compiler but never sent to the server
const CLIENT_DIRECTIVES: &str = r#"
directive @relay(mask: Boolean, plural: Boolean) on FRAGMENT_DEFINITION | FRAGMENT_SPREAD
directive @connection(key: String!, filters: [String], handler: String) on FIELD
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u32);

impl FieldId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type reference resolved against a `CompilerSchema`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeReference {
    Named(TypeId),
    List(Box<TypeReference>),
    NonNull(Box<TypeReference>),
}

impl TypeReference {
    pub fn inner(&self) -> TypeId {
        match self {
            TypeReference::Named(id) => *id,
            TypeReference::List(of) | TypeReference::NonNull(of) => of.inner(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeReference::NonNull(_))
    }

    pub fn nullable(&self) -> &TypeReference {
        match self {
            TypeReference::NonNull(of) => of,
            other => other,
        }
    }

    pub fn non_null(self) -> TypeReference {
        match self {
            TypeReference::NonNull(_) => self,
            other => TypeReference::NonNull(Box::new(other)),
        }
    }

    /// Item type when this is a (possibly non-null) list
    pub fn list_item(&self) -> Option<&TypeReference> {
        match self.nullable() {
            TypeReference::List(of) => Some(of),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefinition {
    pub name: String,
    pub type_: TypeReference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub name: String,
    pub kind: TypeKind,
    pub fields: Vec<FieldId>,
    pub interfaces: Vec<TypeId>,
    pub members: Vec<TypeId>,
    pub enum_values: Vec<String>,
    pub input_fields: Vec<ArgumentDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    /// `None` for the shared `__typename` field
    pub parent_type: Option<TypeId>,
    pub type_: TypeReference,
    pub arguments: Vec<ArgumentDefinition>,
}

impl FieldInfo {
    pub fn argument(&self, name: &str) -> Option<&ArgumentDefinition> {
        self.arguments.iter().find(|arg| arg.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveInfo {
    pub name: String,
    pub arguments: Vec<ArgumentDefinition>,
    pub locations: Vec<String>,
    /// Compiler-only directive, stripped before printing
    pub is_client: bool,
}

impl DirectiveInfo {
    pub fn argument(&self, name: &str) -> Option<&ArgumentDefinition> {
        self.arguments.iter().find(|arg| arg.name == name)
    }
}

/// Interned schema used by the compiler. Types and fields are addressed by id.
#[derive(Debug, Clone)]
pub struct CompilerSchema {
    types: Vec<TypeInfo>,
    type_index: HashMap<String, TypeId>,
    fields: Vec<FieldInfo>,
    directives: Vec<DirectiveInfo>,
    query_type: Option<TypeId>,
    mutation_type: Option<TypeId>,
    subscription_type: Option<TypeId>,
    typename_field: FieldId,
}

impl CompilerSchema {
    /// Build and validate SDL, then intern it
    pub fn parse(source: &str) -> SchemaResult<Self> {
        let schema = build_schema(source)?;
        Self::from_schema(&schema)
    }

    pub fn from_schema(schema: &Schema) -> SchemaResult<Self> {
        let mut types = Vec::new();
        let mut type_index = HashMap::new();
        for ty in schema.types() {
            type_index.insert(ty.name.clone(), TypeId(types.len() as u32));
            types.push(TypeInfo {
                name: ty.name.clone(),
                kind: ty.kind,
                fields: Vec::new(),
                interfaces: Vec::new(),
                members: Vec::new(),
                enum_values: Vec::new(),
                input_fields: Vec::new(),
            });
        }

        let mut this = Self {
            types,
            type_index,
            fields: Vec::new(),
            directives: Vec::new(),
            query_type: None,
            mutation_type: None,
            subscription_type: None,
            typename_field: FieldId(0),
        };

        let string = this.lookup("String", None)?;
        this.fields.push(FieldInfo {
            name: "__typename".to_string(),
            parent_type: None,
            type_: TypeReference::NonNull(Box::new(TypeReference::Named(string))),
            arguments: Vec::new(),
        });

        for ty in schema.types() {
            let id = this.lookup(&ty.name, ty.span)?;

            let mut field_ids = Vec::with_capacity(ty.fields.len());
            for field in &ty.fields {
                let info = FieldInfo {
                    name: field.name.clone(),
                    parent_type: Some(id),
                    type_: this.resolve(&field.type_, field.span)?,
                    arguments: this.resolve_arguments(&field.arguments)?,
                };
                field_ids.push(FieldId(this.fields.len() as u32));
                this.fields.push(info);
            }

            let interfaces = ty
                .interfaces
                .iter()
                .map(|name| this.lookup(name, ty.span))
                .collect::<SchemaResult<Vec<_>>>()?;
            let members = ty
                .members
                .iter()
                .map(|name| this.lookup(name, ty.span))
                .collect::<SchemaResult<Vec<_>>>()?;
            let input_fields = this.resolve_arguments(&ty.input_fields)?;

            let info = &mut this.types[id.index()];
            info.fields = field_ids;
            info.interfaces = interfaces;
            info.members = members;
            info.enum_values = ty.enum_values.iter().map(|v| v.name.clone()).collect();
            info.input_fields = input_fields;
        }

        for directive in schema.directives() {
            let arguments = this.resolve_arguments(&directive.arguments)?;
            this.directives.push(DirectiveInfo {
                name: directive.name.clone(),
                arguments,
                locations: directive.locations.clone(),
                is_client: false,
            });
        }
        this.add_client_directives()?;

        this.query_type = Some(this.lookup(&schema.query_type().name, None)?);
        this.mutation_type = schema
            .mutation_type()
            .map(|ty| this.lookup(&ty.name, None))
            .transpose()?;
        this.subscription_type = schema
            .subscription_type()
            .map(|ty| this.lookup(&ty.name, None))
            .transpose()?;

        Ok(this)
    }

    fn add_client_directives(&mut self) -> SchemaResult<()> {
        let document = parse_schema(CLIENT_DIRECTIVES)?;
        for definition in document.definitions {
            let TypeSystemDefinition::Directive(directive) = definition else {
                continue;
            };
            // A server declaration of the same name wins
            if self.directive(&directive.name).is_some() {
                continue;
            }
            let mut arguments = Vec::with_capacity(directive.arguments.len());
            for arg in &directive.arguments {
                arguments.push(ArgumentDefinition {
                    name: arg.name.clone(),
                    type_: self.resolve(&arg.type_, Some(arg.span))?,
                });
            }
            self.directives.push(DirectiveInfo {
                name: directive.name,
                arguments,
                locations: directive.locations,
                is_client: true,
            });
        }
        Ok(())
    }

    fn lookup(&self, name: &str, span: Option<Span>) -> SchemaResult<TypeId> {
        self.get_type(name)
            .ok_or_else(|| SchemaError::unknown_type(name, span.unwrap_or_default()))
    }

    fn resolve(&self, ty: &ast::Type, span: Option<Span>) -> SchemaResult<TypeReference> {
        self.type_reference(ty)
            .ok_or_else(|| SchemaError::unknown_type(ty.inner_name(), span.unwrap_or_default()))
    }

    fn resolve_arguments(&self, values: &[InputValue]) -> SchemaResult<Vec<ArgumentDefinition>> {
        values
            .iter()
            .map(|value| {
                Ok(ArgumentDefinition {
                    name: value.name.clone(),
                    type_: self.resolve(&value.type_, value.span)?,
                })
            })
            .collect()
    }

    pub fn get_type(&self, name: &str) -> Option<TypeId> {
        self.type_index.get(name).copied()
    }

    pub fn type_info(&self, id: TypeId) -> &TypeInfo {
        &self.types[id.index()]
    }

    pub fn type_name(&self, id: TypeId) -> &str {
        &self.types[id.index()].name
    }

    pub fn kind(&self, id: TypeId) -> TypeKind {
        self.types[id.index()].kind
    }

    pub fn is_abstract(&self, id: TypeId) -> bool {
        self.kind(id).is_abstract()
    }

    pub fn is_composite(&self, id: TypeId) -> bool {
        self.kind(id).is_composite()
    }

    /// Resolve a syntactic type reference. `None` when a named type is unknown.
    pub fn type_reference(&self, ty: &ast::Type) -> Option<TypeReference> {
        Some(match ty {
            ast::Type::Named(name) => TypeReference::Named(self.get_type(name)?),
            ast::Type::List(of) => TypeReference::List(Box::new(self.type_reference(of)?)),
            ast::Type::NonNull(of) => TypeReference::NonNull(Box::new(self.type_reference(of)?)),
        })
    }

    pub fn field(&self, id: FieldId) -> &FieldInfo {
        &self.fields[id.index()]
    }

    /// Field `name` on `parent`, including `__typename` on composite types
    pub fn named_field(&self, parent: TypeId, name: &str) -> Option<FieldId> {
        if name == "__typename" && self.is_composite(parent) {
            return Some(self.typename_field);
        }
        self.types[parent.index()]
            .fields
            .iter()
            .copied()
            .find(|id| self.fields[id.index()].name == name)
    }

    pub fn input_field(&self, input: TypeId, name: &str) -> Option<&ArgumentDefinition> {
        self.types[input.index()]
            .input_fields
            .iter()
            .find(|field| field.name == name)
    }

    pub fn has_enum_value(&self, id: TypeId, value: &str) -> bool {
        self.types[id.index()].enum_values.iter().any(|v| v == value)
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveInfo> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn directives(&self) -> &[DirectiveInfo] {
        &self.directives
    }

    /// Declared by the server schema, as opposed to compiler-only
    pub fn is_server_directive(&self, name: &str) -> bool {
        self.directive(name).is_some_and(|d| !d.is_client)
    }

    pub fn root_type(&self, kind: OperationKind) -> Option<TypeId> {
        match kind {
            OperationKind::Query => self.query_type,
            OperationKind::Mutation => self.mutation_type,
            OperationKind::Subscription => self.subscription_type,
        }
    }

    /// Object types an instance of `id` may be at runtime
    pub fn possible_types(&self, id: TypeId) -> Vec<TypeId> {
        let ty = &self.types[id.index()];
        match ty.kind {
            TypeKind::Object => vec![id],
            TypeKind::Interface => (0..self.types.len())
                .map(|i| TypeId(i as u32))
                .filter(|&candidate| {
                    let info = &self.types[candidate.index()];
                    info.kind == TypeKind::Object && info.interfaces.contains(&id)
                })
                .collect(),
            TypeKind::Union => ty.members.clone(),
            _ => Vec::new(),
        }
    }

    pub fn is_possible_type(&self, abstract_type: TypeId, object: TypeId) -> bool {
        match self.kind(abstract_type) {
            TypeKind::Union => self.types[abstract_type.index()].members.contains(&object),
            TypeKind::Interface => self.types[object.index()].interfaces.contains(&abstract_type),
            _ => false,
        }
    }

    pub fn types_overlap(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        let b_possible = self.possible_types(b);
        self.possible_types(a).iter().any(|t| b_possible.contains(t))
    }

    /// Whether a value of type `sub` is acceptable where `sup` is expected
    pub fn is_type_subtype_of(&self, sub: &TypeReference, sup: &TypeReference) -> bool {
        use TypeReference::*;
        match (sub, sup) {
            (NonNull(a), NonNull(b)) => self.is_type_subtype_of(a, b),
            (NonNull(a), b) => self.is_type_subtype_of(a, b),
            (_, NonNull(_)) => false,
            (List(a), List(b)) => self.is_type_subtype_of(a, b),
            (List(_), _) | (_, List(_)) => false,
            (Named(a), Named(b)) => a == b || self.is_possible_type(*b, *a),
        }
    }

    /// Render a type reference as GraphQL, e.g. `[Episode!]!`
    pub fn display_type<'a>(&'a self, ty: &'a TypeReference) -> DisplayType<'a> {
        DisplayType { schema: self, ty }
    }
}

pub struct DisplayType<'a> {
    schema: &'a CompilerSchema,
    ty: &'a TypeReference,
}

impl fmt::Display for DisplayType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            TypeReference::Named(id) => f.write_str(self.schema.type_name(*id)),
            TypeReference::List(of) => write!(f, "[{}]", self.schema.display_type(of)),
            TypeReference::NonNull(of) => write!(f, "{}!", self.schema.display_type(of)),
        }
    }
}
