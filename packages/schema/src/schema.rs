use relay_repl_parser::ast::{OperationKind, Span, Type, Value};
use serde::Serialize;
use std::collections::HashMap;

pub const BUILTIN_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Scalar => "scalar",
            TypeKind::Object => "type",
            TypeKind::Interface => "interface",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::InputObject => "input",
        }
    }

    /// Object, interface or union: types that take a selection set
    pub fn is_composite(&self) -> bool {
        matches!(self, TypeKind::Object | TypeKind::Interface | TypeKind::Union)
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Union)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TypeKind::Scalar | TypeKind::Enum)
    }

    pub fn is_input(&self) -> bool {
        matches!(self, TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject)
    }

    pub fn is_output(&self) -> bool {
        !matches!(self, TypeKind::InputObject)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    pub name: String,
    pub description: Option<String>,
    pub kind: TypeKind,
    /// Output fields of objects and interfaces
    pub fields: Vec<FieldDefinition>,
    pub interfaces: Vec<String>,
    /// Union members
    pub members: Vec<String>,
    pub enum_values: Vec<EnumValue>,
    pub input_fields: Vec<InputValue>,
    /// `None` for built-in scalars
    pub span: Option<Span>,
}

impl NamedType {
    pub(crate) fn new(name: impl Into<String>, kind: TypeKind, span: Option<Span>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            fields: Vec::new(),
            interfaces: Vec::new(),
            members: Vec::new(),
            enum_values: Vec::new(),
            input_fields: Vec::new(),
            span,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn input_field(&self, name: &str) -> Option<&InputValue> {
        self.input_fields.iter().find(|field| field.name == name)
    }

    pub fn has_enum_value(&self, name: &str) -> bool {
        self.enum_values.iter().any(|value| value.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValue>,
    pub type_: Type,
    pub deprecation_reason: Option<String>,
    pub span: Option<Span>,
}

impl FieldDefinition {
    pub fn argument(&self, name: &str) -> Option<&InputValue> {
        self.arguments.iter().find(|arg| arg.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputValue {
    pub name: String,
    pub description: Option<String>,
    pub type_: Type,
    pub default_value: Option<Value>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValue>,
    pub locations: Vec<String>,
    pub repeatable: bool,
    pub span: Option<Span>,
}

impl DirectiveDefinition {
    pub fn argument(&self, name: &str) -> Option<&InputValue> {
        self.arguments.iter().find(|arg| arg.name == name)
    }
}

/// A validated GraphQL schema
#[derive(Debug, Clone)]
pub struct Schema {
    types: Vec<NamedType>,
    index: HashMap<String, usize>,
    query_type: usize,
    mutation_type: Option<usize>,
    subscription_type: Option<usize>,
    directives: Vec<DirectiveDefinition>,
    typename_field: FieldDefinition,
}

impl Schema {
    pub(crate) fn new(
        types: Vec<NamedType>,
        query_type: usize,
        mutation_type: Option<usize>,
        subscription_type: Option<usize>,
        directives: Vec<DirectiveDefinition>,
    ) -> Self {
        let index = types
            .iter()
            .enumerate()
            .map(|(i, ty)| (ty.name.clone(), i))
            .collect();

        Self {
            types,
            index,
            query_type,
            mutation_type,
            subscription_type,
            directives,
            typename_field: FieldDefinition {
                name: "__typename".to_string(),
                description: Some("The name of the current object type".to_string()),
                arguments: Vec::new(),
                type_: Type::NonNull(Box::new(Type::Named("String".to_string()))),
                deprecation_reason: None,
                span: None,
            },
        }
    }

    pub fn get_type(&self, name: &str) -> Option<&NamedType> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    /// All types in definition order, built-in scalars first
    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.types.iter()
    }

    pub fn query_type(&self) -> &NamedType {
        &self.types[self.query_type]
    }

    pub fn mutation_type(&self) -> Option<&NamedType> {
        self.mutation_type.map(|i| &self.types[i])
    }

    pub fn subscription_type(&self) -> Option<&NamedType> {
        self.subscription_type.map(|i| &self.types[i])
    }

    pub fn root_type(&self, kind: OperationKind) -> Option<&NamedType> {
        match kind {
            OperationKind::Query => Some(self.query_type()),
            OperationKind::Mutation => self.mutation_type(),
            OperationKind::Subscription => self.subscription_type(),
        }
    }

    /// Look up a field on a composite type. `__typename` resolves on every composite type.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDefinition> {
        let ty = self.get_type(type_name)?;
        if field_name == "__typename" && ty.kind.is_composite() {
            return Some(&self.typename_field);
        }
        ty.field(field_name)
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn directives(&self) -> &[DirectiveDefinition] {
        &self.directives
    }

    /// Object types an instance of `name` may be at runtime
    pub fn possible_types(&self, name: &str) -> Vec<&NamedType> {
        let Some(ty) = self.get_type(name) else {
            return Vec::new();
        };
        match ty.kind {
            TypeKind::Object => vec![ty],
            TypeKind::Interface => self
                .types
                .iter()
                .filter(|t| t.kind == TypeKind::Object && t.interfaces.iter().any(|i| i == name))
                .collect(),
            TypeKind::Union => ty
                .members
                .iter()
                .filter_map(|member| self.get_type(member))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `object` is a possible runtime type of the abstract type `abstract_name`
    pub fn is_possible_type(&self, abstract_name: &str, object: &str) -> bool {
        match self.get_type(abstract_name) {
            Some(ty) if ty.kind == TypeKind::Union => ty.members.iter().any(|m| m == object),
            Some(ty) if ty.kind == TypeKind::Interface => self
                .get_type(object)
                .is_some_and(|o| o.interfaces.iter().any(|i| i == abstract_name)),
            _ => false,
        }
    }

    /// Whether a value of type `a` could also be of type `b`
    pub fn types_overlap(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        let b_possible = self.possible_types(b);
        self.possible_types(a)
            .iter()
            .any(|t| b_possible.iter().any(|o| o.name == t.name))
    }

    /// Whether `sub` can be used where `sup` is expected (covariant output types)
    pub fn is_subtype(&self, sub: &Type, sup: &Type) -> bool {
        match (sub, sup) {
            (Type::NonNull(a), Type::NonNull(b)) => self.is_subtype(a, b),
            (Type::NonNull(a), b) => self.is_subtype(a, b),
            (_, Type::NonNull(_)) => false,
            (Type::List(a), Type::List(b)) => self.is_subtype(a, b),
            (Type::List(_), _) | (_, Type::List(_)) => false,
            (Type::Named(a), Type::Named(b)) => a == b || self.is_possible_type(b, a),
        }
    }

    pub fn kind_of(&self, ty: &Type) -> Option<TypeKind> {
        self.get_type(ty.inner_name()).map(|t| t.kind)
    }
}
