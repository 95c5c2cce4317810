//! Schema services for the playground: building a validated schema from SDL,
//! linting operation documents against it, and field completion hints.

mod builder;
mod diagnostic;
mod error;
pub mod hints;
pub mod lint;
mod schema;

pub use builder::{build_schema, build_schema_from_document};
pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use error::{SchemaError, SchemaResult};
pub use hints::{complete_at, suggest_fields, Completion};
pub use lint::{lint_operation, validate_operation};
pub use schema::{
    DirectiveDefinition, EnumValue, FieldDefinition, InputValue, NamedType, Schema, TypeKind,
    BUILTIN_SCALARS,
};
