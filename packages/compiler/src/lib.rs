//! Relay-style compiler core: lowering of parsed GraphQL documents into a
//! typed IR, the document transforms and the printer.

mod build;
mod context;
mod error;
pub mod ir;
mod printer;
mod schema;
pub mod transforms;
mod visitor;

pub use build::build_ir;
pub use context::CompilerContext;
pub use error::{CompileError, CompileResult, TransformError, TransformResult};
pub use printer::{print_context, print_document};
pub use schema::{
    ArgumentDefinition, CompilerSchema, DirectiveInfo, FieldId, FieldInfo, TypeId, TypeInfo,
    TypeReference,
};
pub use transforms::{find_transform, Transform, DEFAULT_TRANSFORMS, MANDATORY_TRANSFORMS};
pub use visitor::{walk_document_mut, walk_selection_mut, DocumentStats, VisitorMut};

#[cfg(test)]
mod tests;
