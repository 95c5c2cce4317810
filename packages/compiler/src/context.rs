use crate::error::{CompileError, CompileResult, TransformResult};
use crate::ir::{ExecutableDefinition, Fragment, Operation};
use crate::schema::CompilerSchema;
use crate::transforms::Transform;
use crate::visitor::DocumentStats;
use relay_repl_parser::ast::Span;
use std::sync::Arc;
use tracing::{debug, enabled, Level};

/// Ordered set of IR documents sharing one schema.
///
/// Transforms take a context and produce a new one; the input is never mutated.
#[derive(Debug, Clone)]
pub struct CompilerContext {
    schema: Arc<CompilerSchema>,
    documents: Vec<ExecutableDefinition>,
}

impl CompilerContext {
    pub fn new(schema: Arc<CompilerSchema>) -> Self {
        Self {
            schema,
            documents: Vec::new(),
        }
    }

    /// A context over the same schema holding `documents`
    pub fn with_documents(&self, documents: Vec<ExecutableDefinition>) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            documents,
        }
    }

    pub fn schema(&self) -> &CompilerSchema {
        &self.schema
    }

    pub fn shared_schema(&self) -> Arc<CompilerSchema> {
        Arc::clone(&self.schema)
    }

    pub fn add(&mut self, document: ExecutableDefinition) -> CompileResult<()> {
        if self.get(document.name()).is_some() {
            return Err(CompileError::DuplicateDefinition {
                name: document.name().to_string(),
                span: Span::default(),
            });
        }
        self.documents.push(document);
        Ok(())
    }

    pub fn add_all(
        &mut self,
        documents: impl IntoIterator<Item = ExecutableDefinition>,
    ) -> CompileResult<()> {
        documents.into_iter().try_for_each(|document| self.add(document))
    }

    pub fn get(&self, name: &str) -> Option<&ExecutableDefinition> {
        self.documents.iter().find(|document| document.name() == name)
    }

    pub fn get_fragment(&self, name: &str) -> Option<&Fragment> {
        match self.get(name)? {
            ExecutableDefinition::Fragment(fragment) => Some(fragment),
            ExecutableDefinition::Operation(_) => None,
        }
    }

    pub fn get_operation(&self, name: &str) -> Option<&Operation> {
        match self.get(name)? {
            ExecutableDefinition::Operation(op) => Some(op),
            ExecutableDefinition::Fragment(_) => None,
        }
    }

    /// Swap in a document with the same name, keeping its position.
    /// Returns false when no such document exists.
    pub fn replace(&mut self, document: ExecutableDefinition) -> bool {
        match self
            .documents
            .iter_mut()
            .find(|existing| existing.name() == document.name())
        {
            Some(slot) => {
                *slot = document;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ExecutableDefinition> {
        let index = self.documents.iter().position(|d| d.name() == name)?;
        Some(self.documents.remove(index))
    }

    pub fn documents(&self) -> &[ExecutableDefinition] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<ExecutableDefinition> {
        self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Node counts over every document
    pub fn stats(&self) -> DocumentStats {
        DocumentStats::collect(&self.documents)
    }

    /// Run `transforms` in order, each on the output of the previous one
    pub fn apply_transforms<'t>(
        &self,
        transforms: impl IntoIterator<Item = &'t Transform>,
    ) -> TransformResult<CompilerContext> {
        let mut context = self.clone();
        for transform in transforms {
            context = (transform.transform)(&context)?;
            if enabled!(Level::DEBUG) {
                let stats = context.stats();
                debug!(
                    transform = transform.name,
                    documents = context.len(),
                    spreads = stats.fragment_spreads,
                    inline_fragments = stats.inline_fragments,
                    conditions = stats.conditions,
                    "applied transform"
                );
            }
        }
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Selection;
    use relay_repl_parser::ast::OperationKind;

    fn context() -> CompilerContext {
        let schema = CompilerSchema::parse("type Query { id: ID }").expect("schema");
        CompilerContext::new(Arc::new(schema))
    }

    fn operation(context: &CompilerContext, name: &str) -> ExecutableDefinition {
        let type_ = context
            .schema()
            .root_type(OperationKind::Query)
            .expect("query root");
        ExecutableDefinition::Operation(Operation {
            name: name.to_string(),
            kind: OperationKind::Query,
            type_,
            variable_definitions: Vec::new(),
            directives: Vec::new(),
            selections: Vec::<Selection>::new(),
        })
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut ctx = context();
        ctx.add(operation(&ctx, "A")).expect("add");
        assert!(matches!(
            ctx.add(operation(&ctx, "A")),
            Err(CompileError::DuplicateDefinition { .. })
        ));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_replace_keeps_position_and_remove() {
        let mut ctx = context();
        ctx.add_all([operation(&ctx, "A"), operation(&ctx, "B"), operation(&ctx, "C")])
            .expect("add");

        assert!(ctx.replace(operation(&ctx, "B")));
        assert!(!ctx.replace(operation(&ctx, "Z")));
        assert!(ctx.remove("A").is_some());

        let names: Vec<_> = ctx.documents().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["B", "C"]);
        assert!(ctx.get_operation("C").is_some());
        assert!(ctx.get_fragment("C").is_none());
    }
}
