use crate::buffer::{Revision, SourceText, Versioned};
use crate::error::PipelineError;
use crate::transforms::TransformSelection;
use relay_repl_compiler::transforms::{Transform, MANDATORY_TRANSFORMS};
use relay_repl_compiler::{build_ir, print_context, CompilerContext, CompilerSchema};
use relay_repl_parser::parse_document;
use relay_repl_schema::{build_schema, Schema};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Immutable snapshots of the three input buffers
#[derive(Debug, Clone)]
pub struct CompilationRequest {
    pub schema: SourceText,
    pub operation: SourceText,
    pub selection: Versioned<TransformSelection>,
}

impl CompilationRequest {
    pub fn revisions(&self) -> Revisions {
        Revisions {
            schema: self.schema.revision,
            operation: self.operation.revision,
            selection: self.selection.revision,
        }
    }
}

/// Revisions of the snapshots a result was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Revisions {
    pub schema: Revision,
    pub operation: Revision,
    pub selection: Revision,
}

impl Revisions {
    /// The newest of the three; identifies the request
    pub fn generation(&self) -> Revision {
        self.schema.max(self.operation).max(self.selection)
    }
}

#[derive(Debug, Clone)]
pub struct CompilationResult {
    pub revisions: Revisions,
    pub outcome: CompilationOutcome,
}

#[derive(Debug, Clone)]
pub enum CompilationOutcome {
    Success {
        schema: Arc<Schema>,
        printed_text: String,
    },
    Failure {
        error: PipelineError,
    },
}

impl CompilationResult {
    pub fn generation(&self) -> Revision {
        self.revisions.generation()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CompilationOutcome::Success { .. })
    }

    pub fn printed_text(&self) -> Option<&str> {
        match &self.outcome {
            CompilationOutcome::Success { printed_text, .. } => Some(printed_text),
            CompilationOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match &self.outcome {
            CompilationOutcome::Failure { error } => Some(error),
            CompilationOutcome::Success { .. } => None,
        }
    }
}

/// Output of a successful run
#[derive(Debug, Clone)]
pub struct Compiled {
    pub schema: Arc<Schema>,
    pub printed_text: String,
}

/// Schema text + operation text + selection to printed text.
///
/// Holds no state: the same request always gives the same result.
#[derive(Debug, Clone, Copy)]
pub struct CompilationPipeline {
    mandatory: &'static [&'static Transform],
}

impl Default for CompilationPipeline {
    fn default() -> Self {
        Self {
            mandatory: MANDATORY_TRANSFORMS,
        }
    }
}

impl CompilationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip_all, fields(generation = %request.revisions().generation()))]
    pub fn compile(&self, request: &CompilationRequest) -> CompilationResult {
        let outcome = match self.run(
            &request.schema.value,
            &request.operation.value,
            &request.selection.value,
        ) {
            Ok(compiled) => CompilationOutcome::Success {
                schema: compiled.schema,
                printed_text: compiled.printed_text,
            },
            Err(error) => CompilationOutcome::Failure { error },
        };
        CompilationResult {
            revisions: request.revisions(),
            outcome,
        }
    }

    /// Run every stage, stopping at the first failure
    pub fn run(
        &self,
        schema_text: &str,
        operation_text: &str,
        selection: &TransformSelection,
    ) -> Result<Compiled, PipelineError> {
        let schema = Arc::new(build_schema(schema_text)?);
        let compiler_schema = Arc::new(CompilerSchema::parse(schema_text)?);
        let document = parse_document(operation_text)?;
        let definitions = build_ir(&compiler_schema, &document)?;

        let mut context = CompilerContext::new(compiler_schema);
        context.add_all(definitions)?;

        let enabled = selection.enabled();
        debug!(
            documents = context.len(),
            transforms = enabled.len(),
            "running transforms"
        );
        let output = context.apply_transforms(self.mandatory.iter().chain(&enabled).copied())?;

        Ok(Compiled {
            schema,
            printed_text: print_context(&output),
        })
    }
}
