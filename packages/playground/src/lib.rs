//! The live recompile loop behind the Relay REPL.
//!
//! Three editable buffers (schema, operation, transform selection) feed a
//! debounced [`CompilationPipeline`]; accepted results land in an
//! [`OutputSink`]. [`Orchestrator`] drives this on a tokio runtime and
//! [`Session`] does the same synchronously for hosts without one.

mod buffer;
mod config;
mod cycle;
pub mod defaults;
mod error;
mod pipeline;
mod session;
mod sink;
mod state;
mod transforms;

#[cfg(feature = "runtime")]
mod debouncer;
#[cfg(feature = "runtime")]
mod orchestrator;

pub use buffer::{EditClock, EditableBuffer, Revision, SourceText, Versioned};
pub use config::PlaygroundConfig;
pub use cycle::{CycleStats, Outcome, Phase};
pub use error::{PipelineError, SelectionError, SelectionResult};
pub use pipeline::{
    CompilationOutcome, CompilationPipeline, CompilationRequest, CompilationResult, Compiled,
    Revisions,
};
pub use session::Session;
pub use sink::{OutputSink, OutputState};
pub use state::AppState;
pub use transforms::{TransformSelection, TransformToggle};

#[cfg(feature = "runtime")]
pub use debouncer::Debouncer;
#[cfg(feature = "runtime")]
pub use orchestrator::Orchestrator;
