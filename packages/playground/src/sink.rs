use crate::buffer::Revision;
use crate::pipeline::{CompilationOutcome, CompilationResult};
use relay_repl_schema::Schema;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Last accepted success
#[derive(Debug, Clone, Default)]
pub struct OutputState {
    pub printed_text: String,
    /// `None` until the first success
    pub schema: Option<Arc<Schema>>,
    pub generation: Revision,
}

/// Read-only output buffer. Only successes newer than the current one get in.
#[derive(Debug)]
pub struct OutputSink {
    accepted: AtomicU64,
    sender: watch::Sender<OutputState>,
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(OutputState::default());
        Self {
            accepted: AtomicU64::new(Revision::INITIAL.get()),
            sender,
        }
    }

    /// Accept `result` if it succeeded and is newer than the accepted output.
    /// Returns whether the output changed.
    pub fn publish(&self, result: &CompilationResult) -> bool {
        let CompilationOutcome::Success {
            schema,
            printed_text,
        } = &result.outcome
        else {
            return false;
        };
        let generation = result.generation();

        let claimed = self
            .accepted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |accepted| {
                (generation.get() > accepted).then_some(generation.get())
            });
        if let Err(accepted) = claimed {
            debug!(%generation, accepted, "refusing stale output");
            return false;
        }

        let next = OutputState {
            printed_text: printed_text.clone(),
            schema: Some(Arc::clone(schema)),
            generation,
        };
        // The atomic can be claimed by a newer publisher between the two steps
        self.sender.send_if_modified(|state| {
            if next.generation > state.generation {
                *state = next;
                true
            } else {
                false
            }
        })
    }

    pub fn snapshot(&self) -> OutputState {
        self.sender.borrow().clone()
    }

    pub fn printed_text(&self) -> String {
        self.sender.borrow().printed_text.clone()
    }

    /// Schema of the last success, for lint and completion
    pub fn schema(&self) -> Option<Arc<Schema>> {
        self.sender.borrow().schema.clone()
    }

    pub fn accepted_generation(&self) -> Revision {
        Revision::from(self.accepted.load(Ordering::Acquire))
    }

    /// Receiver that wakes on every accepted output
    pub fn subscribe(&self) -> watch::Receiver<OutputState> {
        self.sender.subscribe()
    }
}
