use crate::buffer::Revision;
use crate::pipeline::CompilationResult;
use crate::sink::OutputSink;
use serde::Serialize;
use tracing::{debug, warn};

/// Where the recompile loop is. A finished cycle goes back to `Idle`, or
/// stays `Scheduled` when an edit arrived while it was running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    Scheduled,
    Running,
}

/// How a finished cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The result replaced the output
    Applied,
    /// Failed, stale, or refused by the sink
    Discarded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    pub runs: u64,
    pub applied: u64,
    /// Successes that were stale by the time they finished
    pub discarded: u64,
    pub failed: u64,
}

/// Decide what happens to a finished run. `latest` is the newest generation
/// known when the run completed.
pub(crate) fn settle(
    sink: &OutputSink,
    result: &CompilationResult,
    latest: Revision,
    stats: &mut CycleStats,
) -> Outcome {
    stats.runs += 1;
    let generation = result.generation();

    if let Some(error) = result.error() {
        stats.failed += 1;
        warn!(
            %generation,
            stage = error.stage(),
            %error,
            "compilation failed, keeping last output"
        );
        return Outcome::Discarded;
    }

    if generation < latest {
        stats.discarded += 1;
        debug!(%generation, %latest, "discarding stale result");
        return Outcome::Discarded;
    }

    if sink.publish(result) {
        stats.applied += 1;
        debug!(%generation, "applied result");
        Outcome::Applied
    } else {
        stats.discarded += 1;
        Outcome::Discarded
    }
}

/// Phase to rest in once a cycle is over
pub(crate) fn finish(phase: Phase) -> Phase {
    match phase {
        // an edit while compiling already queued the next cycle
        Phase::Scheduled => Phase::Scheduled,
        Phase::Idle | Phase::Running => Phase::Idle,
    }
}
