use crate::buffer::Revision;
use crate::config::PlaygroundConfig;
use crate::cycle::{finish, settle, CycleStats, Outcome, Phase};
use crate::debouncer::Debouncer;
use crate::error::SelectionResult;
use crate::pipeline::CompilationPipeline;
use crate::sink::{OutputSink, OutputState};
use crate::state::AppState;
use crate::transforms::TransformSelection;
use relay_repl_schema::{complete_at, lint_operation, Completion, Diagnostic};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct Progress {
    phase: Phase,
    last_outcome: Option<Outcome>,
    stats: CycleStats,
}

/// Everything the timer task needs
#[derive(Debug)]
struct Shared {
    state: Mutex<AppState>,
    progress: Mutex<Progress>,
    pipeline: CompilationPipeline,
    sink: OutputSink,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One compile against a snapshot. No lock is held while compiling.
    fn run_cycle(&self) -> Outcome {
        // Running is set under the state lock, so any later edit sees it
        let request = {
            let state = self.state();
            self.progress().phase = Phase::Running;
            state.request()
        };

        let result = self.pipeline.compile(&request);

        let latest = self.state().latest_generation();
        let mut progress = self.progress();
        let outcome = settle(&self.sink, &result, latest, &mut progress.stats);
        progress.last_outcome = Some(outcome);
        progress.phase = finish(progress.phase);
        trace!(phase = ?progress.phase, ?outcome, "cycle finished");
        outcome
    }
}

/// Ties the input buffers to the output: every edit (re)arms the debounce
/// timer, and the timer runs one compile against the newest snapshots.
///
/// Results older than the latest edit are dropped; failures are logged and
/// leave the previous output in place.
#[derive(Debug)]
pub struct Orchestrator {
    shared: Arc<Shared>,
    debouncer: Debouncer,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(AppState::default(), Debouncer::DEFAULT_INTERVAL)
    }
}

impl Orchestrator {
    pub fn new(state: AppState, debounce: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                progress: Mutex::new(Progress::default()),
                pipeline: CompilationPipeline::new(),
                sink: OutputSink::new(),
            }),
            debouncer: Debouncer::new(debounce),
        }
    }

    /// Default buffers with the configured selection and interval
    pub fn from_config(config: &PlaygroundConfig) -> SelectionResult<Self> {
        let mut state = AppState::default();
        state.selection.set(config.selection()?);
        Ok(Self::new(state, config.debounce()))
    }

    pub fn set_schema_text(&mut self, text: impl Into<Arc<str>>) -> Revision {
        let revision = self.shared.state().schema.set_text(text);
        debug!(%revision, "schema edited");
        self.schedule();
        revision
    }

    pub fn set_operation_text(&mut self, text: impl Into<Arc<str>>) -> Revision {
        let revision = self.shared.state().operation.set_text(text);
        debug!(%revision, "operation edited");
        self.schedule();
        revision
    }

    /// Returns the new state of the switch
    pub fn toggle_transform(&mut self, name: &str) -> SelectionResult<bool> {
        let enabled = self.shared.state().toggle_transform(name)?;
        debug!(transform = name, enabled, "transform toggled");
        self.schedule();
        Ok(enabled)
    }

    pub fn set_transform_enabled(&mut self, name: &str, enabled: bool) -> SelectionResult<bool> {
        let changed = self.shared.state().set_transform_enabled(name, enabled)?;
        if changed {
            self.schedule();
        }
        Ok(changed)
    }

    /// Schedule a compile of the current buffers without editing them
    pub fn recompile(&mut self) {
        self.schedule();
    }

    /// Run a scheduled compile now instead of waiting for the timer.
    /// Returns whether the output was replaced.
    pub fn flush(&mut self) -> bool {
        if !self.debouncer.cancel() {
            return false;
        }
        self.shared.run_cycle() == Outcome::Applied
    }

    /// Drop any scheduled compile
    pub fn shutdown(&mut self) {
        if self.debouncer.cancel() {
            debug!("pending compile cancelled");
        }
        let mut progress = self.shared.progress();
        if progress.phase == Phase::Scheduled {
            progress.phase = Phase::Idle;
        }
    }

    pub fn output(&self) -> OutputState {
        self.shared.sink.snapshot()
    }

    pub fn printed_text(&self) -> String {
        self.shared.sink.printed_text()
    }

    /// Receiver that wakes on every accepted output
    pub fn subscribe(&self) -> watch::Receiver<OutputState> {
        self.shared.sink.subscribe()
    }

    pub fn selection(&self) -> TransformSelection {
        self.shared.state().selection.get().clone()
    }

    pub fn phase(&self) -> Phase {
        self.shared.progress().phase
    }

    /// How the last cycle ended, if one has run
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.shared.progress().last_outcome
    }

    pub fn stats(&self) -> CycleStats {
        self.shared.progress().stats
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Lint the operation buffer against the last good schema
    pub fn lint(&self) -> Vec<Diagnostic> {
        let Some(schema) = self.shared.sink.schema() else {
            return Vec::new();
        };
        let operation = Arc::clone(self.shared.state().operation.get());
        lint_operation(&schema, &operation)
    }

    pub fn complete_at(&self, offset: usize) -> Vec<Completion> {
        let Some(schema) = self.shared.sink.schema() else {
            return Vec::new();
        };
        let operation = Arc::clone(self.shared.state().operation.get());
        complete_at(&schema, &operation, offset)
    }

    fn schedule(&mut self) {
        self.shared.progress().phase = Phase::Scheduled;
        let shared = Arc::clone(&self.shared);
        self.debouncer.schedule(move || {
            shared.run_cycle();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DEFAULT_OPERATION;

    const QUIET: Duration = Duration::from_millis(200);

    async fn settle_timers() {
        tokio::time::sleep(QUIET * 2).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_compile_is_debounced() {
        let mut orchestrator = Orchestrator::default();
        orchestrator.recompile();
        assert_eq!(orchestrator.phase(), Phase::Scheduled);
        assert!(orchestrator.printed_text().is_empty());

        settle_timers().await;
        assert_eq!(orchestrator.phase(), Phase::Idle);
        assert_eq!(orchestrator.last_outcome(), Some(Outcome::Applied));
        assert!(orchestrator.printed_text().starts_with("query UserProfile {"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystroke_burst_compiles_once() {
        let mut orchestrator = Orchestrator::default();
        let text = "query Typed { hero { name } }";
        for end in 1..=text.len() {
            orchestrator.set_operation_text(&text[..end]);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        settle_timers().await;

        assert_eq!(orchestrator.stats().runs, 1);
        assert_eq!(orchestrator.stats().applied, 1);
        assert_eq!(
            orchestrator.printed_text(),
            "query Typed {\n  hero {\n    name\n  }\n}\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_compile_keeps_previous_output() {
        let mut orchestrator = Orchestrator::default();
        orchestrator.recompile();
        settle_timers().await;
        let good = orchestrator.printed_text();

        orchestrator.set_schema_text("type Query {");
        settle_timers().await;
        assert_eq!(orchestrator.printed_text(), good);
        assert_eq!(orchestrator.stats().failed, 1);
        assert_eq!(orchestrator.phase(), Phase::Idle);
        assert_eq!(orchestrator.last_outcome(), Some(Outcome::Discarded));

        orchestrator.set_operation_text("query Q { hero { nope } }");
        settle_timers().await;
        assert_eq!(orchestrator.printed_text(), good);
        assert_eq!(orchestrator.stats().failed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_runs_immediately() {
        let mut orchestrator = Orchestrator::default();
        assert!(!orchestrator.flush());

        orchestrator.set_operation_text("query Now { hero { id } }");
        assert!(orchestrator.flush());
        assert!(orchestrator.printed_text().starts_with("query Now"));
        assert!(!orchestrator.is_pending());

        settle_timers().await;
        assert_eq!(orchestrator.stats().runs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_result_is_not_applied() {
        let mut orchestrator = Orchestrator::default();
        orchestrator.set_operation_text("query First { hero { id } }");

        // Compile against the first edit, then edit again before it settles
        let request = orchestrator.shared.state().request();
        let result = orchestrator.shared.pipeline.compile(&request);
        orchestrator.set_operation_text("query Second { hero { name } }");
        let latest = orchestrator.shared.state().latest_generation();
        let mut stats = CycleStats::default();
        let outcome = settle(&orchestrator.shared.sink, &result, latest, &mut stats);

        assert_eq!(outcome, Outcome::Discarded);
        assert_eq!(stats.discarded, 1);
        assert!(orchestrator.printed_text().is_empty());

        settle_timers().await;
        assert!(orchestrator.printed_text().starts_with("query Second"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_twice_restores_output() {
        let mut orchestrator = Orchestrator::default();
        orchestrator.recompile();
        settle_timers().await;
        let original = orchestrator.printed_text();

        orchestrator.toggle_transform("inline_fragments").unwrap();
        settle_timers().await;
        assert!(orchestrator.printed_text().contains("...CharacterData_"));

        orchestrator.toggle_transform("inline_fragments").unwrap();
        settle_timers().await;
        assert_eq!(orchestrator.printed_text(), original);
        assert!(orchestrator.toggle_transform("nope").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_compile() {
        let mut orchestrator = Orchestrator::default();
        orchestrator.set_operation_text(DEFAULT_OPERATION);
        orchestrator.shutdown();
        assert_eq!(orchestrator.phase(), Phase::Idle);

        settle_timers().await;
        assert_eq!(orchestrator.stats().runs, 0);
        assert!(orchestrator.printed_text().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_are_notified() {
        let mut orchestrator = Orchestrator::default();
        let mut receiver = orchestrator.subscribe();
        orchestrator.recompile();

        receiver.changed().await.unwrap();
        assert!(receiver.borrow().printed_text.starts_with("query UserProfile"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lint_waits_for_a_schema() {
        let state = AppState::new(
            "type Query { me: User } type User { id: ID! }",
            "query Q { me { id email } }",
            TransformSelection::default(),
        );
        let mut orchestrator = Orchestrator::new(state, QUIET);
        assert!(orchestrator.lint().is_empty());

        orchestrator.set_operation_text("query Q { me { id } }");
        settle_timers().await;
        assert!(orchestrator.lint().is_empty());

        orchestrator.set_operation_text("query Q { me { id email } }");
        assert!(orchestrator
            .lint()
            .iter()
            .any(|diagnostic| diagnostic.message.contains("email")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_during_a_cycle_stays_scheduled() {
        let mut orchestrator = Orchestrator::default();
        orchestrator.recompile();
        settle_timers().await;

        // The cycle has snapshotted its request and marked itself Running
        let request = {
            let state = orchestrator.shared.state();
            orchestrator.shared.progress().phase = Phase::Running;
            state.request()
        };
        orchestrator.set_operation_text("query Newer { hero { id } }");
        assert_eq!(orchestrator.phase(), Phase::Scheduled);

        let result = orchestrator.shared.pipeline.compile(&request);
        let latest = orchestrator.shared.state().latest_generation();
        {
            let mut progress = orchestrator.shared.progress();
            let outcome = settle(
                &orchestrator.shared.sink,
                &result,
                latest,
                &mut progress.stats,
            );
            assert_eq!(outcome, Outcome::Discarded);
            progress.phase = finish(progress.phase);
        }
        assert_eq!(orchestrator.phase(), Phase::Scheduled);
        assert!(orchestrator.is_pending());

        settle_timers().await;
        assert_eq!(orchestrator.phase(), Phase::Idle);
        assert!(orchestrator.printed_text().starts_with("query Newer"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deep_operation_fails_without_touching_output() {
        let mut orchestrator = Orchestrator::default();
        orchestrator.recompile();
        settle_timers().await;
        let good = orchestrator.printed_text();

        let depth = 20_000;
        orchestrator.set_operation_text(format!(
            "query Deep {}id{}",
            "{ hero ".repeat(depth),
            " }".repeat(depth)
        ));
        settle_timers().await;
        assert_eq!(orchestrator.stats().failed, 1);
        assert_eq!(orchestrator.printed_text(), good);
    }
}
