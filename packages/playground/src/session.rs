use crate::buffer::Revision;
use crate::config::PlaygroundConfig;
use crate::cycle::{finish, settle, CycleStats, Outcome, Phase};
use crate::error::{PipelineError, SelectionResult};
use crate::pipeline::CompilationPipeline;
use crate::sink::{OutputSink, OutputState};
use crate::state::AppState;
use crate::transforms::TransformSelection;
use relay_repl_schema::{complete_at, lint_operation, Completion, Diagnostic};
use std::sync::Arc;

/// Recompile loop without a runtime: the host decides when to call
/// [`Session::recompile`], typically from its own debounce timer.
#[derive(Debug, Default)]
pub struct Session {
    state: AppState,
    pipeline: CompilationPipeline,
    sink: OutputSink,
    phase: Phase,
    last_outcome: Option<Outcome>,
    stats: CycleStats,
    last_error: Option<PipelineError>,
}

impl Session {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            ..Default::default()
        }
    }

    /// Default buffers with the configured selection
    pub fn from_config(config: &PlaygroundConfig) -> SelectionResult<Self> {
        let state = AppState::default();
        let mut session = Self::new(state);
        let selection = config.selection()?;
        session.state.selection.set(selection);
        Ok(session)
    }

    pub fn set_schema_text(&mut self, text: impl Into<Arc<str>>) -> Revision {
        self.phase = Phase::Scheduled;
        self.state.schema.set_text(text)
    }

    pub fn set_operation_text(&mut self, text: impl Into<Arc<str>>) -> Revision {
        self.phase = Phase::Scheduled;
        self.state.operation.set_text(text)
    }

    pub fn toggle_transform(&mut self, name: &str) -> SelectionResult<bool> {
        let enabled = self.state.toggle_transform(name)?;
        self.phase = Phase::Scheduled;
        Ok(enabled)
    }

    pub fn set_transform_enabled(&mut self, name: &str, enabled: bool) -> SelectionResult<bool> {
        let changed = self.state.set_transform_enabled(name, enabled)?;
        if changed {
            self.phase = Phase::Scheduled;
        }
        Ok(changed)
    }

    /// Compile the current buffers. Returns whether the output was replaced.
    pub fn recompile(&mut self) -> bool {
        let request = self.state.request();
        self.phase = Phase::Running;
        let result = self.pipeline.compile(&request);
        self.last_error = result.error().cloned();
        let outcome = settle(
            &self.sink,
            &result,
            self.state.latest_generation(),
            &mut self.stats,
        );
        self.last_outcome = Some(outcome);
        self.phase = finish(self.phase);
        outcome == Outcome::Applied
    }

    pub fn output(&self) -> OutputState {
        self.sink.snapshot()
    }

    pub fn printed_text(&self) -> String {
        self.sink.printed_text()
    }

    pub fn selection(&self) -> &TransformSelection {
        self.state.selection.get()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// How the last cycle ended, if one has run
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Error of the last run, if it failed
    pub fn last_error(&self) -> Option<&PipelineError> {
        self.last_error.as_ref()
    }

    /// Lint the operation buffer against the last good schema
    pub fn lint(&self) -> Vec<Diagnostic> {
        match self.sink.schema() {
            Some(schema) => lint_operation(&schema, self.state.operation.text()),
            None => Vec::new(),
        }
    }

    pub fn complete_at(&self, offset: usize) -> Vec<Completion> {
        match self.sink.schema() {
            Some(schema) => complete_at(&schema, self.state.operation.text(), offset),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "type Query { me: User } type User { id: ID! name: String }";

    #[test]
    fn test_defaults_compile() {
        let mut session = Session::default();
        assert!(session.recompile());
        assert!(session.printed_text().starts_with("query UserProfile {"));
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.last_outcome(), Some(Outcome::Applied));
        assert!(session.output().schema.is_some());
    }

    #[test]
    fn test_failures_keep_last_good_output() {
        let mut session = Session::default();
        session.recompile();
        let good = session.printed_text();

        session.set_operation_text("query Broken { hero {");
        assert_eq!(session.phase(), Phase::Scheduled);
        assert!(!session.recompile());
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.last_outcome(), Some(Outcome::Discarded));
        assert_eq!(session.printed_text(), good);
        assert!(matches!(
            session.last_error(),
            Some(PipelineError::OperationParse(_))
        ));
        assert_eq!(
            session.stats(),
            CycleStats {
                runs: 2,
                applied: 1,
                discarded: 0,
                failed: 1
            }
        );

        session.set_operation_text("query Fixed { hero { id } }");
        assert!(session.recompile());
        assert!(session.last_error().is_none());
        assert!(session.printed_text().starts_with("query Fixed"));
    }

    #[test]
    fn test_recompiling_unchanged_buffers_is_refused() {
        let mut session = Session::default();
        assert!(session.recompile());
        assert!(!session.recompile());
        assert_eq!(session.stats().discarded, 1);
    }

    #[test]
    fn test_toggle_twice_restores_output() {
        let mut session = Session::default();
        session.recompile();
        let original = session.printed_text();

        session.toggle_transform("inline_fragments").unwrap();
        session.recompile();
        assert!(session.printed_text().contains("...CharacterData_"));

        session.toggle_transform("inline_fragments").unwrap();
        session.recompile();
        assert_eq!(session.printed_text(), original);
    }

    #[test]
    fn test_from_config_applies_disabled_transforms() {
        let config = PlaygroundConfig {
            disabled_transforms: vec!["inline_fragments".to_string()],
            ..Default::default()
        };
        let mut session = Session::from_config(&config).unwrap();
        assert_eq!(session.selection().is_enabled("inline_fragments"), Some(false));
        session.recompile();
        assert!(session.printed_text().contains("fragment CharacterData_"));
    }

    #[test]
    fn test_lint_uses_last_good_schema() {
        let mut session = Session::new(AppState::new(
            SCHEMA,
            "query Q { me { id } }",
            TransformSelection::default(),
        ));
        assert!(session.lint().is_empty());
        session.recompile();

        session.set_operation_text("query Q { me { id email } }");
        let diagnostics = session.lint();
        assert!(!diagnostics.is_empty());
        assert!(diagnostics.iter().any(|d| d.message.contains("email")));
    }

    #[test]
    fn test_completions_after_first_success() {
        let mut session = Session::new(AppState::new(
            SCHEMA,
            "query Q { me { id } }",
            TransformSelection::default(),
        ));
        assert!(session.complete_at(15).is_empty());
        session.recompile();
        let labels: Vec<_> = session
            .complete_at(15)
            .into_iter()
            .map(|completion| completion.label)
            .collect();
        assert!(labels.contains(&"name".to_string()));
    }

    #[test]
    fn test_deeply_nested_operation_is_a_parse_error() {
        let mut session = Session::default();
        session.recompile();
        let good = session.output();
        assert!(good.generation > Revision::INITIAL);

        let depth = 20_000;
        session.set_operation_text(format!(
            "query Deep {}id{}",
            "{ hero ".repeat(depth),
            " }".repeat(depth)
        ));
        assert!(!session.recompile());
        assert!(matches!(
            session.last_error(),
            Some(PipelineError::OperationParse(_))
        ));
        assert_eq!(session.printed_text(), good.printed_text);
        assert_eq!(session.output().generation, good.generation);
        assert_eq!(session.stats().failed, 1);
    }
}
