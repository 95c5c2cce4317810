use crate::buffer::{EditClock, EditableBuffer, Revision};
use crate::defaults::{DEFAULT_OPERATION, DEFAULT_SCHEMA};
use crate::error::SelectionResult;
use crate::pipeline::CompilationRequest;
use crate::transforms::TransformSelection;
use std::sync::Arc;

/// The three input buffers of a session, drawing revisions from one clock
#[derive(Debug)]
pub struct AppState {
    pub schema: EditableBuffer<Arc<str>>,
    pub operation: EditableBuffer<Arc<str>>,
    pub selection: EditableBuffer<TransformSelection>,
    clock: EditClock,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA, DEFAULT_OPERATION, TransformSelection::default())
    }
}

impl AppState {
    pub fn new(
        schema: impl Into<Arc<str>>,
        operation: impl Into<Arc<str>>,
        selection: TransformSelection,
    ) -> Self {
        let clock = EditClock::new();
        Self {
            schema: EditableBuffer::new(clock.clone(), schema.into()),
            operation: EditableBuffer::new(clock.clone(), operation.into()),
            selection: EditableBuffer::new(clock.clone(), selection),
            clock,
        }
    }

    /// Snapshot all three buffers
    pub fn request(&self) -> CompilationRequest {
        CompilationRequest {
            schema: self.schema.snapshot(),
            operation: self.operation.snapshot(),
            selection: self.selection.snapshot(),
        }
    }

    /// Generation of the newest edit
    pub fn latest_generation(&self) -> Revision {
        self.clock.current()
    }

    pub fn toggle_transform(&mut self, name: &str) -> SelectionResult<bool> {
        let mut selection = self.selection.get().clone();
        let enabled = selection.toggle(name)?;
        self.selection.set(selection);
        Ok(enabled)
    }

    /// Writes the selection only if the switch changes
    pub fn set_transform_enabled(&mut self, name: &str, enabled: bool) -> SelectionResult<bool> {
        let mut selection = self.selection.get().clone();
        let changed = selection.set_enabled(name, enabled)?;
        if changed {
            self.selection.set(selection);
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_generation_is_latest_edit() {
        let mut state = AppState::default();
        assert_eq!(state.request().revisions().generation(), state.latest_generation());

        let revision = state.operation.set_text("query Q { hero { id } }");
        let request = state.request();
        assert_eq!(request.revisions().generation(), revision);
        assert_eq!(&*request.operation.value, "query Q { hero { id } }");
    }

    #[test]
    fn test_unknown_toggle_does_not_bump_revision() {
        let mut state = AppState::default();
        let before = state.latest_generation();
        assert!(state.toggle_transform("nope").is_err());
        assert_eq!(state.latest_generation(), before);

        assert_eq!(state.set_transform_enabled("flatten", true), Ok(false));
        assert_eq!(state.latest_generation(), before);

        assert_eq!(state.toggle_transform("flatten"), Ok(false));
        assert!(state.latest_generation() > before);
    }
}
