use crate::error::{SelectionError, SelectionResult};
use relay_repl_compiler::transforms::{Transform, DEFAULT_TRANSFORMS};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformToggle {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub enabled: bool,
    #[serde(skip)]
    transform: &'static Transform,
}

impl TransformToggle {
    pub fn transform(&self) -> &'static Transform {
        self.transform
    }
}

/// Ordered on/off switches over the selectable transforms.
///
/// The order is fixed at construction; toggling never reorders.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct TransformSelection {
    entries: Vec<TransformToggle>,
}

impl Default for TransformSelection {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSFORMS)
    }
}

impl TransformSelection {
    /// Every transform starts enabled
    pub fn new(transforms: &[&'static Transform]) -> Self {
        let mut entries: Vec<TransformToggle> = Vec::with_capacity(transforms.len());
        for &transform in transforms {
            if entries.iter().any(|entry| entry.name == transform.name) {
                continue;
            }
            entries.push(TransformToggle {
                name: transform.name,
                title: transform.title,
                description: transform.description,
                enabled: true,
                transform,
            });
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[TransformToggle] {
        &self.entries
    }

    /// Flip one switch and return its new state
    pub fn toggle(&mut self, name: &str) -> SelectionResult<bool> {
        let entry = self.entry_mut(name)?;
        entry.enabled = !entry.enabled;
        Ok(entry.enabled)
    }

    /// Returns whether the switch changed
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> SelectionResult<bool> {
        let entry = self.entry_mut(name)?;
        let changed = entry.enabled != enabled;
        entry.enabled = enabled;
        Ok(changed)
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.enabled)
    }

    /// Enabled transforms in declared order
    pub fn enabled(&self) -> Vec<&'static Transform> {
        self.entries
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| entry.transform)
            .collect()
    }

    pub fn enabled_names(&self) -> Vec<&'static str> {
        self.enabled().iter().map(|transform| transform.name).collect()
    }

    fn entry_mut(&mut self, name: &str) -> SelectionResult<&mut TransformToggle> {
        self.entries
            .iter_mut()
            .find(|entry| entry.name == name)
            .ok_or_else(|| SelectionError::UnknownTransform {
                name: name.to_string(),
            })
    }
}

impl PartialEq for TransformSelection {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.name == b.name && a.enabled == b.enabled)
    }
}
