use crate::error::SelectionResult;
use crate::transforms::TransformSelection;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playground settings, read from `relay-repl.config.json` by the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaygroundConfig {
    /// Quiet period after the last edit before recompiling
    pub debounce_ms: u64,

    /// Selectable transforms that start switched off
    pub disabled_transforms: Vec<String>,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            disabled_transforms: Vec::new(),
        }
    }
}

impl PlaygroundConfig {
    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The default selection with `disabled_transforms` switched off
    pub fn selection(&self) -> SelectionResult<TransformSelection> {
        let mut selection = TransformSelection::default();
        for name in &self.disabled_transforms {
            selection.set_enabled(name, false)?;
        }
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SelectionError;

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = PlaygroundConfig::from_json("{}").unwrap();
        assert_eq!(config, PlaygroundConfig::default());
        assert_eq!(config.debounce(), Duration::from_millis(200));
    }

    #[test]
    fn test_camel_case_keys() {
        let config = PlaygroundConfig::from_json(
            r#"{ "debounceMs": 50, "disabledTransforms": ["flatten"] }"#,
        )
        .unwrap();
        assert_eq!(config.debounce_ms, 50);
        let selection = config.selection().unwrap();
        assert_eq!(selection.is_enabled("flatten"), Some(false));
        assert_eq!(selection.is_enabled("inline_fragments"), Some(true));
    }

    #[test]
    fn test_unknown_transform_names_are_errors() {
        let config = PlaygroundConfig {
            disabled_transforms: vec!["minify".to_string()],
            ..Default::default()
        };
        assert_eq!(
            config.selection().unwrap_err(),
            SelectionError::UnknownTransform {
                name: "minify".to_string()
            }
        );
    }
}
