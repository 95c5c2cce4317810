use anyhow::{Context, Result};
use relay_repl_playground::PlaygroundConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "relay-repl.config.json";

/// Relay REPL configuration file format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Schema SDL file, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Operation document file, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    #[serde(flatten)]
    pub playground: PlaygroundConfig,
}

impl Config {
    /// Load `relay-repl.config.json` from `cwd`, or the defaults if there is none
    pub fn load(cwd: &Path) -> Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn schema_path(&self, base: &Path) -> Option<PathBuf> {
        self.schema.as_ref().map(|path| base.join(path))
    }

    pub fn operation_path(&self, base: &Path) -> Option<PathBuf> {
        self.operation.as_ref().map(|path| base.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "schema": "schema.graphql",
            "operation": "queries/profile.graphql",
            "debounceMs": 75,
            "disabledTransforms": ["flatten", "skip_redundant_nodes"]
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.schema.as_deref(), Some("schema.graphql"));
        assert_eq!(
            config.operation_path(Path::new("/work")),
            Some(PathBuf::from("/work/queries/profile.graphql"))
        );
        assert_eq!(config.playground.debounce_ms, 75);
        assert_eq!(
            config.playground.disabled_transforms,
            vec!["flatten", "skip_redundant_nodes"]
        );
    }

    #[test]
    fn test_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.schema_path(Path::new(".")).is_none());
        assert_eq!(config.playground.debounce_ms, 200);
    }
}
