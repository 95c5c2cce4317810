use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use relay_repl_compiler::transforms::DEFAULT_TRANSFORMS;
use relay_repl_playground::defaults::{DEFAULT_OPERATION, DEFAULT_SCHEMA};
use relay_repl_playground::{PlaygroundConfig, TransformSelection};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Input flags shared by every command that compiles
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Schema SDL file (defaults to the built-in Star Wars schema)
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Operation document file (defaults to the built-in UserProfile query)
    #[arg(short, long)]
    pub operation: Option<PathBuf>,

    /// Config file (defaults to ./relay-repl.config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Switch a transform off (repeatable)
    #[arg(long = "disable", value_name = "NAME")]
    pub disabled: Vec<String>,

    /// Switch a transform on, overriding the config (repeatable)
    #[arg(long = "enable", value_name = "NAME")]
    pub enabled: Vec<String>,
}

/// One input buffer, from a file or built in
#[derive(Debug, Clone)]
pub struct Source {
    pub path: Option<PathBuf>,
    pub text: String,
}

impl Source {
    fn load(path: Option<PathBuf>, builtin: &str) -> Result<Self> {
        let text = match &path {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            None => builtin.to_string(),
        };
        Ok(Self { path, text })
    }

    pub fn name(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "<built-in>".to_string(),
        }
    }
}

/// Everything a compile needs, with flags applied over the config file
#[derive(Debug, Clone)]
pub struct Inputs {
    pub schema: Source,
    pub operation: Source,
    pub selection: TransformSelection,
    pub debounce: Duration,
}

impl Inputs {
    pub fn load(args: &InputArgs, cwd: &Path) -> Result<Self> {
        let (config, base) = match &args.config {
            Some(path) => {
                let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
                (Config::load_from(path)?, cwd.join(base))
            }
            None => (Config::load(cwd)?, cwd.to_path_buf()),
        };

        let schema_path = args
            .schema
            .as_ref()
            .map(|path| cwd.join(path))
            .or_else(|| config.schema_path(&base));
        let operation_path = args
            .operation
            .as_ref()
            .map(|path| cwd.join(path))
            .or_else(|| config.operation_path(&base));

        Ok(Self {
            schema: Source::load(schema_path, DEFAULT_SCHEMA)?,
            operation: Source::load(operation_path, DEFAULT_OPERATION)?,
            selection: selection(&config.playground, &args.disabled, &args.enabled)?,
            debounce: config.playground.debounce(),
        })
    }
}

/// Config switches first, then `--disable`, then `--enable`
pub fn selection(
    config: &PlaygroundConfig,
    disabled: &[String],
    enabled: &[String],
) -> Result<TransformSelection> {
    let mut selection = config.selection().map_err(unknown_transform)?;
    for name in disabled {
        selection.set_enabled(name, false).map_err(unknown_transform)?;
    }
    for name in enabled {
        selection.set_enabled(name, true).map_err(unknown_transform)?;
    }
    Ok(selection)
}

fn unknown_transform(err: impl std::fmt::Display) -> anyhow::Error {
    let available: Vec<_> = DEFAULT_TRANSFORMS.iter().map(|t| t.name).collect();
    anyhow!("{}. Available: {}", err, available.join(", "))
}
