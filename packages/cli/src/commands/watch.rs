use super::inputs::{InputArgs, Inputs};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use relay_repl_playground::{AppState, Orchestrator, OutputState};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Clear the terminal before each new output
    #[arg(long)]
    pub clear: bool,
}

/// Which buffer a file feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Buffer {
    Schema,
    Operation,
}

pub fn watch(args: WatchArgs, cwd: &Path) -> Result<()> {
    let inputs = Inputs::load(&args.inputs, cwd)?;

    let mut files = Vec::new();
    if let Some(path) = &inputs.schema.path {
        files.push((canonical(path), Buffer::Schema));
    }
    if let Some(path) = &inputs.operation.path {
        files.push((canonical(path), Buffer::Operation));
    }
    if files.is_empty() {
        return Err(anyhow!(
            "Nothing to watch: pass --schema and/or --operation, or set them in the config file"
        ));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    runtime.block_on(run(inputs, files, args.clear))
}

async fn run(inputs: Inputs, files: Vec<(PathBuf, Buffer)>, clear: bool) -> Result<()> {
    let state = AppState::new(
        inputs.schema.text.as_str(),
        inputs.operation.text.as_str(),
        inputs.selection.clone(),
    );
    let mut orchestrator = Orchestrator::new(state, inputs.debounce);
    let mut output = orchestrator.subscribe();

    let (tx, mut events) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        NotifyConfig::default(),
    )?;
    // Editors often replace files, so watch the directories
    for (path, _) in &files {
        let dir = path.parent().unwrap_or(Path::new("."));
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
    }

    eprintln!(
        "{} {} (debounce {} ms, Ctrl-C to stop)",
        "Watching".bright_blue().bold(),
        files
            .iter()
            .map(|(path, _)| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
        inputs.debounce.as_millis()
    );
    orchestrator.recompile();

    loop {
        tokio::select! {
            Some(event) = events.recv() => match event {
                Ok(event) => apply_event(&mut orchestrator, &files, &event),
                Err(err) => warn!(error = %err, "watch error"),
            },
            changed = output.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = output.borrow_and_update().clone();
                print_output(&state, clear);
            }
            _ = tokio::signal::ctrl_c() => {
                orchestrator.shutdown();
                eprintln!();
                eprintln!("{}", "Stopped".dimmed());
                break;
            }
        }
    }

    Ok(())
}

/// Feed a changed file into its buffer, like a keystroke would
fn apply_event(orchestrator: &mut Orchestrator, files: &[(PathBuf, Buffer)], event: &Event) {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return;
    }
    for (path, buffer) in files {
        if !event.paths.iter().any(|changed| canonical(changed) == *path) {
            continue;
        }
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read changed file");
                continue;
            }
        };
        let revision = match buffer {
            Buffer::Schema => orchestrator.set_schema_text(text),
            Buffer::Operation => orchestrator.set_operation_text(text),
        };
        debug!(path = %path.display(), %revision, "file changed");
    }
}

fn print_output(state: &OutputState, clear: bool) {
    if clear {
        print!("\x1B[2J\x1B[H");
    }
    println!("{}", format!("── {} ──", state.generation).dimmed());
    print!("{}", state.printed_text);
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
