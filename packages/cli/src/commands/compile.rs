use super::inputs::{InputArgs, Inputs};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use relay_repl_playground::{CompilationPipeline, PipelineError};
use relay_repl_schema::SchemaError;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct CompileArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Write the printed documents to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn compile(args: CompileArgs, cwd: &Path) -> Result<()> {
    let inputs = Inputs::load(&args.inputs, cwd)?;

    eprintln!(
        "{} {} with {}",
        "Compiling".bright_blue().bold(),
        inputs.operation.name(),
        enabled_list(&inputs)
    );

    let compiled = CompilationPipeline::new()
        .run(&inputs.schema.text, &inputs.operation.text, &inputs.selection)
        .map_err(|err| anyhow!("\n{}", render_error(&err, &inputs)))?;

    match &args.out {
        Some(out) => {
            let out = cwd.join(out);
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&out, &compiled.printed_text)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            eprintln!("  {} {}", "✓".green(), out.display());
        }
        None => print!("{}", compiled.printed_text),
    }

    Ok(())
}

fn enabled_list(inputs: &Inputs) -> String {
    let names = inputs.selection.enabled_names();
    if names.is_empty() {
        "no transforms".to_string()
    } else {
        names.join(", ")
    }
}

/// Syntax errors get a source excerpt; the rest are one line
pub fn render_error(err: &PipelineError, inputs: &Inputs) -> String {
    match err {
        PipelineError::SchemaParse(SchemaError::Parse(parse)) => {
            parse.render(&inputs.schema.text, &inputs.schema.name())
        }
        PipelineError::OperationParse(parse) => {
            parse.render(&inputs.operation.text, &inputs.operation.name())
        }
        other => other.to_string(),
    }
}
