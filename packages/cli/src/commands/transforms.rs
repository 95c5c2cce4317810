use super::inputs::{InputArgs, Inputs};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use relay_repl_compiler::transforms::MANDATORY_TRANSFORMS;
use std::path::Path;

#[derive(Debug, Args)]
pub struct TransformsArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Print the selection as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn transforms(args: TransformsArgs, cwd: &Path) -> Result<()> {
    let inputs = Inputs::load(&args.inputs, cwd)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&inputs.selection)?);
        return Ok(());
    }

    println!("{}", "Always applied".bold());
    for transform in MANDATORY_TRANSFORMS {
        println!(
            "  {} {:<26} {}",
            "•".dimmed(),
            transform.name,
            transform.description.dimmed()
        );
    }

    println!();
    println!("{}", "Selectable, in order".bold());
    for entry in inputs.selection.entries() {
        let mark = if entry.enabled {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "  {} {:<26} {}",
            mark,
            entry.name,
            entry.description.dimmed()
        );
    }

    Ok(())
}
