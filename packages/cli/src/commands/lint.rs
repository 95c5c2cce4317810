use super::inputs::{InputArgs, Inputs};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use relay_repl_schema::{build_schema, lint_operation, Diagnostic, DiagnosticLevel};
use std::path::Path;

#[derive(Args, Debug)]
pub struct LintArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn lint(args: LintArgs, cwd: &Path) -> Result<()> {
    let inputs = Inputs::load(&args.inputs, cwd)?;

    let schema = build_schema(&inputs.schema.text).map_err(|err| {
        anyhow!(
            "Schema {} is invalid: {}",
            inputs.schema.name(),
            err
        )
    })?;
    let diagnostics = lint_operation(&schema, &inputs.operation.text);

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        println!("{}", inputs.operation.name());
        for diagnostic in &diagnostics {
            print_diagnostic(diagnostic, &inputs.operation.text);
        }

        println!();
        if errors == 0 && warnings == 0 {
            println!("  {} No issues found!", "✓".green());
        } else {
            if errors > 0 {
                println!("  {} {}", "Errors:".red(), errors);
            }
            if warnings > 0 {
                println!("  {} {}", "Warnings:".yellow(), warnings);
            }
        }
    }

    if errors > 0 {
        return Err(anyhow!("{} error(s) in {}", errors, inputs.operation.name()));
    }
    Ok(())
}

fn print_diagnostic(diagnostic: &Diagnostic, source: &str) {
    let level = match diagnostic.level {
        DiagnosticLevel::Error => "error".red().bold(),
        DiagnosticLevel::Warning => "warning".yellow().bold(),
    };
    let (line, column) = line_column(source, diagnostic.span.start);

    println!(
        "  {}:{} {} [{}] {}",
        line, column, level, diagnostic.rule, diagnostic.message
    );
    if let Some(suggestion) = &diagnostic.suggestion {
        println!("    {} {}", "help:".dimmed(), suggestion.dimmed());
    }
}

/// 1-based line and column of a byte offset
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |newline| {
            before[newline + 1..].chars().count()
        })
        + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let source = "query Q {\n  hero {\n    nope\n  }\n}";
        assert_eq!(line_column(source, 0), (1, 1));
        assert_eq!(line_column(source, 6), (1, 7));
        assert_eq!(line_column(source, source.find("nope").unwrap()), (3, 5));
        assert_eq!(line_column(source, 10_000), (5, 2));
    }
}
