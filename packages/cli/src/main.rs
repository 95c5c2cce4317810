mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    compile, lint, transforms, watch, CompileArgs, LintArgs, TransformsArgs, WatchArgs,
};
use tracing_subscriber::EnvFilter;

/// Relay REPL - see what the Relay compiler does to your GraphQL
#[derive(Parser, Debug)]
#[command(name = "relay-repl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log pipeline activity to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile an operation once and print the result
    Compile(CompileArgs),

    /// Recompile whenever the schema or operation file changes
    Watch(WatchArgs),

    /// List the transforms and whether each is enabled
    Transforms(TransformsArgs),

    /// Check an operation against the schema
    Lint(LintArgs),
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Compile(args) => compile(args, &cwd),
            Command::Watch(args) => watch(args, &cwd),
            Command::Transforms(args) => transforms(args, &cwd),
            Command::Lint(args) => lint(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
