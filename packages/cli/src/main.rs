mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{replay, validate, ReplayArgs, ValidateArgs};
use folio_editor::EditorConfig;
use tracing_subscriber::EnvFilter;

/// Folio CLI - inspect and replay block documents
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing folio.config.json
    #[arg(short, long, global = true, default_value = ".")]
    config: PathBuf,

    /// Log editor internals at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check document JSON files for structural errors
    Validate(ValidateArgs),

    /// Apply a list of actions to a document and print the events
    Replay(ReplayArgs),
}

fn init_logging(config: &EditorConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = EditorConfig::load(&cli.config)?;
    init_logging(&config, cli.verbose);

    match cli.command {
        Command::Validate(args) => validate(args, &config),
        Command::Replay(args) => replay(args, &config),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
