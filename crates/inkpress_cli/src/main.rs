//! Inkpress migration CLI.
//!
//! # Commands
//!
//! - `migrate` - Apply every pending migration as one batch
//! - `rollback` - Revert the latest batch
//! - `status` - List declared migrations with their batch

use clap::{Parser, Subcommand};
use inkpress_core::{
    init_stderr_logging, open_store, Deadline, MigrationReport, Migrator, StoreConfig,
    StoreError,
};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Inkpress schema migration tools.
#[derive(Debug, Parser)]
#[command(name = "inkpress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(global = true, long, env = "INKPRESS_DB", default_value = "inkpress.db")]
    db: PathBuf,

    /// Log level written to stderr (trace, debug, info, warn, error)
    #[arg(global = true, long, default_value = "warn")]
    log_level: String,

    /// Abort the command after this many seconds
    #[arg(global = true, long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Commands {
    /// Apply all pending migrations
    Migrate,
    /// Revert the latest migration batch
    Rollback,
    /// Show applied and pending migrations
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_stderr_logging(&cli.log_level) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), StoreError> {
    let store = open_store(&StoreConfig::file(&cli.db))?;
    let deadline = cli
        .timeout_secs
        .map_or_else(Deadline::none, |secs| Deadline::after(Duration::from_secs(secs)));
    let migrator = Migrator::new(&store);

    match cli.command {
        Commands::Migrate => print_report("applied", &migrator.migrate(&deadline)?),
        Commands::Rollback => print_report("reverted", &migrator.rollback(&deadline)?),
        Commands::Status => {
            for status in migrator.status(&deadline)? {
                match status.batch {
                    Some(batch) => println!("{:<28} batch {batch}", status.name),
                    None => println!("{:<28} pending", status.name),
                }
            }
        }
    }
    Ok(())
}

fn print_report(verb: &str, report: &MigrationReport) {
    match report.batch {
        Some(batch) if !report.is_noop() => {
            println!("{verb} batch {batch}:");
            for name in &report.names {
                println!("  {name}");
            }
        }
        _ => println!("nothing to do"),
    }
}
