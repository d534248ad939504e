//! Rook CLI - offline access to a scorekeeper data directory.
//!
//! Every command loads the active game and history from the JSON files in
//! `--data-dir`, runs one operation and prints the result as JSON.

mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use commands::Command;
use output::{Output, OutputFormat};
use scorekeeper::{telemetry, AppError, JsonFileStore, Scorekeeper};
use tracing::{debug, error};

#[derive(Debug, Parser)]
#[command(name = "rook")]
#[command(about = "Rook scorekeeper: scoring, history and statistics")]
struct Args {
    /// Directory holding the JSON data files
    #[arg(long, default_value = "./rook-data")]
    data_dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log what each command does
    #[arg(long)]
    show_output: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Silent by default, only warnings and errors
    let filter = if args.verbose {
        "debug"
    } else if args.show_output {
        "info"
    } else {
        "warn"
    };
    telemetry::init_tracing(filter);

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(code = err.code(), "{err}");
            eprintln!("{}: {err}", err.code());
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<(), AppError> {
    debug!(data_dir = %args.data_dir.display(), "Opening data directory");
    let store = JsonFileStore::open(&args.data_dir)?;
    let mut keeper = Scorekeeper::open(store)?;
    keeper.apply_env_overrides();

    let stdout = std::io::stdout();
    let mut out = Output::new(args.format, stdout.lock());
    commands::run(&mut keeper, args.command, &mut out)
}
