//! hotkeyd-migrate: offline transformations over the shortcut
//! configuration file.
//!
//! One subcommand, `move`, relocates or renames component groups and
//! entries. The operation is atomic per run: the file is rewritten and
//! synced once at the end.

use std::process::ExitCode;

use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing::error;

mod move_cmd;
mod select;

#[derive(Debug, Parser)]
#[command(name = "hotkeyd-migrate", about = "Rewrite the hotkeyd shortcut configuration")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    log: logging::LogArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Move or rename component groups and their entries.
    Move(MoveArgs),
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["target_component", "target_desktop_file"]),
))]
pub struct MoveArgs {
    /// Path to the shortcut configuration file
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Source component: a glob over a slash-separated group path
    #[arg(long)]
    pub source_component: String,

    /// Source action; all actions of the matched groups when omitted
    #[arg(long)]
    pub source_action: Option<String>,

    /// Destination group path; a trailing slash keeps the source basename
    #[arg(long)]
    pub target_component: Option<String>,

    /// New action name in the destination
    #[arg(long)]
    pub target_action: Option<String>,

    /// Destination desktop file; overrides the target group and derives the
    /// default shortcut and display name from the entry
    #[arg(long)]
    pub target_desktop_file: Option<String>,

    /// Action of the destination desktop file
    #[arg(long)]
    pub target_desktop_file_action: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log.spec());

    let result = match cli.command {
        Command::Move(args) => move_cmd::run(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "migration failed");
            ExitCode::FAILURE
        }
    }
}
