//! hotkeyd: the per-session global shortcut daemon.
//!
//! Process lifecycle only lives here; everything interesting happens in
//! `hotkeyd-registry`. The daemon bails out silently on Wayland sessions
//! (the compositor performs the capture itself), takes a per-user control
//! socket as its singleton lock, loads and migrates the configuration,
//! then serves the control bus until a signal or shutdown request arrives.

use std::{env, path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing::error;

mod error;
mod server;
mod service;

pub(crate) use error::{Error, Result};

/// Environment variable selecting the capture platform.
const PLATFORM_ENV: &str = "HOTKEYD_PLATFORM";
/// When set, the configuration file name is left unset so tests supply
/// their own path via `--config`.
const TEST_MODE_ENV: &str = "HOTKEYD_TEST_MODE";

#[derive(Debug, Parser)]
#[command(name = "hotkeyd", about = "Per-session global shortcut daemon")]
struct Cli {
    /// Path to the shortcuts configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Capture platform (defaults to $HOTKEYD_PLATFORM, then the running
    /// windowing platform)
    #[arg(long)]
    platform: Option<String>,

    /// Control socket path override
    #[arg(long)]
    socket: Option<PathBuf>,

    #[command(flatten)]
    log: logging::LogArgs,
}

fn main() -> ExitCode {
    // On Wayland the compositor performs the capture itself; no-op when
    // started there.
    if env::var("XDG_SESSION_TYPE").as_deref() == Ok("wayland") {
        return ExitCode::SUCCESS;
    }

    let cli = Cli::parse();
    logging::init(&cli.log.spec());

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start the event loop");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server::run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "daemon exited with an error");
            ExitCode::FAILURE
        }
    }
}
