//! Daemon startup and the control-bus server loop.

use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use cfgtree::ConfigFile;
use hotkeyd_registry::{CommandLauncher, Registry};
use mrpc::Server as MrpcServer;
use parking_lot::Mutex;
use tokio::{net::UnixStream, select, signal, time::sleep};
use tracing::{debug, info, warn};

use crate::{Cli, Error, PLATFORM_ENV, Result, TEST_MODE_ENV, service::RegistryService};

/// Per-user control socket path.
fn default_socket_path() -> PathBuf {
    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/tmp/hotkeyd-{}.sock", uid))
}

/// The daemon is a singleton per user: a live socket means another instance
/// owns the session; a dead file is stale and removed.
async fn ensure_singleton(socket_path: &Path) -> Result<()> {
    match UnixStream::connect(socket_path).await {
        Ok(_) => Err(Error::AlreadyRunning),
        Err(_) => {
            let _ = fs::remove_file(socket_path);
            Ok(())
        }
    }
}

fn config_file(cli: &Cli) -> Result<ConfigFile> {
    if let Some(path) = &cli.config {
        return Ok(ConfigFile::open(path)?);
    }
    if env::var_os(TEST_MODE_ENV).is_some() {
        // Test mode: leave the file name unset; the test drives `--config`.
        return Ok(ConfigFile::in_memory());
    }
    let path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hotkeydrc");
    Ok(ConfigFile::open(path)?)
}

/// XDG data directories, most specific first, each joined with `suffix`.
fn data_dirs(suffix: &str) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Some(home) = dirs::data_dir() {
        dirs.push(home.join(suffix));
    }
    let system = env::var("XDG_DATA_DIRS")
        .unwrap_or_else(|_| "/usr/local/share:/usr/share".to_string());
    for dir in system.split(':').filter(|d| !d.is_empty()) {
        dirs.push(PathBuf::from(dir).join(suffix));
    }
    dirs
}

fn build_registry(cli: &Cli) -> Result<(Registry, tokio::sync::mpsc::UnboundedReceiver<hotkeyd_protocol::ShortcutEvent>)> {
    let platform = cli
        .platform
        .clone()
        .or_else(|| env::var(PLATFORM_ENV).ok())
        .unwrap_or_else(|| "x11".to_string());
    let backend = match capture::load_backend(&platform) {
        Ok(backend) => Some(backend),
        Err(e) => {
            // Latched: the daemon keeps serving IPC without grabbing.
            warn!(error = %e, "running without a capture backend");
            None
        }
    };

    let config = config_file(cli)?;
    let (mut registry, events) = Registry::new(backend, config, Box::new(CommandLauncher));
    registry.set_service_dirs(data_dirs("hotkeyd"));
    registry.set_application_dirs(data_dirs("applications"));

    let hotkeys_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hotkeysrc");
    let hotkeys = if hotkeys_path.is_file() {
        Some(ConfigFile::open(&hotkeys_path)?)
    } else {
        None
    };
    let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    registry.run_startup_migrations(hotkeys.as_ref(), &data_dir)?;

    registry.load_settings()?;
    registry.activate_shortcuts();
    Ok((registry, events))
}

/// Completes when a termination signal arrives or the service flips the
/// shutdown flag (`shutdown` RPC).
async fn wait_for_shutdown(flag: Arc<AtomicBool>) {
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM");
            // Fall back to the flag poll only.
            loop {
                if flag.load(Ordering::SeqCst) {
                    return;
                }
                sleep(Duration::from_millis(50)).await;
            }
        }
    };
    select! {
        _ = signal::ctrl_c() => debug!("SIGINT received"),
        _ = sigterm.recv() => debug!("SIGTERM received"),
        _ = async {
            while !flag.load(Ordering::SeqCst) {
                sleep(Duration::from_millis(50)).await;
            }
        } => debug!("shutdown requested over the bus"),
    }
}

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let socket_path = cli.socket.clone().unwrap_or_else(default_socket_path);
    ensure_singleton(&socket_path).await?;

    let (registry, events) = build_registry(&cli)?;
    let registry = Arc::new(Mutex::new(registry));
    let shutdown = Arc::new(AtomicBool::new(false));

    let service = RegistryService::new(registry.clone(), shutdown.clone());
    service.start_event_forwarder(events);

    let server = {
        let service = service.clone();
        MrpcServer::from_fn(move || service.clone())
            .unix(&socket_path)
            .await
            .map_err(|e| Error::Ipc(format!("failed to bind {}: {}", socket_path.display(), e)))?
    };
    info!(socket = %socket_path.display(), "listening");

    let result = select! {
        res = server.run() => res.map_err(|e| Error::Ipc(format!("server error: {}", e))),
        _ = wait_for_shutdown(shutdown.clone()) => Ok(()),
    };

    // Persist on the way out; grabs are torn down by the registry itself.
    if let Err(e) = registry.lock().write_settings() {
        warn!(error = %e, "failed to write settings on shutdown");
    }
    let _ = fs::remove_file(&socket_path);
    result
}
