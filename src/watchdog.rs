//! Havenbrowser watchdog process.
//!
//! Keeps the main browser process alive: spawns it, restarts it after a
//! fixed backoff within a bounded retry budget when it exits unexpectedly,
//! and yields to an already-running browser instance instead of spawning a
//! duplicate. SIGINT/SIGTERM trigger a graceful shutdown that terminates
//! the child, escalates to a forceful kill after a grace period, and cleans
//! up both PID records.

use std::time::Instant;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use havenbrowser::services::pid_registry::{PidRegistry, PidRegistryTrait};
use havenbrowser::services::process_supervisor::{
    BrowserSpawner, ProcessSupervisor, SupervisorConfig,
};
use havenbrowser::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use havenbrowser::types::process::{ProcessKind, SupervisorState};

fn main() {
    init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to build tokio runtime: {}", e);
            std::process::exit(1);
        }
    };
    runtime.block_on(run());
}

async fn run() {
    let registry = PidRegistry::at_data_dir();

    // One watchdog per data directory.
    if registry.is_peer_running(ProcessKind::Watchdog) {
        info!("another watchdog is already running, exiting");
        return;
    }
    registry.write_record(ProcessKind::Watchdog, std::process::id());
    info!(pid = std::process::id(), "watchdog started");

    let mut settings_engine = SettingsEngine::new(None);
    if let Err(e) = settings_engine.load() {
        warn!("could not load settings, using defaults: {}", e);
    }
    let settings = settings_engine.get_settings();
    let config = SupervisorConfig::from(&settings.supervisor);
    let spawner = BrowserSpawner::sibling_browser(settings.general.start_hidden);

    let mut supervisor = ProcessSupervisor::new(spawner, registry.clone(), config.clone());
    supervisor.start(Instant::now());

    let mut interval = tokio::time::interval(config.health_check_interval);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut signalled = false;

    loop {
        tokio::select! {
            () = &mut shutdown, if !signalled => {
                signalled = true;
                supervisor.shutdown(Instant::now());
            }
            _ = interval.tick() => {
                supervisor.tick(Instant::now());
            }
        }
        if supervisor.state() == SupervisorState::Stopped {
            break;
        }
    }

    registry.delete_record(ProcessKind::Watchdog);
    info!("watchdog exited");
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("failed to register SIGTERM handler, using ctrl-c only: {}", e);
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = ctrl_c.await {
            warn!("ctrl-c signal handler failed: {}", e);
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
}
