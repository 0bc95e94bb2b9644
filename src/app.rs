//! App Core for Havenbrowser.
//!
//! Central struct holding the UI process's shared services and managing its
//! lifecycle: settings, the PID registry used as the in-process singleton
//! guard, and the snapshot store.

use std::path::PathBuf;

use tracing::warn;

use crate::platform;
use crate::services::pid_registry::{PidRegistry, PidRegistryTrait};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::snapshot_store::{SnapshotStore, SNAPSHOT_FILE_NAME};
use crate::types::process::ProcessKind;

/// Central application struct for the UI process.
///
/// The session controller is not stored here: it is generic over the UI
/// host and is constructed by the binary that owns the event loop, with the
/// snapshot store handed over from this struct.
pub struct App {
    pub settings_engine: SettingsEngine,
    pub pid_registry: PidRegistry,
    data_dir: PathBuf,
}

impl App {
    /// Creates a new App over the platform config and data directories.
    pub fn new() -> Self {
        Self::with_dirs(None, platform::get_data_dir())
    }

    /// Creates a new App with explicit locations, for tests and tooling.
    pub fn with_dirs(settings_path: Option<String>, data_dir: PathBuf) -> Self {
        Self {
            settings_engine: SettingsEngine::new(settings_path),
            pid_registry: PidRegistry::new(data_dir.clone()),
            data_dir,
        }
    }

    /// Builds the snapshot store for this App's data directory.
    pub fn snapshot_store(&self) -> SnapshotStore {
        let pretty = self.settings_engine.get_settings().session.snapshot_pretty;
        SnapshotStore::new(self.data_dir.join(SNAPSHOT_FILE_NAME), pretty)
    }

    /// Startup sequence: load settings, then claim the main-process role.
    ///
    /// Returns false when a live peer already owns the role, in which case
    /// this instance must exit instead of opening a second session. The
    /// window between the peer check and the record write is unlocked; the
    /// worst case is a brief double instance that resolves itself at the
    /// next liveness probe.
    pub fn startup(&mut self) -> bool {
        if let Err(e) = self.settings_engine.load() {
            warn!("could not load settings, using defaults: {}", e);
        }

        if self.pid_registry.is_peer_running(ProcessKind::Main) {
            warn!("another browser instance is already running");
            return false;
        }
        self.pid_registry
            .write_record(ProcessKind::Main, std::process::id());
        true
    }

    /// Shutdown sequence: release the main-process role.
    pub fn shutdown(&mut self) {
        self.pid_registry.delete_record(ProcessKind::Main);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
