//! PID Registry for Havenbrowser.
//!
//! Reads and writes process-identity markers (`browser.pid`, `watchdog.pid`)
//! under the application data directory, and probes liveness of recorded
//! pids so each role can detect an already-running peer at startup.
//!
//! There is no lock between the peer check and the record write. The worst
//! case of that race is a brief double instance that self-resolves when the
//! loser's next liveness probe finds the other alive — accepted for
//! single-user desktop use.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::platform;
use crate::types::errors::RegistryError;
use crate::types::process::{ProcessKind, ProcessRecord};

/// Trait defining the PID registry interface.
pub trait PidRegistryTrait {
    fn write_record(&self, kind: ProcessKind, pid: u32);
    fn read_record(&self, kind: ProcessKind) -> Option<ProcessRecord>;
    fn is_alive(&self, pid: u32) -> bool;
    fn is_peer_running(&self, kind: ProcessKind) -> bool;
    fn delete_record(&self, kind: ProcessKind);
    fn record_path(&self, kind: ProcessKind) -> PathBuf;
}

/// PID registry bound to one directory of record files.
#[derive(Debug, Clone)]
pub struct PidRegistry {
    dir: PathBuf,
}

impl PidRegistry {
    /// Creates a registry over the given directory.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a registry over the platform data directory.
    pub fn at_data_dir() -> Self {
        Self::new(platform::get_data_dir())
    }

    fn try_write(path: &Path, pid: u32) -> Result<(), RegistryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| RegistryError::IoError(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        fs::write(path, pid.to_string())
            .map_err(|e| RegistryError::IoError(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn try_read(path: &Path) -> Result<u32, RegistryError> {
        let content = fs::read_to_string(path)
            .map_err(|e| RegistryError::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        content
            .trim()
            .parse::<u32>()
            .map_err(|e| RegistryError::ParseError(format!("{}: {}", path.display(), e)))
    }
}

impl PidRegistryTrait for PidRegistry {
    /// Records `pid` for `kind`, overwriting any previous record.
    ///
    /// Failure here must not crash the caller: errors are logged and the
    /// registry proceeds as if the record were simply absent.
    fn write_record(&self, kind: ProcessKind, pid: u32) {
        let path = self.record_path(kind);
        if let Err(e) = Self::try_write(&path, pid) {
            warn!(pid, file = %path.display(), "could not write PID record: {}", e);
        }
    }

    /// Returns the recorded pid for `kind`, or `None` when the record file
    /// is missing or unparsable.
    fn read_record(&self, kind: ProcessKind) -> Option<ProcessRecord> {
        let path = self.record_path(kind);
        if !path.exists() {
            return None;
        }
        match Self::try_read(&path) {
            Ok(pid) => Some(ProcessRecord { pid, kind }),
            Err(e) => {
                debug!(file = %path.display(), "ignoring unreadable PID record: {}", e);
                None
            }
        }
    }

    /// Zero-effect liveness probe. Any probe failure reads as "not alive".
    fn is_alive(&self, pid: u32) -> bool {
        platform::process_alive(pid)
    }

    /// Returns true when another live process already owns the `kind` role.
    ///
    /// A record naming a dead pid is stale: it is deleted best-effort and
    /// treated as absent. A record naming this very process is not a peer.
    fn is_peer_running(&self, kind: ProcessKind) -> bool {
        let Some(record) = self.read_record(kind) else {
            return false;
        };
        if record.pid != std::process::id() && self.is_alive(record.pid) {
            debug!(pid = record.pid, role = ?kind, "found running peer");
            return true;
        }
        debug!(pid = record.pid, role = ?kind, "cleaning up stale PID record");
        self.delete_record(kind);
        false
    }

    /// Best-effort removal of the `kind` record.
    fn delete_record(&self, kind: ProcessKind) {
        let path = self.record_path(kind);
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                warn!(file = %path.display(), "could not delete PID record: {}", e);
            }
        }
    }

    /// Path of the record file for `kind`.
    fn record_path(&self, kind: ProcessKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}
