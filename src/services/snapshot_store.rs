//! Snapshot Store for Havenbrowser.
//!
//! Persists the ordered list of open-page descriptors to `last-tabs.json`
//! under the application data directory so the session controller can
//! restore them after a restart.
//!
//! Persistence is best-effort: a failed save is logged and swallowed, and a
//! missing, unreadable, or malformed file loads as an empty snapshot. The
//! file is rewritten whole on every save, so a concurrent reader that
//! catches a partial write simply sees a malformed file and falls back to
//! empty.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::platform;
use crate::types::errors::SnapshotError;
use crate::types::session::{SessionSnapshot, TabSnapshot};
use crate::types::tab::{TabState, BLANK_PAGE_URL};

/// File name of the snapshot inside the data directory.
pub const SNAPSHOT_FILE_NAME: &str = "last-tabs.json";

/// Trait defining the snapshot store interface.
pub trait SnapshotStoreTrait {
    fn save(&self, tabs: &[TabState]);
    fn load(&self) -> Vec<TabSnapshot>;
    fn snapshot_path(&self) -> &Path;
}

/// Snapshot store bound to one JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    pretty: bool,
}

impl SnapshotStore {
    /// Creates a store writing to the given file.
    pub fn new<P: Into<PathBuf>>(path: P, pretty: bool) -> Self {
        Self {
            path: path.into(),
            pretty,
        }
    }

    /// Creates a store over `last-tabs.json` in the platform data directory.
    pub fn at_data_dir(pretty: bool) -> Self {
        Self::new(platform::get_data_dir().join(SNAPSHOT_FILE_NAME), pretty)
    }

    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    /// Maps live tab state to its persisted form. The in-memory blank
    /// marker becomes an empty url, and an empty title falls back to the
    /// default tab label.
    fn to_snapshot(state: &TabState) -> TabSnapshot {
        let url = if state.url == BLANK_PAGE_URL {
            String::new()
        } else {
            state.url.clone()
        };
        let title = if state.title.is_empty() {
            "New Tab".to_string()
        } else {
            state.title.clone()
        };
        TabSnapshot {
            id: state.id,
            url,
            title,
        }
    }

    fn try_save(&self, tabs: &[TabState]) -> Result<(), SnapshotError> {
        let snapshot = SessionSnapshot {
            timestamp: Self::now_millis(),
            tabs: tabs.iter().map(Self::to_snapshot).collect(),
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&snapshot)
        } else {
            serde_json::to_string(&snapshot)
        }
        .map_err(|e| SnapshotError::SerializationError(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SnapshotError::IoError(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        fs::write(&self.path, json)
            .map_err(|e| SnapshotError::IoError(format!("Failed to write {}: {}", self.path.display(), e)))
    }

    fn try_load(&self) -> Result<SessionSnapshot, SnapshotError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| SnapshotError::IoError(format!("Failed to read {}: {}", self.path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| SnapshotError::SerializationError(e.to_string()))
    }
}

impl SnapshotStoreTrait for SnapshotStore {
    /// Persists the tabs in their current order with a fresh timestamp.
    ///
    /// Never fatal to the foreground session: failures are logged and
    /// swallowed.
    fn save(&self, tabs: &[TabState]) {
        match self.try_save(tabs) {
            Ok(()) => debug!(count = tabs.len(), "saved tab snapshot"),
            Err(e) => warn!(file = %self.path.display(), "could not save tab snapshot: {}", e),
        }
    }

    /// Returns the persisted tabs in saved order.
    ///
    /// A missing, unreadable, or malformed file yields an empty sequence;
    /// this never errors to the caller.
    fn load(&self) -> Vec<TabSnapshot> {
        if !self.path.exists() {
            return Vec::new();
        }
        match self.try_load() {
            Ok(snapshot) => {
                debug!(count = snapshot.tabs.len(), "loaded tab snapshot");
                snapshot.tabs
            }
            Err(e) => {
                warn!(file = %self.path.display(), "discarding unreadable tab snapshot: {}", e);
                Vec::new()
            }
        }
    }

    fn snapshot_path(&self) -> &Path {
        &self.path
    }
}
