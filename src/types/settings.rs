use serde::{Deserialize, Serialize};

/// Top-level browser settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserSettings {
    pub general: GeneralSettings,
    pub supervisor: SupervisorSettings,
    pub session: SessionSettings,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            supervisor: SupervisorSettings::default(),
            session: SessionSettings::default(),
        }
    }
}

/// General browser settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralSettings {
    /// Restore the previous session's tabs on startup.
    pub restore_tabs: bool,
    /// Ask the watchdog to start the browser without showing a window.
    pub start_hidden: bool,
    pub homepage: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            restore_tabs: true,
            start_hidden: false,
            homepage: String::new(),
        }
    }
}

/// Tuning for the watchdog's restart machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupervisorSettings {
    /// Restart budget before the watchdog gives up (fail-stop).
    pub max_restart_attempts: u32,
    /// Backoff between a child exit and the next spawn attempt.
    pub restart_delay_ms: u64,
    /// Period of the liveness/exit health probe.
    pub health_check_interval_ms: u64,
    /// Grace period between graceful and forceful termination at shutdown.
    pub shutdown_grace_ms: u64,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            max_restart_attempts: 5,
            restart_delay_ms: 2000,
            health_check_interval_ms: 1000,
            shutdown_grace_ms: 5000,
        }
    }
}

/// Tuning for the in-process session controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    /// Delay between startup and snapshot replay, letting the first surface
    /// finish its own initialization.
    pub restore_delay_ms: u64,
    /// Delay before reloading a crashed or unresponsive surface.
    pub recovery_reload_delay_ms: u64,
    /// Pretty-print the snapshot file.
    pub snapshot_pretty: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            restore_delay_ms: 1000,
            recovery_reload_delay_ms: 1000,
            snapshot_pretty: true,
        }
    }
}
