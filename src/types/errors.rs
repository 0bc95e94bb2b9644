use std::fmt;

// === TabError ===

/// Errors related to tab management operations.
#[derive(Debug)]
pub enum TabError {
    /// Tab with the given ID was not found.
    NotFound(u64),
    /// The sole remaining tab cannot be closed.
    LastTab,
    /// The UI host failed to create a surface for the tab.
    SurfaceCreation(String),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::NotFound(id) => write!(f, "Tab not found: {}", id),
            TabError::LastTab => write!(f, "Cannot close the last remaining tab"),
            TabError::SurfaceCreation(msg) => write!(f, "Surface creation failed: {}", msg),
        }
    }
}

impl std::error::Error for TabError {}

// === SurfaceError ===

/// Errors reported by the UI host's surface seam.
#[derive(Debug)]
pub enum SurfaceError {
    /// The host could not create a navigable surface.
    Creation(String),
    /// The surface handle has already been torn down.
    Destroyed(u64),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::Creation(msg) => write!(f, "Surface creation failed: {}", msg),
            SurfaceError::Destroyed(id) => write!(f, "Surface already destroyed for tab: {}", id),
        }
    }
}

impl std::error::Error for SurfaceError {}

// === SnapshotError ===

/// Errors related to tab snapshot persistence.
#[derive(Debug)]
pub enum SnapshotError {
    /// An I/O error occurred while reading or writing the snapshot file.
    IoError(String),
    /// Failed to serialize or deserialize the snapshot.
    SerializationError(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::IoError(msg) => write!(f, "Snapshot I/O error: {}", msg),
            SnapshotError::SerializationError(msg) => {
                write!(f, "Snapshot serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

// === RegistryError ===

/// Errors related to PID record handling.
#[derive(Debug)]
pub enum RegistryError {
    /// An I/O error occurred while reading or writing a PID record.
    IoError(String),
    /// The record content was not a decimal process id.
    ParseError(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::IoError(msg) => write!(f, "PID record I/O error: {}", msg),
            RegistryError::ParseError(msg) => write!(f, "PID record parse error: {}", msg),
        }
    }
}

impl std::error::Error for RegistryError {}

// === SupervisorError ===

/// Errors related to child process supervision.
#[derive(Debug)]
pub enum SupervisorError {
    /// Spawning the browser process failed.
    SpawnFailed(String),
    /// The supervisor has exhausted its restart budget.
    BudgetExhausted(u32),
}

impl fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorError::SpawnFailed(msg) => write!(f, "Process spawn failed: {}", msg),
            SupervisorError::BudgetExhausted(attempts) => {
                write!(f, "Restart budget exhausted after {} attempts", attempts)
            }
        }
    }
}

impl std::error::Error for SupervisorError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
