// Havenbrowser platform abstraction
// Provides platform-specific paths and the process liveness probe for
// Windows, macOS, and Linux.
//
// Uses `cfg(target_os)` for conditional compilation to select the correct
// platform-specific implementation at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returns the platform-specific configuration directory for Havenbrowser.
///
/// - **Linux**: `~/.config/havenbrowser` (or `$XDG_CONFIG_HOME/havenbrowser`)
/// - **macOS**: `~/Library/Application Support/Havenbrowser`
/// - **Windows**: `%APPDATA%/Havenbrowser`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the platform-specific data directory for Havenbrowser.
///
/// PID records and the tab snapshot file live here.
///
/// - **Linux**: `~/.local/share/havenbrowser` (or `$XDG_DATA_HOME/havenbrowser`)
/// - **macOS**: `~/Library/Application Support/Havenbrowser`
/// - **Windows**: `%APPDATA%/Havenbrowser`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

/// Zero-effect liveness probe for a process id.
///
/// Probe failures are indistinguishable from one another here: permission
/// errors, reaped pids, and nonsense pids all read as "not alive".
pub fn process_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }

    #[cfg(unix)]
    {
        // A pid above i32::MAX would wrap into the negative process-group
        // form of kill(2); no real pid is that large.
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        // Signal 0 performs the permission and existence checks without
        // delivering anything to the target.
        unsafe { libc::kill(pid, 0) == 0 }
    }

    #[cfg(windows)]
    {
        use sysinfo::{Pid, ProcessesToUpdate, System};
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);
        system.process(Pid::from_u32(pid)).is_some()
    }
}
