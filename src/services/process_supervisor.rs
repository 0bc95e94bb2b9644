//! Process Supervisor for Havenbrowser.
//!
//! Owns a single supervised browser process: starts it, detects its exit,
//! restarts it after a fixed backoff while a bounded retry budget lasts, and
//! yields to an already-running peer instead of spawning a duplicate.
//!
//! The state machine is poll-driven: the watchdog binary calls [`ProcessSupervisor::tick`]
//! on a fixed interval and passes the current instant, so every deadline in
//! the machine derives from caller-supplied time. Child processes sit behind
//! the [`ChildSpawner`]/[`SupervisedChild`] seams, keeping the machine
//! independent of the real process table.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::services::pid_registry::{PidRegistry, PidRegistryTrait};
use crate::types::errors::SupervisorError;
use crate::types::process::{ChildExit, ProcessKind, SupervisorState};
use crate::types::settings::SupervisorSettings;

/// A handle to one spawned browser process.
pub trait SupervisedChild {
    fn pid(&self) -> u32;
    /// Non-blocking exit poll. `None` while the child is still running.
    fn poll_exit(&mut self) -> Option<ChildExit>;
    /// Graceful termination request.
    fn terminate(&mut self);
    /// Forceful termination.
    fn kill(&mut self);
}

/// Source of supervised children.
pub trait ChildSpawner {
    type Child: SupervisedChild;
    fn spawn(&mut self) -> Result<Self::Child, SupervisorError>;
}

/// Tuning knobs of the restart machine.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub max_restart_attempts: u32,
    pub restart_delay: Duration,
    pub health_check_interval: Duration,
    pub shutdown_grace: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::from(&SupervisorSettings::default())
    }
}

impl From<&SupervisorSettings> for SupervisorConfig {
    fn from(settings: &SupervisorSettings) -> Self {
        Self {
            max_restart_attempts: settings.max_restart_attempts,
            restart_delay: Duration::from_millis(settings.restart_delay_ms),
            health_check_interval: Duration::from_millis(settings.health_check_interval_ms),
            shutdown_grace: Duration::from_millis(settings.shutdown_grace_ms),
        }
    }
}

/// The watchdog's restart state machine.
pub struct ProcessSupervisor<S: ChildSpawner> {
    spawner: S,
    registry: PidRegistry,
    config: SupervisorConfig,
    state: SupervisorState,
    child: Option<S::Child>,
    monitored_pid: Option<u32>,
    restart_attempts: u32,
    restart_due: Option<Instant>,
    kill_deadline: Option<Instant>,
    intentional_shutdown: bool,
}

impl<S: ChildSpawner> ProcessSupervisor<S> {
    pub fn new(spawner: S, registry: PidRegistry, config: SupervisorConfig) -> Self {
        Self {
            spawner,
            registry,
            config,
            state: SupervisorState::Idle,
            child: None,
            monitored_pid: None,
            restart_attempts: 0,
            restart_due: None,
            kill_deadline: None,
            intentional_shutdown: false,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn restart_attempts(&self) -> u32 {
        self.restart_attempts
    }

    pub fn monitored_pid(&self) -> Option<u32> {
        self.monitored_pid
    }

    pub fn has_child(&self) -> bool {
        self.child.is_some()
    }

    /// Starts supervision of the main-process role.
    ///
    /// When a live peer already owns the role, no child is spawned: the
    /// supervisor enters the passive `Monitoring` sub-state and watches the
    /// peer's pid from `tick`. A spawn failure is treated exactly like a
    /// crash-exit and goes through the same restart scheduling.
    pub fn start(&mut self, now: Instant) {
        if self.state == SupervisorState::Stopped {
            return;
        }

        if self.registry.is_peer_running(ProcessKind::Main) {
            self.monitored_pid = self.registry.read_record(ProcessKind::Main).map(|r| r.pid);
            self.state = SupervisorState::Monitoring;
            info!(pid = ?self.monitored_pid, "browser already running, monitoring existing process");
            return;
        }

        self.state = SupervisorState::Starting;
        match self.spawner.spawn() {
            Ok(child) => {
                let pid = child.pid();
                self.registry.write_record(ProcessKind::Main, pid);
                self.child = Some(child);
                self.state = SupervisorState::Running;
                info!(pid, "browser process started");
            }
            Err(e) => {
                warn!("browser process failed to start: {}", e);
                self.state = SupervisorState::Crashed;
                self.schedule_restart(now);
            }
        }
    }

    /// Periodic health probe driving every deadline in the machine: child
    /// exits, due restarts, shutdown escalation, and death of a monitored
    /// peer.
    pub fn tick(&mut self, now: Instant) {
        match self.state {
            SupervisorState::Stopped => return,
            SupervisorState::Monitoring => {
                self.probe_monitored_peer(now);
                return;
            }
            _ => {}
        }

        let polled = self
            .child
            .as_mut()
            .map(|child| (child.pid(), child.poll_exit()));
        match polled {
            Some((pid, Some(exit))) => {
                self.handle_child_exit(pid, exit, now);
                return;
            }
            Some((_, None)) => {
                // Still running: escalate a pending shutdown if the grace
                // period has elapsed.
                if self.intentional_shutdown {
                    if let Some(deadline) = self.kill_deadline {
                        if now >= deadline {
                            warn!("browser did not exit within grace period, force killing");
                            if let Some(child) = self.child.as_mut() {
                                child.kill();
                            }
                            self.kill_deadline = None;
                        }
                    }
                }
                return;
            }
            None => {}
        }

        if let Some(due) = self.restart_due {
            if now >= due {
                self.restart_due = None;
                self.start(now);
            }
        }
    }

    /// Graceful shutdown: terminate the child, escalate to a forceful kill
    /// after the grace period, then clean up PID records and stop.
    pub fn shutdown(&mut self, now: Instant) {
        info!("supervisor shutdown requested");
        self.intentional_shutdown = true;
        self.restart_due = None;
        if self.child.is_some() {
            if let Some(child) = self.child.as_mut() {
                child.terminate();
            }
            self.kill_deadline = Some(now + self.config.shutdown_grace);
        } else {
            self.finish_shutdown();
        }
    }

    fn probe_monitored_peer(&mut self, now: Instant) {
        let Some(pid) = self.monitored_pid else {
            return;
        };
        if !self.registry.is_alive(pid) {
            // The peer was never our child, so no exit event will ever fire
            // for it; this probe is how control passes to this instance.
            info!(pid, "monitored browser process died, taking over");
            self.monitored_pid = None;
            self.state = SupervisorState::Idle;
            self.start(now);
        }
    }

    fn handle_child_exit(&mut self, pid: u32, exit: ChildExit, now: Instant) {
        self.child = None;
        self.registry.delete_record(ProcessKind::Main);

        if self.intentional_shutdown {
            info!(pid, "browser exited during shutdown");
            self.finish_shutdown();
            return;
        }

        if exit.success() {
            info!(pid, "browser process exited");
            self.state = SupervisorState::Exited;
        } else {
            warn!(pid, code = ?exit.code, "browser process crashed");
            self.state = SupervisorState::Crashed;
        }
        self.schedule_restart(now);
    }

    fn schedule_restart(&mut self, now: Instant) {
        if self.intentional_shutdown {
            return;
        }
        if self.restart_attempts >= self.config.max_restart_attempts {
            // Fail-stop: after the budget is spent the supervisor stays
            // stopped instead of respawning forever. The budget is never
            // replenished by a period of stable uptime.
            info!(
                attempts = self.restart_attempts,
                "restart budget exhausted, supervisor stopping"
            );
            self.state = SupervisorState::Stopped;
            return;
        }
        self.restart_attempts += 1;
        self.restart_due = Some(now + self.config.restart_delay);
        info!(
            attempt = self.restart_attempts,
            max = self.config.max_restart_attempts,
            delay_ms = self.config.restart_delay.as_millis() as u64,
            "scheduling browser restart"
        );
    }

    fn finish_shutdown(&mut self) {
        self.registry.delete_record(ProcessKind::Main);
        self.registry.delete_record(ProcessKind::Watchdog);
        self.state = SupervisorState::Stopped;
        info!("supervisor stopped");
    }
}

// === Real browser spawner ===

fn browser_binary_name() -> &'static str {
    if cfg!(windows) {
        "havenbrowser.exe"
    } else {
        "havenbrowser"
    }
}

/// Spawns the real browser binary.
pub struct BrowserSpawner {
    command: PathBuf,
    start_hidden: bool,
}

impl BrowserSpawner {
    pub fn new<P: Into<PathBuf>>(command: P, start_hidden: bool) -> Self {
        Self {
            command: command.into(),
            start_hidden,
        }
    }

    /// Resolves the browser binary next to the current executable, falling
    /// back to a PATH lookup by name.
    pub fn sibling_browser(start_hidden: bool) -> Self {
        let command = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(browser_binary_name())))
            .filter(|candidate| candidate.exists())
            .unwrap_or_else(|| PathBuf::from(browser_binary_name()));
        Self::new(command, start_hidden)
    }
}

impl ChildSpawner for BrowserSpawner {
    type Child = SpawnedBrowser;

    fn spawn(&mut self) -> Result<SpawnedBrowser, SupervisorError> {
        let mut cmd = Command::new(&self.command);
        if self.start_hidden {
            cmd.arg("--hidden");
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| SupervisorError::SpawnFailed(format!("{}: {}", self.command.display(), e)))?;
        let pid = child.id().unwrap_or(0);
        Ok(SpawnedBrowser { child, pid })
    }
}

/// A real spawned browser process.
pub struct SpawnedBrowser {
    child: Child,
    pid: u32,
}

impl SupervisedChild for SpawnedBrowser {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn poll_exit(&mut self) -> Option<ChildExit> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(ChildExit {
                code: status.code(),
            }),
            Ok(None) => None,
            Err(e) => {
                // Treat an unpollable child as exited so the dead entry is
                // cleaned up rather than supervised forever.
                warn!(pid = self.pid, "failed to poll browser process: {}", e);
                Some(ChildExit { code: None })
            }
        }
    }

    fn terminate(&mut self) {
        #[cfg(unix)]
        {
            let _ = unsafe { libc::kill(self.pid as libc::pid_t, libc::SIGTERM) };
        }
        #[cfg(not(unix))]
        {
            if let Err(e) = self.child.start_kill() {
                warn!(pid = self.pid, "failed to terminate browser process: {}", e);
            }
        }
    }

    fn kill(&mut self) {
        if let Err(e) = self.child.start_kill() {
            warn!(pid = self.pid, "failed to kill browser process: {}", e);
        }
    }
}
