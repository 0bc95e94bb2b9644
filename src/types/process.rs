/// Role of a process participating in the supervision protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessKind {
    /// The browser UI process.
    Main,
    /// The watchdog supervisor process.
    Watchdog,
}

impl ProcessKind {
    /// File name of this role's PID record inside the registry directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ProcessKind::Main => "browser.pid",
            ProcessKind::Watchdog => "watchdog.pid",
        }
    }
}

/// A process-identity marker read from or written to the PID registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub kind: ProcessKind,
}

/// State of the supervisor's restart machine.
///
/// `Monitoring` is the passive sub-state entered when a peer instance
/// already owns the main-process role: the supervisor watches that pid
/// instead of spawning its own child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Running,
    Monitoring,
    Exited,
    Crashed,
    Stopped,
}

/// How a supervised child left the `Running` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// Exit code, or `None` when the child was terminated by a signal or
    /// its status could not be collected.
    pub code: Option<i32>,
}

impl ChildExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}
