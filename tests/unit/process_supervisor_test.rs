use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use havenbrowser::services::pid_registry::{PidRegistry, PidRegistryTrait};
use havenbrowser::services::process_supervisor::{
    ChildSpawner, ProcessSupervisor, SupervisedChild, SupervisorConfig,
};
use havenbrowser::types::errors::SupervisorError;
use havenbrowser::types::process::{ChildExit, ProcessKind, SupervisorState};

const RESTART_DELAY: Duration = Duration::from_millis(100);

fn test_config(max_restart_attempts: u32) -> SupervisorConfig {
    SupervisorConfig {
        max_restart_attempts,
        restart_delay: RESTART_DELAY,
        health_check_interval: Duration::from_millis(10),
        shutdown_grace: Duration::from_millis(500),
    }
}

fn temp_registry() -> (tempfile::TempDir, PidRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let registry = PidRegistry::new(dir.path().to_path_buf());
    (dir, registry)
}

/// Drives `tick` with advancing synthetic time until the predicate holds or
/// the step budget runs out.
fn tick_until<S: ChildSpawner>(
    supervisor: &mut ProcessSupervisor<S>,
    start: Instant,
    mut pred: impl FnMut(&ProcessSupervisor<S>) -> bool,
) -> Instant {
    let mut now = start;
    for _ in 0..1000 {
        if pred(supervisor) {
            break;
        }
        now += Duration::from_millis(50);
        supervisor.tick(now);
    }
    now
}

// === Mock children ===

/// Child that is already dead at the first poll.
struct ExitingChild {
    pid: u32,
    code: i32,
}

impl SupervisedChild for ExitingChild {
    fn pid(&self) -> u32 {
        self.pid
    }
    fn poll_exit(&mut self) -> Option<ChildExit> {
        Some(ChildExit {
            code: Some(self.code),
        })
    }
    fn terminate(&mut self) {}
    fn kill(&mut self) {}
}

#[derive(Clone, Default)]
struct SpawnCounter {
    spawns: Rc<Cell<u32>>,
}

impl SpawnCounter {
    fn count(&self) -> u32 {
        self.spawns.get()
    }
    fn bump(&self) -> u32 {
        let n = self.spawns.get() + 1;
        self.spawns.set(n);
        n
    }
}

/// Spawner whose children exit immediately with the given code.
#[derive(Clone)]
struct CrashLoopSpawner {
    counter: SpawnCounter,
    exit_code: i32,
}

impl Default for CrashLoopSpawner {
    fn default() -> Self {
        Self {
            counter: SpawnCounter::default(),
            exit_code: 1,
        }
    }
}

impl ChildSpawner for CrashLoopSpawner {
    type Child = ExitingChild;
    fn spawn(&mut self) -> Result<ExitingChild, SupervisorError> {
        let n = self.counter.bump();
        Ok(ExitingChild {
            pid: 50_000 + n,
            code: self.exit_code,
        })
    }
}

/// Spawner that cannot spawn at all.
#[derive(Clone, Default)]
struct FailingSpawner {
    counter: SpawnCounter,
}

impl ChildSpawner for FailingSpawner {
    type Child = ExitingChild;
    fn spawn(&mut self) -> Result<ExitingChild, SupervisorError> {
        self.counter.bump();
        Err(SupervisorError::SpawnFailed("binary missing".to_string()))
    }
}

/// Child that stays alive until terminated or killed.
struct StayingChild {
    pid: u32,
    exit_on_terminate: bool,
    terminated: Rc<Cell<bool>>,
    killed: Rc<Cell<bool>>,
}

impl SupervisedChild for StayingChild {
    fn pid(&self) -> u32 {
        self.pid
    }
    fn poll_exit(&mut self) -> Option<ChildExit> {
        if self.killed.get() {
            return Some(ChildExit { code: None });
        }
        if self.exit_on_terminate && self.terminated.get() {
            return Some(ChildExit { code: Some(0) });
        }
        None
    }
    fn terminate(&mut self) {
        self.terminated.set(true);
    }
    fn kill(&mut self) {
        self.killed.set(true);
    }
}

#[derive(Clone)]
struct StayingSpawner {
    counter: SpawnCounter,
    exit_on_terminate: bool,
    terminated: Rc<Cell<bool>>,
    killed: Rc<Cell<bool>>,
}

impl StayingSpawner {
    fn new(exit_on_terminate: bool) -> Self {
        Self {
            counter: SpawnCounter::default(),
            exit_on_terminate,
            terminated: Rc::new(Cell::new(false)),
            killed: Rc::new(Cell::new(false)),
        }
    }
}

impl ChildSpawner for StayingSpawner {
    type Child = StayingChild;
    fn spawn(&mut self) -> Result<StayingChild, SupervisorError> {
        let n = self.counter.bump();
        Ok(StayingChild {
            pid: 60_000 + n,
            exit_on_terminate: self.exit_on_terminate,
            terminated: self.terminated.clone(),
            killed: self.killed.clone(),
        })
    }
}

// === Restart budget ===

#[test]
fn test_crash_loop_exhausts_budget_then_stops() {
    let (_dir, registry) = temp_registry();
    let spawner = CrashLoopSpawner::default();
    let counter = spawner.counter.clone();
    let mut supervisor = ProcessSupervisor::new(spawner, registry, test_config(5));

    let t0 = Instant::now();
    supervisor.start(t0);
    assert_eq!(supervisor.state(), SupervisorState::Running);
    assert_eq!(counter.count(), 1);

    let now = tick_until(&mut supervisor, t0, |s| {
        s.state() == SupervisorState::Stopped
    });

    // Exactly max_restart_attempts restarts beyond the initial spawn.
    assert_eq!(supervisor.restart_attempts(), 5);
    assert_eq!(counter.count(), 6);
    assert_eq!(supervisor.state(), SupervisorState::Stopped);

    // Fail-stop: further ticks never spawn again.
    supervisor.tick(now + Duration::from_secs(60));
    supervisor.tick(now + Duration::from_secs(120));
    assert_eq!(counter.count(), 6);
}

#[test]
fn test_restart_waits_for_backoff_delay() {
    let (_dir, registry) = temp_registry();
    let spawner = CrashLoopSpawner::default();
    let counter = spawner.counter.clone();
    let mut supervisor = ProcessSupervisor::new(spawner, registry, test_config(5));

    let t0 = Instant::now();
    supervisor.start(t0);
    supervisor.tick(t0);
    assert_eq!(supervisor.state(), SupervisorState::Crashed);
    assert_eq!(supervisor.restart_attempts(), 1);

    // Before the backoff elapses no respawn happens.
    supervisor.tick(t0 + RESTART_DELAY / 2);
    assert_eq!(counter.count(), 1);

    supervisor.tick(t0 + RESTART_DELAY + Duration::from_millis(1));
    assert_eq!(counter.count(), 2);
}

#[test]
fn test_spawn_failure_is_treated_as_crash() {
    let (_dir, registry) = temp_registry();
    let spawner = FailingSpawner::default();
    let counter = spawner.counter.clone();
    let mut supervisor = ProcessSupervisor::new(spawner, registry, test_config(3));

    let t0 = Instant::now();
    supervisor.start(t0);
    assert_eq!(supervisor.state(), SupervisorState::Crashed);
    assert_eq!(supervisor.restart_attempts(), 1);

    tick_until(&mut supervisor, t0, |s| s.state() == SupervisorState::Stopped);

    // Initial attempt plus three budgeted retries.
    assert_eq!(counter.count(), 4);
    assert_eq!(supervisor.restart_attempts(), 3);
}

#[test]
fn test_budget_is_not_reset_by_successful_respawn() {
    // Clean exits schedule restarts too, and neither a successful spawn nor
    // a code-0 exit ever replenishes the budget.
    let (_dir, registry) = temp_registry();
    let spawner = CrashLoopSpawner {
        counter: SpawnCounter::default(),
        exit_code: 0,
    };
    let mut supervisor = ProcessSupervisor::new(spawner, registry, test_config(2));

    let t0 = Instant::now();
    supervisor.start(t0);
    supervisor.tick(t0);
    assert_eq!(supervisor.state(), SupervisorState::Exited);
    assert_eq!(supervisor.restart_attempts(), 1);
    let now = tick_until(&mut supervisor, t0, |s| s.restart_attempts() == 2);
    tick_until(&mut supervisor, now, |s| s.state() == SupervisorState::Stopped);
    assert_eq!(supervisor.restart_attempts(), 2);
}

// === PID record bookkeeping ===

#[test]
fn test_running_child_is_recorded_and_cleared_on_exit() {
    let (_dir, registry) = temp_registry();
    let spawner = CrashLoopSpawner::default();
    let mut supervisor = ProcessSupervisor::new(spawner, registry.clone(), test_config(0));

    let t0 = Instant::now();
    supervisor.start(t0);
    let record = registry.read_record(ProcessKind::Main).unwrap();
    assert_eq!(record.pid, 50_001);

    // The child exits on the first poll; its record must go with it.
    supervisor.tick(t0);
    assert!(registry.read_record(ProcessKind::Main).is_none());
    assert_eq!(supervisor.state(), SupervisorState::Stopped);
}

#[test]
fn test_stale_record_is_replaced_by_fresh_spawn() {
    let (_dir, registry) = temp_registry();
    registry.write_record(ProcessKind::Main, 999_999_999);

    let spawner = StayingSpawner::new(true);
    let counter = spawner.counter.clone();
    let mut supervisor = ProcessSupervisor::new(spawner, registry.clone(), test_config(5));

    supervisor.start(Instant::now());
    assert_eq!(supervisor.state(), SupervisorState::Running);
    assert_eq!(counter.count(), 1);
    assert_eq!(registry.read_record(ProcessKind::Main).unwrap().pid, 60_001);
}

// === Peer detection and monitoring ===

#[cfg(unix)]
#[test]
fn test_live_peer_is_monitored_not_respawned() {
    let (_dir, registry) = temp_registry();
    let mut peer = std::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .expect("failed to spawn sleep");
    registry.write_record(ProcessKind::Main, peer.id());

    let spawner = StayingSpawner::new(true);
    let counter = spawner.counter.clone();
    let mut supervisor = ProcessSupervisor::new(spawner, registry.clone(), test_config(5));

    let t0 = Instant::now();
    supervisor.start(t0);
    assert_eq!(supervisor.state(), SupervisorState::Monitoring);
    assert_eq!(supervisor.monitored_pid(), Some(peer.id()));
    assert_eq!(counter.count(), 0);

    // While the peer lives, ticks stay passive.
    supervisor.tick(t0 + Duration::from_millis(50));
    assert_eq!(counter.count(), 0);

    // Once the peer dies, the next health probe takes over and spawns.
    peer.kill().unwrap();
    peer.wait().unwrap();
    supervisor.tick(t0 + Duration::from_millis(100));
    assert_eq!(supervisor.state(), SupervisorState::Running);
    assert_eq!(supervisor.monitored_pid(), None);
    assert_eq!(counter.count(), 1);
}

// === Graceful shutdown ===

#[test]
fn test_shutdown_terminates_child_gracefully() {
    let (_dir, registry) = temp_registry();
    let spawner = StayingSpawner::new(true);
    let terminated = spawner.terminated.clone();
    let killed = spawner.killed.clone();
    let counter = spawner.counter.clone();
    let mut supervisor = ProcessSupervisor::new(spawner, registry.clone(), test_config(5));

    let t0 = Instant::now();
    supervisor.start(t0);
    supervisor.shutdown(t0);
    assert!(terminated.get());
    assert!(!killed.get());

    // The child honors the terminate; the supervisor stops without killing.
    supervisor.tick(t0 + Duration::from_millis(50));
    assert_eq!(supervisor.state(), SupervisorState::Stopped);
    assert!(!killed.get());
    assert!(registry.read_record(ProcessKind::Main).is_none());
    assert!(registry.read_record(ProcessKind::Watchdog).is_none());

    // Intentional shutdown never schedules a restart.
    supervisor.tick(t0 + Duration::from_secs(10));
    assert_eq!(counter.count(), 1);
}

#[test]
fn test_shutdown_escalates_to_kill_after_grace_period() {
    let (_dir, registry) = temp_registry();
    let spawner = StayingSpawner::new(false);
    let killed = spawner.killed.clone();
    let mut supervisor = ProcessSupervisor::new(spawner, registry, test_config(5));

    let t0 = Instant::now();
    supervisor.start(t0);
    supervisor.shutdown(t0);

    // Within the grace period the child is left alone.
    supervisor.tick(t0 + Duration::from_millis(100));
    assert!(!killed.get());

    // Past the grace period it is killed, and the exit completes shutdown.
    supervisor.tick(t0 + Duration::from_millis(600));
    assert!(killed.get());
    supervisor.tick(t0 + Duration::from_millis(650));
    assert_eq!(supervisor.state(), SupervisorState::Stopped);
}

#[test]
fn test_shutdown_without_child_stops_immediately() {
    let (_dir, registry) = temp_registry();
    let mut supervisor =
        ProcessSupervisor::new(FailingSpawner::default(), registry, test_config(0));
    let t0 = Instant::now();
    supervisor.shutdown(t0);
    assert_eq!(supervisor.state(), SupervisorState::Stopped);
}
