//! Havenbrowser — a self-healing minimal browser shell.
//!
//! Entry point for the UI process. With the `gui` feature, runs the
//! wry/tao webview shell; without it, runs an interactive console demo of
//! the supervisory core.

#[cfg(feature = "gui")]
fn main() {
    havenbrowser::ui::webview_app::run();
}

#[cfg(not(feature = "gui"))]
fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║             Havenbrowser v{} — Demo Mode                  ║", env!("CARGO_PKG_VERSION"));
    println!("║     Self-healing browser shell: watchdog + tab restore     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let work_dir = std::env::temp_dir().join("havenbrowser-demo");

    demo_settings(&work_dir);
    demo_pid_registry(&work_dir);
    demo_snapshot_store(&work_dir);
    demo_tab_manager();
    demo_session_controller(&work_dir);
    demo_supervisor(&work_dir);
    demo_app_core(&work_dir);

    let _ = std::fs::remove_dir_all(&work_dir);

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ All 7 components demonstrated successfully!");
    println!("═══════════════════════════════════════════════════════════════");
}

#[cfg(not(feature = "gui"))]
fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

#[cfg(not(feature = "gui"))]
fn demo_settings(work_dir: &std::path::Path) {
    use havenbrowser::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
    section("Settings Engine");

    let path = work_dir.join("settings.json").to_string_lossy().to_string();
    let mut engine = SettingsEngine::new(Some(path));
    let settings = engine.load().expect("Failed to load settings");
    println!("  Restore tabs: {}", settings.general.restore_tabs);
    println!("  Restart budget: {} attempts", settings.supervisor.max_restart_attempts);
    println!("  Restart delay: {} ms", settings.supervisor.restart_delay_ms);
    println!("  Recovery reload delay: {} ms", settings.session.recovery_reload_delay_ms);

    engine.set_value("supervisor.max_restart_attempts", serde_json::json!(8)).unwrap();
    println!("  Changed restart budget to: {}", engine.get_settings().supervisor.max_restart_attempts);

    engine.reset().unwrap();
    println!("  Reset to defaults: budget = {}", engine.get_settings().supervisor.max_restart_attempts);
    println!("  ✓ SettingsEngine OK");
    println!();
}

#[cfg(not(feature = "gui"))]
fn demo_pid_registry(work_dir: &std::path::Path) {
    use havenbrowser::services::pid_registry::{PidRegistry, PidRegistryTrait};
    use havenbrowser::types::process::ProcessKind;
    section("PID Registry");

    let registry = PidRegistry::new(work_dir.join("registry"));
    registry.write_record(ProcessKind::Main, std::process::id());
    let record = registry.read_record(ProcessKind::Main).unwrap();
    println!("  Wrote and read back record: pid {}", record.pid);
    println!("  Own pid alive: {}", registry.is_alive(record.pid));

    // Our own record is not a peer; the check cleans it up.
    println!("  Peer running (own record): {}", registry.is_peer_running(ProcessKind::Main));

    registry.write_record(ProcessKind::Main, 999_999_999);
    println!("  Peer running (dead pid): {}", registry.is_peer_running(ProcessKind::Main));
    println!("  Stale record cleaned: {}", registry.read_record(ProcessKind::Main).is_none());
    println!("  ✓ PidRegistry OK");
    println!();
}

#[cfg(not(feature = "gui"))]
fn demo_snapshot_store(work_dir: &std::path::Path) {
    use havenbrowser::services::snapshot_store::{SnapshotStore, SnapshotStoreTrait};
    use havenbrowser::types::tab::{TabState, BLANK_PAGE_URL};
    section("Snapshot Store");

    let store = SnapshotStore::new(work_dir.join("last-tabs.json"), true);
    let tabs = vec![
        TabState::new(0, BLANK_PAGE_URL),
        TabState::new(1, "https://github.com"),
        TabState::new(2, "https://docs.rs"),
    ];
    store.save(&tabs);
    println!("  Saved {} tabs", tabs.len());

    let loaded = store.load();
    println!("  Loaded {} tabs", loaded.len());
    println!("  Blank marker mapped to empty url: {:?}", loaded[0].url);
    println!("  Second tab: {}", loaded[1].url);

    std::fs::write(store.snapshot_path(), "{ truncated").unwrap();
    println!("  Malformed file loads as {} tabs", store.load().len());
    println!("  ✓ SnapshotStore OK");
    println!();
}

#[cfg(not(feature = "gui"))]
fn demo_tab_manager() {
    use havenbrowser::managers::tab_manager::{TabManager, TabManagerTrait};
    use havenbrowser::types::tab::TabState;
    section("Tab Manager (MRU)");

    let mut mgr = TabManager::new();
    for id in 0..3 {
        mgr.insert(TabState::new(id, ""));
    }
    mgr.set_current(0);
    mgr.touch(0);
    mgr.touch(2);
    mgr.touch(1);
    println!("  Usage history (most recent first): {:?}", mgr.usage_history());

    mgr.remove(1);
    println!("  After closing tab 1, most recent surviving: {:?}", mgr.most_recent_surviving());

    mgr.remove(2);
    println!("  After closing tab 2, fallback: {:?}", mgr.most_recent_surviving());
    println!("  ✓ TabManager OK");
    println!();
}

// === Console surface host for the controller demo ===

#[cfg(not(feature = "gui"))]
mod console_host {
    use havenbrowser::managers::session_controller::{Surface, SurfaceHost, TabEventSink};
    use havenbrowser::types::errors::SurfaceError;
    use havenbrowser::types::tab::{SurfaceEvent, BLANK_PAGE_URL};

    pub struct ConsoleSurface {
        tab_id: u64,
        destroyed: bool,
    }

    impl Surface for ConsoleSurface {
        fn navigate(&mut self, url: &str) {
            let url = if url.is_empty() { BLANK_PAGE_URL } else { url };
            println!("    [surface {}] navigate -> {}", self.tab_id, url);
        }

        fn reload(&mut self) -> bool {
            if self.destroyed {
                return false;
            }
            println!("    [surface {}] reload", self.tab_id);
            true
        }

        fn show_failure_page(&mut self) {
            println!("    [surface {}] showing failure page", self.tab_id);
        }

        fn activate(&mut self) {
            println!("    [surface {}] brought to foreground", self.tab_id);
        }

        fn destroy(&mut self) {
            self.destroyed = true;
        }

        fn is_destroyed(&self) -> bool {
            self.destroyed
        }
    }

    pub struct ConsoleHost;

    impl SurfaceHost for ConsoleHost {
        type Surface = ConsoleSurface;

        fn create_surface(&mut self, tab_id: u64, _url: &str) -> Result<ConsoleSurface, SurfaceError> {
            Ok(ConsoleSurface {
                tab_id,
                destroyed: false,
            })
        }
    }

    pub struct ConsoleSink;

    impl TabEventSink for ConsoleSink {
        fn surface_event(&mut self, tab_id: u64, event: &SurfaceEvent) {
            println!("    [ui] tab {} event: {:?}", tab_id, event);
        }

        fn tab_restored(&mut self, tab_id: u64, url: &str, title: &str) {
            let url = if url.is_empty() { "blank" } else { url };
            println!("    [ui] restored tab {} ({} — {})", tab_id, url, title);
        }
    }
}

#[cfg(not(feature = "gui"))]
fn demo_session_controller(work_dir: &std::path::Path) {
    use std::time::{Duration, Instant};

    use crate::console_host::{ConsoleHost, ConsoleSink};
    use havenbrowser::managers::session_controller::{SessionController, SessionTuning};
    use havenbrowser::services::snapshot_store::SnapshotStore;
    use havenbrowser::types::tab::{SurfaceEvent, TabClose};
    section("Session Controller");

    let store = SnapshotStore::new(work_dir.join("session").join("last-tabs.json"), true);
    let tuning = SessionTuning::default();
    let mut controller =
        SessionController::new(ConsoleHost, ConsoleSink, store.clone(), tuning.clone());

    let t0 = Instant::now();
    let first = controller.start_session(t0).unwrap();
    let t1 = controller.create_tab("https://github.com").unwrap();
    let t2 = controller.create_tab("https://docs.rs").unwrap();
    controller.switch_to(t2);
    controller.switch_to(t1);
    println!("  Opened {} tabs, current = {:?}", controller.tab_count(), controller.current_tab_id());

    println!("  Simulating a renderer crash on tab {}...", t1);
    controller.handle_surface_event(t1, SurfaceEvent::Crashed, t0);
    controller.poll_timers(t0 + tuning.recovery_reload_delay + Duration::from_millis(1));

    match controller.close_tab(t1) {
        Ok(TabClose::SwitchedTo(id)) => println!("  Closed current tab, MRU fallback -> tab {}", id),
        other => println!("  Unexpected close outcome: {:?}", other),
    }
    let _ = controller.close_tab(t2);
    println!(
        "  Closing the last tab refused: {}",
        controller.close_tab(first).is_err()
    );

    // Leave a multi-tab session behind so the next start has work to do.
    controller.create_tab("https://blog.rust-lang.org").unwrap();
    controller.create_tab("https://crates.io").unwrap();
    controller.teardown();

    // A fresh session restores everything beyond its own first tab.
    println!("  Restarting session from snapshot...");
    let mut restored = SessionController::new(ConsoleHost, ConsoleSink, store, tuning.clone());
    restored.start_session(t0).unwrap();
    restored.poll_timers(t0 + tuning.restore_delay + Duration::from_millis(1));
    println!("  Restored session has {} tabs", restored.tab_count());
    restored.teardown();
    println!("  ✓ SessionController OK");
    println!();
}

#[cfg(not(feature = "gui"))]
fn demo_supervisor(work_dir: &std::path::Path) {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use havenbrowser::services::pid_registry::PidRegistry;
    use havenbrowser::services::process_supervisor::{
        ChildSpawner, ProcessSupervisor, SupervisedChild, SupervisorConfig,
    };
    use havenbrowser::types::errors::SupervisorError;
    use havenbrowser::types::process::{ChildExit, SupervisorState};
    section("Process Supervisor (fail-stop)");

    struct FlakyChild {
        pid: u32,
    }

    impl SupervisedChild for FlakyChild {
        fn pid(&self) -> u32 {
            self.pid
        }
        fn poll_exit(&mut self) -> Option<ChildExit> {
            Some(ChildExit { code: Some(1) })
        }
        fn terminate(&mut self) {}
        fn kill(&mut self) {}
    }

    struct FlakySpawner {
        spawned: Rc<Cell<u32>>,
    }

    impl ChildSpawner for FlakySpawner {
        type Child = FlakyChild;
        fn spawn(&mut self) -> Result<FlakyChild, SupervisorError> {
            let n = self.spawned.get() + 1;
            self.spawned.set(n);
            Ok(FlakyChild { pid: 40_000 + n })
        }
    }

    let spawned = Rc::new(Cell::new(0));
    let spawner = FlakySpawner {
        spawned: spawned.clone(),
    };
    let registry = PidRegistry::new(work_dir.join("supervisor"));
    let config = SupervisorConfig {
        max_restart_attempts: 3,
        restart_delay: Duration::from_millis(100),
        ..SupervisorConfig::default()
    };
    let mut supervisor = ProcessSupervisor::new(spawner, registry, config);

    let mut now = Instant::now();
    supervisor.start(now);
    println!("  Started a browser that crashes on every launch");
    while supervisor.state() != SupervisorState::Stopped {
        now += Duration::from_millis(100);
        supervisor.tick(now);
    }
    println!(
        "  Gave up after {} restart attempts ({} spawns total), state = {:?}",
        supervisor.restart_attempts(),
        spawned.get(),
        supervisor.state()
    );
    println!("  ✓ ProcessSupervisor OK");
    println!();
}

#[cfg(not(feature = "gui"))]
fn demo_app_core(work_dir: &std::path::Path) {
    use havenbrowser::app::App;
    use havenbrowser::services::snapshot_store::SnapshotStoreTrait;
    section("App Core (full lifecycle)");

    let settings_path = work_dir.join("app-settings.json").to_string_lossy().to_string();
    let mut app = App::with_dirs(Some(settings_path), work_dir.join("app-data"));

    let claimed = app.startup();
    println!("  Startup claimed the main-process role: {}", claimed);
    println!("  Snapshot path: {}", app.snapshot_store().snapshot_path().display());

    app.shutdown();
    println!("  Shutdown released the role");
    println!("  ✓ App Core OK");
}
