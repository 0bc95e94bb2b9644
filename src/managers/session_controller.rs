//! Session Controller for Havenbrowser.
//!
//! Owns the set of tab surfaces inside the UI process: creates and destroys
//! them, tracks foreground and most-recently-used order, replays the saved
//! snapshot shortly after startup, and recovers individual surfaces after a
//! renderer failure without tearing down the whole process.
//!
//! The controller runs on the single-threaded UI event loop. Surface
//! lifecycle callbacks arrive through [`SessionController::handle_surface_event`]
//! interleaved with user input; the only suspension points are the explicit
//! deadlines drained by [`SessionController::poll_timers`] (snapshot replay
//! after startup, recovery reloads). Persistence is fire-and-forget through
//! the snapshot store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::managers::tab_manager::{TabManager, TabManagerTrait};
use crate::services::snapshot_store::{SnapshotStore, SnapshotStoreTrait};
use crate::types::errors::{SurfaceError, TabError};
use crate::types::session::TabSnapshot;
use crate::types::settings::{GeneralSettings, SessionSettings};
use crate::types::tab::{SurfaceEvent, TabClose, TabPhase, TabState};

/// One navigable rendering context, opaque beyond this interface.
pub trait Surface {
    /// Loads a url; an empty string means the blank page.
    fn navigate(&mut self, url: &str);
    /// Reloads the current page. Returns false when a reload cannot be
    /// attempted on this surface.
    fn reload(&mut self) -> bool;
    /// Displays the static failure page.
    fn show_failure_page(&mut self);
    /// Brings this surface to the foreground.
    fn activate(&mut self);
    /// Tears the surface down.
    fn destroy(&mut self);
    fn is_destroyed(&self) -> bool;
}

/// The UI host's surface factory.
pub trait SurfaceHost {
    type Surface: Surface;
    fn create_surface(&mut self, tab_id: u64, url: &str) -> Result<Self::Surface, SurfaceError>;
}

/// Receiver of the per-tab event relay exposed to the UI layer.
pub trait TabEventSink {
    fn surface_event(&mut self, tab_id: u64, event: &SurfaceEvent);
    fn tab_restored(&mut self, tab_id: u64, url: &str, title: &str);
}

/// Timing and startup behavior of the controller.
#[derive(Debug, Clone)]
pub struct SessionTuning {
    pub restore_tabs: bool,
    pub homepage: String,
    pub restore_delay: Duration,
    pub recovery_reload_delay: Duration,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self::from_settings(&GeneralSettings::default(), &SessionSettings::default())
    }
}

impl SessionTuning {
    pub fn from_settings(general: &GeneralSettings, session: &SessionSettings) -> Self {
        Self {
            restore_tabs: general.restore_tabs,
            homepage: general.homepage.clone(),
            restore_delay: Duration::from_millis(session.restore_delay_ms),
            recovery_reload_delay: Duration::from_millis(session.recovery_reload_delay_ms),
        }
    }
}

/// The live tab session of one UI process.
pub struct SessionController<H: SurfaceHost, K: TabEventSink> {
    host: H,
    sink: K,
    tabs: TabManager,
    surfaces: HashMap<u64, H::Surface>,
    store: SnapshotStore,
    tuning: SessionTuning,
    next_tab_id: u64,
    created_any: bool,
    pending_restore: Option<(Instant, Vec<TabSnapshot>)>,
    pending_reloads: HashMap<u64, Instant>,
}

impl<H: SurfaceHost, K: TabEventSink> SessionController<H, K> {
    pub fn new(host: H, sink: K, store: SnapshotStore, tuning: SessionTuning) -> Self {
        Self {
            host,
            sink,
            tabs: TabManager::new(),
            surfaces: HashMap::new(),
            store,
            tuning,
            next_tab_id: 0,
            created_any: false,
            pending_restore: None,
            pending_reloads: HashMap::new(),
        }
    }

    /// Opens the initial tab and, when tab restore is enabled, schedules the
    /// snapshot replay for shortly after startup so the first surface can
    /// finish its own initialization.
    ///
    /// The snapshot is read here, before the first tab's own save rewrites
    /// the file; the replay later works from this captured copy.
    pub fn start_session(&mut self, now: Instant) -> Result<u64, TabError> {
        let saved = if self.tuning.restore_tabs {
            self.store.load()
        } else {
            Vec::new()
        };

        let homepage = self.tuning.homepage.clone();
        let id = self.create_tab(&homepage)?;

        if saved.len() > 1 {
            self.pending_restore = Some((now + self.tuning.restore_delay, saved));
        }
        Ok(id)
    }

    /// Creates a tab with a fresh id and persists the new tab set.
    ///
    /// The new tab becomes the foreground surface only when it is the very
    /// first tab of the process lifetime; otherwise the caller decides
    /// whether to switch.
    pub fn create_tab(&mut self, url: &str) -> Result<u64, TabError> {
        let id = self.next_tab_id;
        let surface = self
            .host
            .create_surface(id, url)
            .map_err(|e| TabError::SurfaceCreation(e.to_string()))?;
        self.next_tab_id += 1;

        self.surfaces.insert(id, surface);
        self.tabs.insert(TabState::new(id, url));

        let first = !self.created_any;
        self.created_any = true;
        if first {
            self.tabs.set_current(id);
            if let Some(surface) = self.surfaces.get_mut(&id) {
                surface.activate();
            }
        }

        self.store.save(self.tabs.states());
        info!(tab_id = id, url, "created tab");
        Ok(id)
    }

    /// Makes `tab_id` the foreground surface and records the use in the
    /// MRU history. Returns false for unknown ids.
    pub fn switch_to(&mut self, tab_id: u64) -> bool {
        if !self.tabs.set_current(tab_id) {
            return false;
        }
        self.tabs.touch(tab_id);
        if let Some(surface) = self.surfaces.get_mut(&tab_id) {
            surface.activate();
        }
        debug!(tab_id, "switched tab");
        true
    }

    /// Closes a tab, persisting the new tab set.
    ///
    /// The sole remaining tab is never closed — the session always keeps at
    /// least one tab. When the foreground tab closes, the most recently
    /// used surviving tab takes its place.
    pub fn close_tab(&mut self, tab_id: u64) -> Result<TabClose, TabError> {
        if !self.tabs.contains(tab_id) {
            return Err(TabError::NotFound(tab_id));
        }
        if self.tabs.tab_count() == 1 {
            return Err(TabError::LastTab);
        }

        let was_current = self.tabs.current_tab_id() == Some(tab_id);

        if let Some(mut surface) = self.surfaces.remove(&tab_id) {
            surface.destroy();
        }
        self.pending_reloads.remove(&tab_id);
        let _ = self.tabs.remove(tab_id);
        self.store.save(self.tabs.states());
        info!(tab_id, "closed tab");

        if was_current {
            if let Some(next) = self.tabs.most_recent_surviving() {
                self.tabs.set_current(next);
                if let Some(surface) = self.surfaces.get_mut(&next) {
                    surface.activate();
                }
                return Ok(TabClose::SwitchedTo(next));
            }
        }
        Ok(TabClose::Closed)
    }

    /// Forwards a navigation request to the tab's surface.
    pub fn navigate(&mut self, tab_id: u64, url: &str) -> bool {
        match self.surfaces.get_mut(&tab_id) {
            Some(surface) => {
                surface.navigate(url);
                true
            }
            None => false,
        }
    }

    /// Forwards a reload request to the tab's surface.
    pub fn reload(&mut self, tab_id: u64) -> bool {
        match self.surfaces.get_mut(&tab_id) {
            Some(surface) => surface.reload(),
            None => false,
        }
    }

    /// Applies one surface event to the tab's bookkeeping and relays it
    /// verbatim to the UI layer.
    ///
    /// A crashed or unresponsive surface gets a single recovery reload
    /// after a short delay, with foreground and MRU bookkeeping untouched;
    /// a failure in one tab never escalates into a supervisor-level restart
    /// of the whole process.
    pub fn handle_surface_event(&mut self, tab_id: u64, event: SurfaceEvent, now: Instant) {
        if !self.tabs.contains(tab_id) {
            debug!(tab_id, "dropping event for unknown tab");
            return;
        }

        match &event {
            SurfaceEvent::LoadStarted => {
                if let Some(state) = self.tabs.get_mut(tab_id) {
                    state.loading = true;
                    state.phase = TabPhase::Loading;
                }
            }
            SurfaceEvent::LoadStopped => {
                if let Some(state) = self.tabs.get_mut(tab_id) {
                    state.loading = false;
                    state.phase = TabPhase::Loaded;
                }
            }
            SurfaceEvent::LoadFailed { description } => {
                warn!(tab_id, "page load failed: {}", description);
                if let Some(state) = self.tabs.get_mut(tab_id) {
                    state.loading = false;
                }
            }
            SurfaceEvent::UrlChanged(url) => {
                if let Some(state) = self.tabs.get_mut(tab_id) {
                    state.url = url.clone();
                }
            }
            SurfaceEvent::TitleChanged(title) => {
                if let Some(state) = self.tabs.get_mut(tab_id) {
                    state.title = title.clone();
                }
            }
            SurfaceEvent::Crashed => {
                warn!(tab_id, "surface crashed, scheduling recovery");
                if let Some(state) = self.tabs.get_mut(tab_id) {
                    state.loading = false;
                    state.phase = TabPhase::Crashed;
                }
                self.schedule_recovery(tab_id, now);
            }
            SurfaceEvent::Unresponsive => {
                warn!(tab_id, "surface unresponsive, scheduling recovery");
                self.schedule_recovery(tab_id, now);
            }
            SurfaceEvent::Responsive => {
                debug!(tab_id, "surface responsive again");
            }
        }

        self.sink.surface_event(tab_id, &event);
    }

    /// Recreates every saved tab beyond the first, which is assumed to be
    /// represented by the tab created at process start.
    ///
    /// Restored tabs get fresh ids distinct from their pre-restart ids; the
    /// snapshot format does not promise id stability.
    pub fn restore_from_snapshot(&mut self, saved: &[TabSnapshot]) {
        if saved.len() <= 1 {
            return;
        }
        info!(count = saved.len() - 1, "restoring previous tabs");
        for snap in saved.iter().skip(1) {
            match self.create_tab(&snap.url) {
                Ok(id) => {
                    if let Some(state) = self.tabs.get_mut(id) {
                        state.title = snap.title.clone();
                    }
                    self.sink.tab_restored(id, &snap.url, &snap.title);
                }
                Err(e) => warn!(url = %snap.url, "could not restore tab: {}", e),
            }
        }
    }

    /// Fires every due deadline: the startup snapshot replay and pending
    /// recovery reloads. This is the controller's only suspension point.
    pub fn poll_timers(&mut self, now: Instant) {
        let restore_due = matches!(&self.pending_restore, Some((due, _)) if now >= *due);
        if restore_due {
            if let Some((_, saved)) = self.pending_restore.take() {
                self.restore_from_snapshot(&saved);
            }
        }

        let due: Vec<u64> = self
            .pending_reloads
            .iter()
            .filter(|(_, at)| now >= **at)
            .map(|(id, _)| *id)
            .collect();
        for tab_id in due {
            self.pending_reloads.remove(&tab_id);
            self.recover_surface(tab_id);
        }
    }

    /// Destroys every surface and drops all tab state.
    pub fn teardown(&mut self) {
        self.pending_restore = None;
        self.pending_reloads.clear();
        for id in self.tabs.ids() {
            if let Some(mut surface) = self.surfaces.remove(&id) {
                surface.destroy();
            }
            let _ = self.tabs.remove(id);
        }
        info!("session torn down");
    }

    pub fn current_tab_id(&self) -> Option<u64> {
        self.tabs.current_tab_id()
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.tab_count()
    }

    pub fn tab(&self, tab_id: u64) -> Option<&TabState> {
        self.tabs.get(tab_id)
    }

    /// Tab states in insertion order.
    pub fn tab_states(&self) -> &[TabState] {
        self.tabs.states()
    }

    /// MRU history, most recent first.
    pub fn usage_history(&self) -> &[u64] {
        self.tabs.usage_history()
    }

    /// True while a recovery reload is pending for the tab.
    pub fn recovery_pending(&self, tab_id: u64) -> bool {
        self.pending_reloads.contains_key(&tab_id)
    }

    fn schedule_recovery(&mut self, tab_id: u64, now: Instant) {
        // A single reload per failure: a second crash event while one is
        // already pending does not queue another.
        if self.pending_reloads.contains_key(&tab_id) {
            return;
        }
        self.pending_reloads
            .insert(tab_id, now + self.tuning.recovery_reload_delay);
    }

    fn recover_surface(&mut self, tab_id: u64) {
        let Some(surface) = self.surfaces.get_mut(&tab_id) else {
            debug!(tab_id, "surface gone before recovery reload");
            return;
        };
        if surface.reload() {
            info!(tab_id, "reloaded surface after failure");
        } else {
            warn!(tab_id, "surface reload unavailable, showing failure page");
            surface.show_failure_page();
        }
    }
}
