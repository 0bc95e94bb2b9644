/// URL loaded into a surface when a tab has no real page.
///
/// This marker never reaches persistent storage: the snapshot store maps it
/// to an empty string on save, and the restore path maps `""` back to it.
pub const BLANK_PAGE_URL: &str = "about:blank";

/// Lifecycle phase of a live tab.
///
/// `Crashed` is transient: the recovery reload moves the tab back to
/// `Loading` rather than to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabPhase {
    Created,
    Loading,
    Loaded,
    Crashed,
    Closed,
}

/// Live, in-memory state of one browser tab.
///
/// The surface handle itself is owned by the session controller; this struct
/// carries only the bookkeeping mirrored from surface events.
#[derive(Debug, Clone, PartialEq)]
pub struct TabState {
    pub id: u64,
    pub url: String,
    pub title: String,
    pub loading: bool,
    pub phase: TabPhase,
}

impl TabState {
    /// Creates the bookkeeping record for a freshly created tab.
    pub fn new(id: u64, url: &str) -> Self {
        Self {
            id,
            url: url.to_string(),
            title: "New Tab".to_string(),
            loading: false,
            phase: TabPhase::Created,
        }
    }

    /// True when the tab shows no real page.
    pub fn is_blank(&self) -> bool {
        self.url.is_empty() || self.url == BLANK_PAGE_URL
    }
}

/// Lifecycle and navigation events emitted by a surface, relayed to the UI
/// layer keyed by tab id.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    LoadStarted,
    LoadStopped,
    LoadFailed { description: String },
    UrlChanged(String),
    TitleChanged(String),
    Crashed,
    Unresponsive,
    Responsive,
}

/// Outcome of closing a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabClose {
    /// A background tab was closed; the foreground tab did not change.
    Closed,
    /// The foreground tab was closed and this tab took its place.
    SwitchedTo(u64),
}
