use crate::types::tab::TabState;

/// Trait defining the live tab bookkeeping interface.
pub trait TabManagerTrait {
    fn insert(&mut self, state: TabState);
    fn remove(&mut self, tab_id: u64) -> Option<TabState>;
    fn get(&self, tab_id: u64) -> Option<&TabState>;
    fn get_mut(&mut self, tab_id: u64) -> Option<&mut TabState>;
    fn contains(&self, tab_id: u64) -> bool;
    fn states(&self) -> &[TabState];
    fn ids(&self) -> Vec<u64>;
    fn tab_count(&self) -> usize;
    fn current_tab_id(&self) -> Option<u64>;
    fn set_current(&mut self, tab_id: u64) -> bool;
    fn touch(&mut self, tab_id: u64);
    fn usage_history(&self) -> &[u64];
    fn most_recent_surviving(&self) -> Option<u64>;
}

/// In-memory bookkeeping for the live tab set.
///
/// Holds the insertion-ordered tab states, the foreground-tab pointer, and
/// the most-recently-used history that picks a fallback foreground tab when
/// the current one closes. All mutation happens on the UI event-loop
/// thread.
pub struct TabManager {
    tabs: Vec<TabState>,
    current_tab_id: Option<u64>,
    usage_history: Vec<u64>,
}

impl TabManager {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            current_tab_id: None,
            usage_history: Vec::new(),
        }
    }

    fn find_tab_index(&self, tab_id: u64) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TabManagerTrait for TabManager {
    /// Appends a tab at the end of the insertion order.
    fn insert(&mut self, state: TabState) {
        self.tabs.push(state);
    }

    /// Removes a tab, scrubbing it from the usage history.
    ///
    /// The foreground pointer is left untouched: the session controller
    /// picks the replacement right after a foreground tab is removed.
    fn remove(&mut self, tab_id: u64) -> Option<TabState> {
        let idx = self.find_tab_index(tab_id)?;
        self.usage_history.retain(|id| *id != tab_id);
        Some(self.tabs.remove(idx))
    }

    fn get(&self, tab_id: u64) -> Option<&TabState> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    fn get_mut(&mut self, tab_id: u64) -> Option<&mut TabState> {
        self.tabs.iter_mut().find(|t| t.id == tab_id)
    }

    fn contains(&self, tab_id: u64) -> bool {
        self.find_tab_index(tab_id).is_some()
    }

    /// Tab states in insertion order.
    fn states(&self) -> &[TabState] {
        &self.tabs
    }

    /// Tab ids in insertion order.
    fn ids(&self) -> Vec<u64> {
        self.tabs.iter().map(|t| t.id).collect()
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    fn current_tab_id(&self) -> Option<u64> {
        self.current_tab_id
    }

    /// Points the foreground at `tab_id`. Returns false for unknown ids.
    fn set_current(&mut self, tab_id: u64) -> bool {
        if !self.contains(tab_id) {
            return false;
        }
        self.current_tab_id = Some(tab_id);
        true
    }

    /// Records a use of `tab_id` at the head of the usage history,
    /// removing any older entry for the same id.
    fn touch(&mut self, tab_id: u64) {
        self.usage_history.retain(|id| *id != tab_id);
        self.usage_history.insert(0, tab_id);
    }

    fn usage_history(&self) -> &[u64] {
        &self.usage_history
    }

    /// Most recently used tab that still exists.
    ///
    /// The history is never trusted blindly: ids no longer present in the
    /// live tab set are skipped, and when every entry is stale the first
    /// remaining tab is the fallback.
    fn most_recent_surviving(&self) -> Option<u64> {
        for id in &self.usage_history {
            if self.contains(*id) {
                return Some(*id);
            }
        }
        self.tabs.first().map(|t| t.id)
    }
}
