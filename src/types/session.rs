use serde::{Deserialize, Serialize};

/// One persisted tab entry.
///
/// `url` is empty for a blank page; the in-memory blank marker never reaches
/// disk. Ids are process-local and not stable across restarts — the restore
/// path assigns fresh ids keyed only on position and url.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabSnapshot {
    pub id: u64,
    pub url: String,
    pub title: String,
}

/// Timestamped, insertion-ordered record of the open tabs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    /// Epoch milliseconds at save time.
    pub timestamp: i64,
    pub tabs: Vec<TabSnapshot>,
}
