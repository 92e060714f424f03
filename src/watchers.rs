//! In-memory mirror of the session's active watch subscriptions.
//!
//! Pure map, no network I/O. Mutated by watch/unwatch calls; a full-registry
//! refresh is authoritative and replaces the entire set atomically.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::Watcher;

#[derive(Default)]
pub(crate) struct WatchRegistry {
    inner: Mutex<HashMap<String, Watcher>>,
}

impl WatchRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for this watcher's id.
    pub(crate) fn upsert(&self, watcher: Watcher) {
        let mut inner = self.inner.lock().unwrap();
        inner.insert(watcher.watcher_id.clone(), watcher);
    }

    /// Remove the entry with this id, returning it if present.
    pub(crate) fn remove(&self, watcher_id: &str) -> Option<Watcher> {
        self.inner.lock().unwrap().remove(watcher_id)
    }

    /// Atomically replace the entire set. Insertion order is not preserved.
    pub(crate) fn replace_all(&self, watchers: Vec<Watcher>) {
        let map = watchers
            .into_iter()
            .map(|w| (w.watcher_id.clone(), w))
            .collect();
        *self.inner.lock().unwrap() = map;
    }

    /// Snapshot of the current set.
    pub(crate) fn list(&self) -> Vec<Watcher> {
        self.inner.lock().unwrap().values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub(crate) fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}
