//! Listener table: event-type tag -> ordered callbacks.
//!
//! Dispatch invokes every callback registered under the event's tag, then
//! every callback under the wildcard tag `"all"`, in registration order.
//! A panicking callback is caught and reported to the observability sink;
//! it never stops dispatch to the remaining callbacks.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use crate::models::MonitorEvent;
use crate::observe::{LogLevel, SharedSink};

/// Tag whose callbacks receive every event regardless of type.
pub const WILDCARD_TAG: &str = "all";

/// An event callback. Registered multiple times, it fires multiple times;
/// removal is by `Arc` identity and removes every occurrence.
pub type EventCallback = Arc<dyn Fn(&MonitorEvent) + Send + Sync>;

pub(crate) struct ListenerTable {
    inner: Mutex<HashMap<String, Vec<EventCallback>>>,
    sink: SharedSink,
}

impl ListenerTable {
    pub(crate) fn new(sink: SharedSink) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            sink,
        }
    }

    /// Append a callback under `tag`. Never deduplicates.
    pub(crate) fn register(&self, tag: &str, callback: EventCallback) {
        let mut inner = self.inner.lock().unwrap();
        inner.entry(tag.to_string()).or_default().push(callback);
    }

    /// Remove callbacks under `tag`. With a callback, removes every
    /// occurrence matching that reference; without one, deletes the whole
    /// tag's list.
    pub(crate) fn unregister(&self, tag: &str, callback: Option<&EventCallback>) {
        let mut inner = self.inner.lock().unwrap();
        match callback {
            Some(target) => {
                if let Some(list) = inner.get_mut(tag) {
                    list.retain(|cb| !Arc::ptr_eq(cb, target));
                    if list.is_empty() {
                        inner.remove(tag);
                    }
                }
            },
            None => {
                inner.remove(tag);
            },
        }
    }

    /// Drop every registration. Used by `disconnect()`.
    pub(crate) fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }

    /// Number of callbacks registered under `tag`.
    pub(crate) fn count(&self, tag: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .get(tag)
            .map_or(0, |list| list.len())
    }

    /// Dispatch under the event's own tag (default `"detection"`).
    pub(crate) fn dispatch(&self, event: &MonitorEvent) {
        self.dispatch_tagged(event.tag(), event);
    }

    /// Dispatch under an explicit tag. Used for notification messages,
    /// which are always tagged `"notification"` regardless of any
    /// event-type field they carry.
    pub(crate) fn dispatch_tagged(&self, tag: &str, event: &MonitorEvent) {
        // Snapshot under the lock so callbacks may register/unregister
        // without deadlocking; dispatch itself is synchronous and ordered.
        let targets: Vec<EventCallback> = {
            let inner = self.inner.lock().unwrap();
            let mut targets = Vec::new();
            if let Some(list) = inner.get(tag) {
                targets.extend(list.iter().cloned());
            }
            if tag != WILDCARD_TAG {
                if let Some(list) = inner.get(WILDCARD_TAG) {
                    targets.extend(list.iter().cloned());
                }
            }
            targets
        };

        for callback in targets {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                self.sink
                    .log(LogLevel::Warn, "event listener panicked during dispatch", tag);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::NullSink;

    fn table() -> ListenerTable {
        ListenerTable::new(Arc::new(NullSink))
    }

    fn event(event_type: Option<&str>) -> MonitorEvent {
        MonitorEvent {
            event_type: event_type.map(|s| s.to_string()),
            ..Default::default()
        }
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &str) -> EventCallback {
        let log = log.clone();
        let name = name.to_string();
        Arc::new(move |_event| log.lock().unwrap().push(name.clone()))
    }

    #[test]
    fn test_dispatch_order_and_wildcard_union() {
        let table = table();
        let log = Arc::new(Mutex::new(Vec::new()));
        table.register("detection", recorder(&log, "a"));
        table.register("detection", recorder(&log, "b"));
        table.register("all", recorder(&log, "wild"));
        table.register("alert", recorder(&log, "other"));

        table.dispatch(&event(Some("detection")));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "wild"]);
    }

    #[test]
    fn test_missing_event_type_defaults_to_detection() {
        let table = table();
        let log = Arc::new(Mutex::new(Vec::new()));
        table.register("detection", recorder(&log, "a"));
        table.dispatch(&event(None));
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_duplicate_registration_fires_twice() {
        let table = table();
        let log = Arc::new(Mutex::new(Vec::new()));
        let cb = recorder(&log, "dup");
        table.register("detection", cb.clone());
        table.register("detection", cb);
        table.dispatch(&event(Some("detection")));
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_unregister_by_reference_removes_all_occurrences() {
        let table = table();
        let log = Arc::new(Mutex::new(Vec::new()));
        let cb = recorder(&log, "dup");
        let other = recorder(&log, "keep");
        table.register("detection", cb.clone());
        table.register("detection", other);
        table.register("detection", cb.clone());
        table.unregister("detection", Some(&cb));
        table.dispatch(&event(Some("detection")));
        assert_eq!(*log.lock().unwrap(), vec!["keep"]);
    }

    #[test]
    fn test_unregister_without_reference_clears_tag() {
        let table = table();
        let log = Arc::new(Mutex::new(Vec::new()));
        table.register("detection", recorder(&log, "a"));
        table.register("all", recorder(&log, "wild"));
        table.unregister("detection", None);
        table.dispatch(&event(Some("detection")));
        assert_eq!(*log.lock().unwrap(), vec!["wild"]);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_dispatch() {
        let table = table();
        let log = Arc::new(Mutex::new(Vec::new()));
        table.register("detection", recorder(&log, "first"));
        table.register(
            "detection",
            Arc::new(|_event: &MonitorEvent| panic!("listener blew up")) as EventCallback,
        );
        table.register("detection", recorder(&log, "third"));

        table.dispatch(&event(Some("detection")));
        assert_eq!(*log.lock().unwrap(), vec!["first", "third"]);
    }

    #[test]
    fn test_dispatch_tagged_overrides_event_type() {
        let table = table();
        let log = Arc::new(Mutex::new(Vec::new()));
        table.register("notification", recorder(&log, "notif"));
        table.register("detection", recorder(&log, "det"));

        // Notification messages dispatch under "notification" even when the
        // payload claims another type.
        table.dispatch_tagged("notification", &event(Some("detection")));
        assert_eq!(*log.lock().unwrap(), vec!["notif"]);
    }

    #[test]
    fn test_clear_drops_everything() {
        let table = table();
        let log = Arc::new(Mutex::new(Vec::new()));
        table.register("detection", recorder(&log, "a"));
        table.register("all", recorder(&log, "wild"));
        table.clear();
        assert_eq!(table.count("detection"), 0);
        table.dispatch(&event(Some("detection")));
        assert!(log.lock().unwrap().is_empty());
    }
}
