//! Live route table: an arena of independently toggled entries.
//!
//! The table is mutated by discovery notifications arriving asynchronously
//! and read concurrently by every inbound HTTP request. Each entry owns an
//! atomic enabled flag, so readers never observe a half-updated entry and
//! no global table lock is held across request handling; rebuilds are
//! additive and incremental, never a wholesale swap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// One mounted route: a path slot forwarding to a backend address.
///
/// Disabled entries are inert but keep their slot, so a service coming
/// back up re-enables instead of re-registering.
#[derive(Debug)]
pub struct RouteEntry {
    path: String,
    order: i32,
    backend: String,
    service: String,
    enabled: AtomicBool,
}

impl RouteEntry {
    /// A new, enabled entry.
    pub fn new(
        path: impl Into<String>,
        order: i32,
        backend: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            order,
            backend: backend.into(),
            service: service.into(),
            enabled: AtomicBool::new(true),
        }
    }

    /// Mount path of this entry.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Match priority; higher wins.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Bus address requests forward to.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Name of the service that mounted this entry.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Whether the entry currently accepts requests.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Atomically enable the entry.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Atomically disable the entry. The slot is retained.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Whether a request path falls under this entry's mount path.
    pub fn matches(&self, request_path: &str) -> bool {
        if self.path == "/" {
            return true;
        }
        request_path == self.path
            || request_path
                .strip_prefix(self.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Path-indexed collection of route entries.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: RwLock<HashMap<String, Arc<RouteEntry>>>,
}

impl RouteTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount an entry, or re-enable the existing slot for its path.
    ///
    /// An existing slot pointing at a different backend is replaced — the
    /// service moved. Either way the mutation is a single-entry update.
    pub fn mount(&self, entry: RouteEntry) -> Arc<RouteEntry> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get(&entry.path) {
            Some(existing) if existing.backend == entry.backend => {
                existing.enable();
                existing.clone()
            }
            _ => {
                let entry = Arc::new(entry);
                entries.insert(entry.path.clone(), entry.clone());
                entry
            }
        }
    }

    /// Disable the entry at a path. Returns whether one existed.
    pub fn disable(&self, path: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        match entries.get(path) {
            Some(entry) => {
                entry.disable();
                true
            }
            None => false,
        }
    }

    /// Fetch the entry at a path, enabled or not.
    pub fn get(&self, path: &str) -> Option<Arc<RouteEntry>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(path).cloned()
    }

    /// Resolve a request path against the enabled entries.
    ///
    /// The most specific mount wins: highest order first, then longest
    /// path, then lexicographically greatest — fully deterministic for
    /// overlapping mounts.
    pub fn match_route(&self, request_path: &str) -> Option<Arc<RouteEntry>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .values()
            .filter(|entry| entry.is_enabled() && entry.matches(request_path))
            .max_by(|a, b| {
                a.order
                    .cmp(&b.order)
                    .then_with(|| a.path.len().cmp(&b.path.len()))
                    .then_with(|| a.path.cmp(&b.path))
            })
            .cloned()
    }

    /// Number of slots, enabled or not.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Whether the table holds no slots at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_matches_prefix_segments_only() {
        let entry = RouteEntry::new("/api/s/device", 13, "svc.device", "device");

        assert!(entry.matches("/api/s/device"));
        assert!(entry.matches("/api/s/device/battery"));
        assert!(!entry.matches("/api/s/devices"));
        assert!(!entry.matches("/api/s"));
    }

    #[test]
    fn test_root_entry_matches_everything() {
        let entry = RouteEntry::new("/", 1, "svc.fallback", "fallback");
        assert!(entry.matches("/anything/at/all"));
    }

    #[test]
    fn test_most_specific_route_wins() {
        let table = RouteTable::new();
        table.mount(RouteEntry::new("/a", 2, "svc.a", "a"));
        table.mount(RouteEntry::new("/a/b", 4, "svc.ab", "ab"));
        table.mount(RouteEntry::new("/a/b/c", 6, "svc.abc", "abc"));

        let hit = table.match_route("/a/b/c/d").unwrap();
        assert_eq!(hit.backend(), "svc.abc");
    }

    #[test]
    fn test_disabled_route_is_inert_but_retained() {
        let table = RouteTable::new();
        table.mount(RouteEntry::new("/a", 2, "svc.a", "a"));
        table.mount(RouteEntry::new("/a/b", 4, "svc.ab", "ab"));

        assert!(table.disable("/a/b"));
        let hit = table.match_route("/a/b/x").unwrap();
        assert_eq!(hit.backend(), "svc.a");

        // The slot survives and re-mounting re-enables it in place.
        assert_eq!(table.len(), 2);
        table.mount(RouteEntry::new("/a/b", 4, "svc.ab", "ab"));
        let hit = table.match_route("/a/b/x").unwrap();
        assert_eq!(hit.backend(), "svc.ab");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_mount_replaces_moved_backend() {
        let table = RouteTable::new();
        table.mount(RouteEntry::new("/a", 2, "svc.old", "a"));
        table.mount(RouteEntry::new("/a", 2, "svc.new", "a"));

        assert_eq!(table.match_route("/a").unwrap().backend(), "svc.new");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_no_match_on_empty_or_disabled_table() {
        let table = RouteTable::new();
        assert!(table.match_route("/a").is_none());

        table.mount(RouteEntry::new("/a", 2, "svc.a", "a"));
        table.disable("/a");
        assert!(table.match_route("/a").is_none());
    }

    #[test]
    fn test_disable_unknown_path() {
        let table = RouteTable::new();
        assert!(!table.disable("/ghost"));
    }
}
