use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::config::WatchConfig;
use crate::ConfigHandle;
use crate::ConfigKey;
use crate::Depth;

/// Invoked with a handle to the key that changed
pub type WatchCallback = Arc<dyn Fn(&ConfigHandle) + Send + Sync>;

/// Identifies one watch registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u64);

impl WatchId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// Internal watcher state
struct Watcher {
    key: ConfigKey,
    depth: Depth,
    callback: WatchCallback,
}

impl Watcher {
    fn wants(
        &self,
        changed: &ConfigKey,
        deleted: bool,
    ) -> bool {
        self.depth.covers(&self.key, changed) || (deleted && changed.is_prefix_of(&self.key))
    }
}

pub struct WatchManager {
    /// Watchers by id (lock-free concurrent HashMap)
    watchers: DashMap<u64, Watcher>,

    /// Next watcher id (monotonically increasing)
    next_id: AtomicU64,

    config: WatchConfig,
}

impl fmt::Debug for WatchManager {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WatchManager")
            .field("watchers", &self.watchers.len())
            .field("next_id", &self.next_id)
            .field("config", &self.config)
            .finish()
    }
}

impl WatchManager {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            watchers: DashMap::new(),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    /// Registers `callback` for changes inside `(key, depth)`
    pub fn register(
        &self,
        key: ConfigKey,
        depth: Depth,
        callback: WatchCallback,
    ) -> WatchId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(watcher_id = id, key = %key, ?depth, "Watcher registered");
        self.watchers.insert(id, Watcher {
            key,
            depth,
            callback,
        });
        WatchId(id)
    }

    /// Cancels one registration; returns false if it was already gone
    pub fn unregister(
        &self,
        id: WatchId,
    ) -> bool {
        let removed = self.watchers.remove(&id.0).is_some();
        trace!(watcher_id = id.0, removed, "Watcher unregistered");
        removed
    }

    /// Runs every callback whose region contains `changed`.
    ///
    /// `handle_for` builds the handle passed to callbacks. Returns the number
    /// of callbacks invoked.
    pub fn notify<F>(
        &self,
        changed: &ConfigKey,
        deleted: bool,
        handle_for: F,
    ) -> usize
    where
        F: FnOnce(&ConfigKey) -> ConfigHandle,
    {
        if !self.config.enabled || self.watchers.is_empty() {
            return 0;
        }

        let mut matched: Vec<(u64, WatchCallback)> = self
            .watchers
            .iter()
            .filter(|entry| entry.value().wants(changed, deleted))
            .map(|entry| (*entry.key(), entry.value().callback.clone()))
            .collect();
        if matched.is_empty() {
            return 0;
        }
        // registration order, independent of shard layout
        matched.sort_by_key(|(id, _)| *id);

        let handle = handle_for(changed);
        for (_, callback) in &matched {
            callback(&handle);
        }
        trace!(key = %changed, deleted, watchers = matched.len(), "Change dispatched");
        matched.len()
    }

    /// Number of live registrations
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}
