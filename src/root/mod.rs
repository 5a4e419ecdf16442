//! Registry root and mount resolution
//!
//! [`ConfigRoot`] owns the mount table: a map from mount point to the
//! generators mounted there. Every key is answered by the deepest mount
//! point at or above it (longest-prefix match); the key is translated into
//! that generator's relative key space before delegating. Several
//! generators mounted at the same key form a priority stack in
//! registration order.
//!
//! Subtree `commit`/`refresh` reach the generator resolved for the key plus
//! every generator mounted below it, and report all failures together.
//!
//! Mount-table writes take an exclusive lock; lookups share it and release
//! it before any generator is called, so slow backends never block mounts.

mod mount_table;


use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use self::mount_table::MountEntry;
use self::mount_table::MountTable;
use crate::config::RegistryConfig;
use crate::config::TeardownConfig;
use crate::generator::MergedKeys;
use crate::generator::SyncOp;
use crate::watch::WatchCallback;
use crate::watch::WatchId;
use crate::watch::WatchManager;
use crate::ConfigHandle;
use crate::ConfigKey;
use crate::Depth;
use crate::Error;
use crate::Generator;
use crate::KeyIter;
use crate::MonikerRegistry;
use crate::Result;
use crate::SyncFailures;

/// The registry: owns mounted generators and hands out [`ConfigHandle`]s.
///
/// Handles only hold a weak reference; once the root is dropped they
/// behave as if backed by a `NullGenerator`.
pub struct ConfigRoot {
    shared: Arc<RootShared>,
}

/// State shared between the root and its handles
pub(crate) struct RootShared {
    mounts: RwLock<MountTable>,
    watches: WatchManager,
    monikers: MonikerRegistry,
    teardown: TeardownConfig,
}

impl std::fmt::Debug for ConfigRoot {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ConfigRoot")
            .field("mount_points", &self.mount_points())
            .field("watches", &self.shared.watches)
            .finish()
    }
}

impl Default for ConfigRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRoot {
    /// An empty registry with default settings
    pub fn new() -> Self {
        Self::with_settings(&RegistryConfig::default())
    }

    /// Builds a registry and mounts every entry of `config.mounts` in order
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let root = Self::with_settings(config);
        for mount in &config.mounts {
            root.mount_moniker(&mount.key, &mount.moniker, mount.refresh)?;
        }
        debug!(mounts = config.mounts.len(), "Registry built from config");
        Ok(root)
    }

    fn with_settings(config: &RegistryConfig) -> Self {
        Self {
            shared: Arc::new(RootShared {
                mounts: RwLock::new(MountTable::new()),
                watches: WatchManager::new(config.watch.clone()),
                monikers: MonikerRegistry::new(),
                teardown: config.teardown.clone(),
            }),
        }
    }

    /// Handle to the root key
    pub fn handle(&self) -> ConfigHandle {
        ConfigHandle::new(Arc::downgrade(&self.shared), ConfigKey::root())
    }

    /// Handle to `key`; pure key arithmetic, no lookup
    pub fn at(
        &self,
        key: impl Into<ConfigKey>,
    ) -> ConfigHandle {
        ConfigHandle::new(Arc::downgrade(&self.shared), key.into())
    }

    /// Scheme registry used by moniker mounts; custom schemes go here
    pub fn monikers(&self) -> &MonikerRegistry {
        &self.shared.monikers
    }

    /// Mounts `generator` at `key`; the root owns it from now on
    pub fn mount(
        &self,
        key: &ConfigKey,
        generator: Box<dyn Generator>,
        refresh: bool,
    ) -> Result<()> {
        self.shared.mount(key, Arc::from(generator), true, None, refresh)
    }

    /// Mounts a generator the caller keeps a reference to
    pub fn mount_shared(
        &self,
        key: &ConfigKey,
        generator: Arc<dyn Generator>,
        refresh: bool,
    ) -> Result<()> {
        self.shared.mount(key, generator, false, None, refresh)
    }

    /// Creates a generator from `moniker` and mounts it at `key`
    pub fn mount_moniker(
        &self,
        key: &ConfigKey,
        moniker: &str,
        refresh: bool,
    ) -> Result<()> {
        self.shared.mount_moniker(key, moniker, refresh)
    }

    /// Removes the generators providing `key`, committing them first if asked
    pub fn unmount(
        &self,
        key: &ConfigKey,
        commit: bool,
    ) -> Result<()> {
        self.shared.unmount(key, commit)
    }

    /// Generator answering `key`, or `None` if nothing covers it
    pub fn resolve(
        &self,
        key: &ConfigKey,
    ) -> Option<Arc<dyn Generator>> {
        self.shared.resolve(key)
    }

    /// Like [`resolve`](Self::resolve), plus the key it is mounted at
    pub fn which_mount(
        &self,
        key: &ConfigKey,
    ) -> Option<(Arc<dyn Generator>, ConfigKey)> {
        self.shared.which_mount(key)
    }

    pub fn is_mount_point(
        &self,
        key: &ConfigKey,
    ) -> bool {
        self.shared.is_mount_point(key)
    }

    /// Every mount point, in key order
    pub fn mount_points(&self) -> Vec<ConfigKey> {
        self.shared.mounts.read().mount_points()
    }

    pub fn get(
        &self,
        key: &ConfigKey,
    ) -> Option<String> {
        self.shared.get(key)
    }

    pub fn set(
        &self,
        key: &ConfigKey,
        value: Option<&str>,
    ) -> Result<()> {
        self.shared.set(key, value)
    }

    pub fn exists(
        &self,
        key: &ConfigKey,
    ) -> bool {
        self.shared.exists(key)
    }

    pub fn has_children(
        &self,
        key: &ConfigKey,
    ) -> bool {
        self.shared.has_children(key)
    }

    /// Commits every generator in the subtree at `key`, bounded by `depth`
    pub fn commit(
        &self,
        key: &ConfigKey,
        depth: Depth,
    ) -> Result<()> {
        self.shared.sync(key, depth, SyncOp::Commit)
    }

    /// Refreshes every generator in the subtree at `key`, bounded by `depth`
    pub fn refresh(
        &self,
        key: &ConfigKey,
        depth: Depth,
    ) -> Result<()> {
        self.shared.sync(key, depth, SyncOp::Refresh)
    }

    pub fn add_watch(
        &self,
        key: &ConfigKey,
        depth: Depth,
        callback: WatchCallback,
    ) -> WatchId {
        self.shared.add_watch(key, depth, callback)
    }

    pub fn del_watch(
        &self,
        id: WatchId,
    ) -> bool {
        self.shared.watches().unregister(id)
    }
}

impl RootShared {
    pub(crate) fn watches(&self) -> &WatchManager {
        &self.watches
    }

    pub(crate) fn mount_moniker(
        &self,
        key: &ConfigKey,
        moniker: &str,
        refresh: bool,
    ) -> Result<()> {
        let generator = self.monikers.create(moniker)?;
        self.mount(key, generator, true, Some(moniker.to_string()), refresh)
    }

    /// Inserts, optionally refreshes, and backs the mount out again if the
    /// generator ends up unusable
    pub(crate) fn mount(
        &self,
        key: &ConfigKey,
        generator: Arc<dyn Generator>,
        owned: bool,
        moniker: Option<String>,
        refresh: bool,
    ) -> Result<()> {
        let entry = MountEntry {
            generator: generator.clone(),
            owned,
            moniker,
        };
        let name = entry.describe(key);
        self.mounts.write().insert(key.clone(), entry);
        debug!(mount_point = %key, generator = %name, owned, "Generator mounted");

        if refresh {
            if let Err(e) = generator.refresh(&ConfigKey::root(), Depth::Infinite) {
                warn!(mount_point = %key, generator = %name, error = %e, "Refresh after mount failed");
            }
        }

        if !generator.is_ok() {
            self.mounts.write().remove_entry(key, &generator);
            warn!(mount_point = %key, generator = %name, "Generator unusable, mount withdrawn");
            return Err(Error::BackendUnavailable { moniker: name });
        }
        Ok(())
    }

    /// Commits the stack providing `key` if asked, then removes it.
    ///
    /// A failed commit leaves the stack mounted so the caller can retry or
    /// unmount without committing.
    pub(crate) fn unmount(
        &self,
        key: &ConfigKey,
        commit: bool,
    ) -> Result<()> {
        let (mount_point, generators) = {
            let mounts = self.mounts.read();
            let Some(mount_point) = mounts.which_mount(key) else {
                debug!(key = %key, "Nothing mounted to unmount");
                return Ok(());
            };
            let generators: Vec<Arc<dyn Generator>> =
                mounts.entries_at(&mount_point).iter().map(|e| e.generator.clone()).collect();
            (mount_point, generators)
        };

        if commit {
            let mut failures = SyncFailures::new();
            for generator in &generators {
                if let Err(e) = generator.commit(&ConfigKey::root(), Depth::Infinite) {
                    warn!(
                        mount_point = %mount_point,
                        error = %e,
                        "Commit before unmount failed, keeping mount"
                    );
                    failures.push(mount_point.clone(), e);
                }
            }
            failures.into_result()?;
        }

        let removed = self.mounts.write().remove_all(&mount_point);
        for entry in &removed {
            debug!(
                mount_point = %mount_point,
                generator = %entry.describe(&mount_point),
                owned = entry.owned,
                "Generator unmounted"
            );
        }
        Ok(())
    }

    pub(crate) fn resolve(
        &self,
        key: &ConfigKey,
    ) -> Option<Arc<dyn Generator>> {
        let resolved = self.mounts.read().resolve(key)?;
        trace!(key = %key, mount_point = %resolved.mount_point, "Resolved");
        Some(resolved.into_generator())
    }

    pub(crate) fn which_mount(
        &self,
        key: &ConfigKey,
    ) -> Option<(Arc<dyn Generator>, ConfigKey)> {
        let resolved = self.mounts.read().resolve(key)?;
        let mount_point = resolved.mount_point.clone();
        Some((resolved.into_generator(), mount_point))
    }

    pub(crate) fn is_mount_point(
        &self,
        key: &ConfigKey,
    ) -> bool {
        !self.mounts.read().entries_at(key).is_empty()
    }

    /// Generators mounted exactly at `key`, in registration order
    pub(crate) fn mounts_at(
        &self,
        key: &ConfigKey,
    ) -> Vec<Arc<dyn Generator>> {
        self.mounts.read().entries_at(key).iter().map(|e| e.generator.clone()).collect()
    }

    pub(crate) fn get(
        &self,
        key: &ConfigKey,
    ) -> Option<String> {
        let resolved = self.mounts.read().resolve(key)?;
        crate::generator::stack_get(&resolved.generators, &resolved.relative)
    }

    /// Writes through the resolved generator, then notifies watchers
    pub(crate) fn set(
        self: &Arc<Self>,
        key: &ConfigKey,
        value: Option<&str>,
    ) -> Result<()> {
        let resolved = self.mounts.read().resolve(key);
        let Some(resolved) = resolved else {
            return Err(Error::rejected(key, "no generator mounted"));
        };
        crate::generator::stack_set(&resolved.generators, &resolved.relative, value.map(str::to_string))?;

        let weak = Arc::downgrade(self);
        self.watches.notify(key, value.is_none(), |changed| {
            ConfigHandle::new(weak, changed.clone())
        });
        Ok(())
    }

    /// Stored at `key`, or a mount point at or below it
    pub(crate) fn exists(
        &self,
        key: &ConfigKey,
    ) -> bool {
        let (resolved, mounted) = {
            let mounts = self.mounts.read();
            let mounted =
                !mounts.entries_at(key).is_empty() || mounts.mounts_below(key).next().is_some();
            (mounts.resolve(key), mounted)
        };
        mounted
            || resolved
                .map(|r| crate::generator::stack_exists(&r.generators, &r.relative))
                .unwrap_or(false)
    }

    pub(crate) fn has_children(
        &self,
        key: &ConfigKey,
    ) -> bool {
        let (resolved, mounted_below) = {
            let mounts = self.mounts.read();
            let below = mounts.mounts_below(key).next().is_some();
            (mounts.resolve(key), below)
        };
        mounted_below
            || resolved
                .map(|r| crate::generator::stack_has_children(&r.generators, &r.relative))
                .unwrap_or(false)
    }

    /// Direct child names of `key`, including the next segment of deeper
    /// mount points
    pub(crate) fn children(
        &self,
        key: &ConfigKey,
    ) -> KeyIter {
        let (resolved, mount_children) = {
            let mounts = self.mounts.read();
            (mounts.resolve(key), mounts.mount_children(key))
        };
        let mut sources: Vec<KeyIter> = Vec::with_capacity(2);
        if let Some(r) = resolved {
            sources.push(crate::generator::stack_children(&r.generators, &r.relative));
        }
        if !mount_children.is_empty() {
            sources.push(Box::new(mount_children.into_iter()));
        }
        Box::new(MergedKeys::new(sources))
    }

    /// Runs `op` over the resolved generator for `key` and every mount below
    /// it that `depth` reaches. Every target is attempted.
    pub(crate) fn sync(
        &self,
        key: &ConfigKey,
        depth: Depth,
        op: SyncOp,
    ) -> Result<()> {
        let targets = self.sync_targets(key, depth);
        trace!(key = %key, ?depth, ?op, targets = targets.len(), "Subtree sync");

        let mut failures = SyncFailures::new();
        for target in targets {
            if let Err(e) = op.apply(target.generator.as_ref(), &target.relative, target.depth) {
                warn!(
                    ?op,
                    mount_point = %target.mount_point,
                    key = %target.relative,
                    error = %e,
                    "Generator sync failed"
                );
                failures.push(target.mount_point, e);
            }
        }
        failures.into_result()
    }

    fn sync_targets(
        &self,
        key: &ConfigKey,
        depth: Depth,
    ) -> Vec<SyncTarget> {
        let mounts = self.mounts.read();
        let mut targets = Vec::new();

        if let Some(resolved) = mounts.resolve(key) {
            for generator in &resolved.generators {
                targets.push(SyncTarget {
                    mount_point: resolved.mount_point.clone(),
                    generator: generator.clone(),
                    relative: resolved.relative.clone(),
                    depth,
                });
            }
        }

        for (mount_point, entries) in mounts.mounts_below(key) {
            let below = mount_point.segment_count() - key.segment_count();
            let reach = match depth {
                Depth::Infinite => Depth::Infinite,
                Depth::OneLevel if below == 1 => Depth::Zero,
                _ => continue,
            };
            for entry in entries {
                targets.push(SyncTarget {
                    mount_point: mount_point.clone(),
                    generator: entry.generator.clone(),
                    relative: ConfigKey::root(),
                    depth: reach,
                });
            }
        }
        targets
    }

    pub(crate) fn add_watch(
        &self,
        key: &ConfigKey,
        depth: Depth,
        callback: WatchCallback,
    ) -> WatchId {
        self.watches.register(key.clone(), depth, callback)
    }
}

struct SyncTarget {
    mount_point: ConfigKey,
    generator: Arc<dyn Generator>,
    relative: ConfigKey,
    depth: Depth,
}

impl Drop for RootShared {
    fn drop(&mut self) {
        let entries = self.mounts.get_mut().drain();
        if self.teardown.commit_on_drop {
            for (mount_point, entry) in entries.iter().filter(|(_, e)| e.owned) {
                if let Err(e) = entry.generator.commit(&ConfigKey::root(), Depth::Infinite) {
                    warn!(mount_point = %mount_point, error = %e, "Commit on teardown failed");
                }
            }
        }
        debug!(mounts = entries.len(), "Registry torn down");
    }
}
