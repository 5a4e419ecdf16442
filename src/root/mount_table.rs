use std::collections::BTreeMap;
use std::sync::Arc;

use crate::generator::stack_children;
use crate::generator::stack_exists;
use crate::generator::stack_get;
use crate::generator::stack_has_children;
use crate::generator::stack_is_ok;
use crate::generator::stack_set;
use crate::generator::stack_sync;
use crate::generator::SyncOp;
use crate::ConfigKey;
use crate::Depth;
use crate::Generator;
use crate::KeyIter;
use crate::Result;

/// One generator mounted at a mount point
#[derive(Clone)]
pub(crate) struct MountEntry {
    pub(crate) generator: Arc<dyn Generator>,
    /// False when the caller kept its own reference at mount time
    pub(crate) owned: bool,
    pub(crate) moniker: Option<String>,
}

impl MountEntry {
    /// Name used in logs and `BackendUnavailable` errors
    pub(crate) fn describe(
        &self,
        mount_point: &ConfigKey,
    ) -> String {
        match &self.moniker {
            Some(moniker) => moniker.clone(),
            None => format!("generator at '/{}'", mount_point),
        }
    }
}

/// Result of a longest-prefix lookup
pub(crate) struct Resolved {
    pub(crate) mount_point: ConfigKey,
    /// `key` relative to `mount_point`
    pub(crate) relative: ConfigKey,
    /// Every generator mounted at `mount_point`, in registration order
    pub(crate) generators: Vec<Arc<dyn Generator>>,
}

impl Resolved {
    /// The stack as a single generator
    pub(crate) fn into_generator(self) -> Arc<dyn Generator> {
        MountStack::wrap(self.generators)
    }
}

/// Mount point to generator stack. Same-key mounts keep registration
/// order: the first registered answers reads first and receives writes.
#[derive(Default)]
pub(crate) struct MountTable {
    mounts: BTreeMap<ConfigKey, Vec<MountEntry>>,
}

impl MountTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(
        &mut self,
        mount_point: ConfigKey,
        entry: MountEntry,
    ) {
        self.mounts.entry(mount_point).or_default().push(entry);
    }

    /// Removes the entry holding `generator` at `mount_point`
    pub(crate) fn remove_entry(
        &mut self,
        mount_point: &ConfigKey,
        generator: &Arc<dyn Generator>,
    ) -> Option<MountEntry> {
        let entries = self.mounts.get_mut(mount_point)?;
        let index = entries
            .iter()
            .position(|e| crate::generator::same_generator(&e.generator, generator))?;
        let entry = entries.remove(index);
        if entries.is_empty() {
            self.mounts.remove(mount_point);
        }
        Some(entry)
    }

    /// Removes the whole stack at `mount_point`
    pub(crate) fn remove_all(
        &mut self,
        mount_point: &ConfigKey,
    ) -> Vec<MountEntry> {
        self.mounts.remove(mount_point).unwrap_or_default()
    }

    /// Deepest mount point at or above `key`
    pub(crate) fn which_mount(
        &self,
        key: &ConfigKey,
    ) -> Option<ConfigKey> {
        self.mounts
            .keys()
            .filter(|m| m.is_prefix_of(key))
            .max_by_key(|m| m.segment_count())
            .cloned()
    }

    /// Longest-prefix match for `key`
    pub(crate) fn resolve(
        &self,
        key: &ConfigKey,
    ) -> Option<Resolved> {
        let mount_point = self.which_mount(key)?;
        let generators = self.mounts.get(&mount_point)?.iter().map(|e| e.generator.clone()).collect();
        Some(Resolved {
            relative: key.remove_first(mount_point.segment_count()),
            mount_point,
            generators,
        })
    }

    pub(crate) fn entries_at(
        &self,
        mount_point: &ConfigKey,
    ) -> &[MountEntry] {
        self.mounts.get(mount_point).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mount points strictly below `key`, in key order
    pub(crate) fn mounts_below<'a>(
        &'a self,
        key: &'a ConfigKey,
    ) -> impl Iterator<Item = (&'a ConfigKey, &'a [MountEntry])> + 'a {
        self.mounts
            .range(key.clone()..)
            .take_while(move |(m, _)| key.is_prefix_of(m))
            .filter(move |(m, _)| m.segment_count() > key.segment_count())
            .map(|(m, entries)| (m, entries.as_slice()))
    }

    /// Next segment of every mount point strictly below `key`
    pub(crate) fn mount_children(
        &self,
        key: &ConfigKey,
    ) -> Vec<ConfigKey> {
        let depth = key.segment_count();
        let mut names: Vec<ConfigKey> = self
            .mounts_below(key)
            .map(|(m, _)| ConfigKey::new(m.segment(depth)))
            .collect();
        names.dedup();
        names
    }

    pub(crate) fn mount_points(&self) -> Vec<ConfigKey> {
        self.mounts.keys().cloned().collect()
    }

    pub(crate) fn drain(&mut self) -> Vec<(ConfigKey, MountEntry)> {
        std::mem::take(&mut self.mounts)
            .into_iter()
            .flat_map(|(m, entries)| entries.into_iter().map(move |e| (m.clone(), e)))
            .collect()
    }
}

/// Several generators mounted at the same key, seen as one
pub(crate) struct MountStack {
    generators: Vec<Arc<dyn Generator>>,
}

impl MountStack {
    /// A lone generator is returned as-is
    pub(crate) fn wrap(mut generators: Vec<Arc<dyn Generator>>) -> Arc<dyn Generator> {
        if generators.len() == 1 {
            if let Some(single) = generators.pop() {
                return single;
            }
        }
        Arc::new(MountStack { generators })
    }
}

impl Generator for MountStack {
    fn get(
        &self,
        key: &ConfigKey,
    ) -> Option<String> {
        stack_get(&self.generators, key)
    }

    fn set(
        &self,
        key: &ConfigKey,
        value: Option<String>,
    ) -> Result<()> {
        stack_set(&self.generators, key, value)
    }

    fn exists(
        &self,
        key: &ConfigKey,
    ) -> bool {
        stack_exists(&self.generators, key)
    }

    fn has_children(
        &self,
        key: &ConfigKey,
    ) -> bool {
        stack_has_children(&self.generators, key)
    }

    fn iterate_children(
        &self,
        key: &ConfigKey,
    ) -> KeyIter {
        stack_children(&self.generators, key)
    }

    fn commit(
        &self,
        key: &ConfigKey,
        depth: Depth,
    ) -> Result<()> {
        stack_sync(&self.generators, key, depth, SyncOp::Commit)
    }

    fn refresh(
        &self,
        key: &ConfigKey,
        depth: Depth,
    ) -> Result<()> {
        stack_sync(&self.generators, key, depth, SyncOp::Refresh)
    }

    fn is_ok(&self) -> bool {
        stack_is_ok(&self.generators)
    }
}
