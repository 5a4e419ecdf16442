//! Stacks several generators into one, in priority order.
//!
//! Reads return the first present value, existence checks OR across the
//! stack, child iteration merges without duplicates. Writes always go to
//! the **first** generator in the list, even if it rejects them; lower
//! entries are read-only fallbacks. Commit/refresh are forwarded to every
//! child and fail only after all of them have been attempted.
//!
//! The list itself can be changed at runtime. Readers work on an
//! immutable snapshot, so a single pass always sees a stable order.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::debug;

use super::same_generator;
use super::stack_children;
use super::stack_exists;
use super::stack_get;
use super::stack_has_children;
use super::stack_is_ok;
use super::stack_set;
use super::stack_sync;
use super::Depth;
use super::Generator;
use super::KeyIter;
use super::SyncOp;
use crate::ConfigKey;
use crate::Result;

pub struct ListGenerator {
    generators: ArcSwap<Vec<Arc<dyn Generator>>>,
    /// Serializes list mutations; readers never take it
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for ListGenerator {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ListGenerator").field("len", &self.len()).finish()
    }
}

impl ListGenerator {
    pub fn new(generators: Vec<Arc<dyn Generator>>) -> Self {
        Self {
            generators: ArcSwap::from_pointee(generators),
            write_lock: Mutex::new(()),
        }
    }

    /// Current list, highest priority first
    pub fn generators(&self) -> Arc<Vec<Arc<dyn Generator>>> {
        self.generators.load_full()
    }

    pub fn len(&self) -> usize {
        self.generators.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.load().is_empty()
    }

    /// Appends at the lowest priority
    pub fn push(
        &self,
        generator: Arc<dyn Generator>,
    ) {
        self.update(|list| list.push(generator));
    }

    /// Inserts at `index` (clamped to the list length)
    pub fn insert(
        &self,
        index: usize,
        generator: Arc<dyn Generator>,
    ) {
        self.update(|list| {
            let index = index.min(list.len());
            list.insert(index, generator);
        });
    }

    pub fn remove(
        &self,
        index: usize,
    ) -> Option<Arc<dyn Generator>> {
        let mut removed = None;
        self.update(|list| {
            if index < list.len() {
                removed = Some(list.remove(index));
            }
        });
        removed
    }

    /// Removes `generator` by identity; returns whether it was present
    pub fn remove_generator(
        &self,
        generator: &Arc<dyn Generator>,
    ) -> bool {
        let mut found = false;
        self.update(|list| {
            if let Some(pos) = list.iter().position(|g| same_generator(g, generator)) {
                list.remove(pos);
                found = true;
            }
        });
        found
    }

    fn update<F>(
        &self,
        f: F,
    ) where
        F: FnOnce(&mut Vec<Arc<dyn Generator>>),
    {
        let _guard = self.write_lock.lock();
        let mut next = Vec::clone(&self.generators.load());
        f(&mut next);
        debug!(len = next.len(), "ListGenerator updated");
        self.generators.store(Arc::new(next));
    }
}

impl Default for ListGenerator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Generator for ListGenerator {
    fn get(
        &self,
        key: &ConfigKey,
    ) -> Option<String> {
        stack_get(&self.generators.load(), key)
    }

    fn set(
        &self,
        key: &ConfigKey,
        value: Option<String>,
    ) -> Result<()> {
        stack_set(&self.generators.load(), key, value)
    }

    fn exists(
        &self,
        key: &ConfigKey,
    ) -> bool {
        stack_exists(&self.generators.load(), key)
    }

    fn has_children(
        &self,
        key: &ConfigKey,
    ) -> bool {
        stack_has_children(&self.generators.load(), key)
    }

    fn iterate_children(
        &self,
        key: &ConfigKey,
    ) -> KeyIter {
        stack_children(&self.generators.load(), key)
    }

    fn commit(
        &self,
        key: &ConfigKey,
        depth: Depth,
    ) -> Result<()> {
        stack_sync(&self.generators.load(), key, depth, SyncOp::Commit)
    }

    fn refresh(
        &self,
        key: &ConfigKey,
        depth: Depth,
    ) -> Result<()> {
        stack_sync(&self.generators.load(), key, depth, SyncOp::Refresh)
    }

    fn is_ok(&self) -> bool {
        stack_is_ok(&self.generators.load())
    }
}
