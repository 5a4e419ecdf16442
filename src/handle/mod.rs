//! Lightweight `(root, key)` references.
//!
//! A [`ConfigHandle`] caches nothing: every call goes through the root's
//! mount resolution. Child navigation is key concatenation and never
//! touches a generator. Handles hold a weak reference to the root, so a
//! handle that outlives its root is safe and reads as empty.

#[cfg(test)]
mod handle_test;

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::sync::Weak;

use crate::generator::SyncOp;
use crate::iter::ChildIter;
use crate::iter::RecursiveIter;
use crate::iter::Sorted;
use crate::iter::WildcardIter;
use crate::root::RootShared;
use crate::watch::WatchCallback;
use crate::watch::WatchId;
use crate::ConfigKey;
use crate::Depth;
use crate::Error;
use crate::Generator;
use crate::KeyIter;
use crate::Result;
use crate::StorageError;

const TRUE_WORDS: [&str; 4] = ["true", "yes", "on", "enabled"];
const FALSE_WORDS: [&str; 4] = ["false", "no", "off", "disabled"];

#[derive(Clone, Default)]
pub struct ConfigHandle {
    root: Option<Weak<RootShared>>,
    key: ConfigKey,
}

impl ConfigHandle {
    pub(crate) fn new(
        root: Weak<RootShared>,
        key: ConfigKey,
    ) -> Self {
        Self {
            root: Some(root),
            key,
        }
    }

    /// A handle attached to no root
    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        self.root.is_none()
    }

    /// Root handle of the same registry
    pub fn root(&self) -> ConfigHandle {
        self.with_key(ConfigKey::root())
    }

    /// Parent handle; the root is its own parent
    pub fn parent(&self) -> ConfigHandle {
        self.with_key(self.key.parent())
    }

    /// Handle to `key` below this one
    pub fn child(
        &self,
        key: impl Into<ConfigKey>,
    ) -> ConfigHandle {
        self.with_key(self.key.concat(&key.into()))
    }

    fn with_key(
        &self,
        key: ConfigKey,
    ) -> ConfigHandle {
        Self {
            root: self.root.clone(),
            key,
        }
    }

    /// The absolute key
    pub fn full_key(&self) -> &ConfigKey {
        &self.key
    }

    /// The last segment of the absolute key
    pub fn key(&self) -> ConfigKey {
        self.key.last()
    }

    pub(crate) fn shared(&self) -> Option<Arc<RootShared>> {
        self.root.as_ref().and_then(Weak::upgrade)
    }

    fn require_shared(&self) -> Result<Arc<RootShared>> {
        self.shared().ok_or_else(|| Error::rejected(&self.key, "handle is not attached to a live registry"))
    }

    pub fn exists(&self) -> bool {
        self.shared().map(|s| s.exists(&self.key)).unwrap_or(false)
    }

    pub fn has_children(&self) -> bool {
        self.shared().map(|s| s.has_children(&self.key)).unwrap_or(false)
    }

    pub fn get(&self) -> Option<String> {
        self.shared().and_then(|s| s.get(&self.key))
    }

    pub fn get_or(
        &self,
        default: &str,
    ) -> String {
        self.get().unwrap_or_else(|| default.to_string())
    }

    /// Integer value; boolean words map to 1/0, anything else to `default`
    pub fn get_int(
        &self,
        default: i64,
    ) -> i64 {
        self.get().and_then(|v| parse_int(&v)).unwrap_or(default)
    }

    /// Stores `value`, or deletes the key and its subtree on `None`
    pub fn set(
        &self,
        value: Option<&str>,
    ) -> Result<()> {
        self.require_shared()?.set(&self.key, value)
    }

    pub fn set_int(
        &self,
        value: i64,
    ) -> Result<()> {
        self.set(Some(&value.to_string()))
    }

    pub fn remove(&self) -> Result<()> {
        self.set(None)
    }

    /// Removes every child, keeping this key and its value
    pub fn zap(&self) -> Result<()> {
        let children: Vec<ConfigHandle> = self.iter().collect();
        for child in children {
            child.remove()?;
        }
        Ok(())
    }

    pub fn commit(
        &self,
        depth: Depth,
    ) -> Result<()> {
        self.require_shared()?.sync(&self.key, depth, SyncOp::Commit)
    }

    pub fn refresh(
        &self,
        depth: Depth,
    ) -> Result<()> {
        self.require_shared()?.sync(&self.key, depth, SyncOp::Refresh)
    }

    /// Creates a generator from `moniker` and mounts it here
    pub fn mount(
        &self,
        moniker: &str,
        refresh: bool,
    ) -> Result<()> {
        self.require_shared()?.mount_moniker(&self.key, moniker, refresh)
    }

    /// Mounts `generator` here; the registry owns it
    pub fn mount_generator(
        &self,
        generator: Box<dyn Generator>,
        refresh: bool,
    ) -> Result<()> {
        self.require_shared()?.mount(&self.key, Arc::from(generator), true, None, refresh)
    }

    /// Unmounts the generators providing this key
    pub fn unmount(
        &self,
        commit: bool,
    ) -> Result<()> {
        self.require_shared()?.unmount(&self.key, commit)
    }

    pub fn is_mount_point(&self) -> bool {
        self.shared().map(|s| s.is_mount_point(&self.key)).unwrap_or(false)
    }

    /// Generator answering this key and the key it is mounted at
    pub fn which_mount(&self) -> Option<(Arc<dyn Generator>, ConfigKey)> {
        self.shared().and_then(|s| s.which_mount(&self.key))
    }

    /// Generators mounted exactly here, in registration order
    pub fn mounts(&self) -> Vec<Arc<dyn Generator>> {
        self.shared().map(|s| s.mounts_at(&self.key)).unwrap_or_default()
    }

    /// Watches `(this key, depth)`; fails on a detached handle
    pub fn add_watch(
        &self,
        depth: Depth,
        callback: WatchCallback,
    ) -> Result<WatchId> {
        Ok(self.require_shared()?.add_watch(&self.key, depth, callback))
    }

    pub fn del_watch(
        &self,
        id: WatchId,
    ) -> bool {
        self.shared().map(|s| s.watches().unregister(id)).unwrap_or(false)
    }

    /// Writes `fullkey = value` for the subtree in sorted pre-order.
    /// Empty values are skipped unless `everything` is set.
    pub fn dump<W: Write>(
        &self,
        writer: &mut W,
        everything: bool,
    ) -> Result<()> {
        for handle in self.sorted_recursive_iter(Depth::Infinite) {
            let Some(value) = handle.get() else {
                continue;
            };
            if everything || !value.is_empty() {
                writeln!(writer, "{} = {}", handle.full_key(), value).map_err(StorageError::from)?;
            }
        }
        Ok(())
    }

    pub(crate) fn child_names(&self) -> KeyIter {
        match self.shared() {
            Some(s) => s.children(&self.key),
            None => Box::new(std::iter::empty()),
        }
    }

    /// Direct children in backend order
    pub fn iter(&self) -> ChildIter {
        ChildIter::new(self.clone())
    }

    /// Pre-order descendants bounded by `depth`
    pub fn recursive_iter(
        &self,
        depth: Depth,
    ) -> RecursiveIter {
        RecursiveIter::new(self.clone(), depth)
    }

    /// Descendants matching a pattern whose segments may be `*`
    pub fn xiter(
        &self,
        pattern: impl Into<ConfigKey>,
    ) -> WildcardIter {
        WildcardIter::new(self.clone(), pattern.into())
    }

    pub fn sorted_iter(&self) -> Sorted {
        Sorted::new(self.iter())
    }

    pub fn sorted_recursive_iter(
        &self,
        depth: Depth,
    ) -> Sorted {
        Sorted::new(self.recursive_iter(depth))
    }

    pub fn sorted_xiter(
        &self,
        pattern: impl Into<ConfigKey>,
    ) -> Sorted {
        Sorted::new(self.xiter(pattern))
    }
}

fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    if TRUE_WORDS.iter().any(|w| value.eq_ignore_ascii_case(w)) {
        return Some(1);
    }
    if FALSE_WORDS.iter().any(|w| value.eq_ignore_ascii_case(w)) {
        return Some(0);
    }
    None
}

impl PartialEq for ConfigHandle {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        let same_root = match (&self.root, &other.root) {
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_root && self.key == other.key
    }
}

impl Eq for ConfigHandle {}

impl fmt::Debug for ConfigHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("key", &self.key)
            .field("null", &self.is_null())
            .finish()
    }
}

impl fmt::Display for ConfigHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "/{}", self.key)
    }
}
