use std::sync::Arc;

use super::Depth;
use super::Generator;
use super::KeyIter;
use crate::ConfigKey;
use crate::Error;
use crate::Result;

/// Wraps another generator and rejects every write (`readonly:` moniker).
///
/// Reads, commit and refresh pass through untouched.
pub struct ReadOnlyGenerator {
    inner: Arc<dyn Generator>,
}

impl ReadOnlyGenerator {
    pub fn new(inner: Arc<dyn Generator>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<dyn Generator> {
        &self.inner
    }
}

impl Generator for ReadOnlyGenerator {
    fn get(
        &self,
        key: &ConfigKey,
    ) -> Option<String> {
        self.inner.get(key)
    }

    fn set(
        &self,
        key: &ConfigKey,
        _value: Option<String>,
    ) -> Result<()> {
        Err(Error::rejected(key, "generator is mounted read-only"))
    }

    fn exists(
        &self,
        key: &ConfigKey,
    ) -> bool {
        self.inner.exists(key)
    }

    fn has_children(
        &self,
        key: &ConfigKey,
    ) -> bool {
        self.inner.has_children(key)
    }

    fn iterate_children(
        &self,
        key: &ConfigKey,
    ) -> KeyIter {
        self.inner.iterate_children(key)
    }

    fn commit(
        &self,
        key: &ConfigKey,
        depth: Depth,
    ) -> Result<()> {
        self.inner.commit(key, depth)
    }

    fn refresh(
        &self,
        key: &ConfigKey,
        depth: Depth,
    ) -> Result<()> {
        self.inner.refresh(key, depth)
    }

    fn is_ok(&self) -> bool {
        self.inner.is_ok()
    }
}
