use tracing::trace;

use super::Depth;
use super::Generator;
use super::KeyIter;
use crate::ConfigKey;
use crate::Error;
use crate::Result;

/// A generator that is always empty and rejects changes.
///
/// The registry answers with this when no generator covers a key.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGenerator;

impl NullGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for NullGenerator {
    fn get(
        &self,
        _key: &ConfigKey,
    ) -> Option<String> {
        None
    }

    fn set(
        &self,
        key: &ConfigKey,
        _value: Option<String>,
    ) -> Result<()> {
        trace!(key = %key, "NullGenerator rejected write");
        Err(Error::rejected(key, "null generator is read-only"))
    }

    fn exists(
        &self,
        _key: &ConfigKey,
    ) -> bool {
        false
    }

    fn has_children(
        &self,
        _key: &ConfigKey,
    ) -> bool {
        false
    }

    fn iterate_children(
        &self,
        _key: &ConfigKey,
    ) -> KeyIter {
        Box::new(std::iter::empty())
    }

    fn commit(
        &self,
        _key: &ConfigKey,
        _depth: Depth,
    ) -> Result<()> {
        Ok(())
    }

    fn refresh(
        &self,
        _key: &ConfigKey,
        _depth: Depth,
    ) -> Result<()> {
        Ok(())
    }

    fn is_ok(&self) -> bool {
        true
    }
}
