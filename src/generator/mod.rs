//! Generator
//!
//! Capability interface implemented by every registry backend. A generator
//! answers for keys *relative to its own mount point*; the root translates
//! absolute keys before delegating.
//!
//! Contract shared by all implementations:
//! - `get`/`exists`/`has_children`/`iterate_children` are answered from
//!   in-memory state between `refresh` calls
//! - `set` is all-or-nothing per key; `None` deletes the key and every
//!   descendant
//! - uncommitted local changes survive until `refresh` (which may discard
//!   them)

mod env_gen;
mod ini_gen;
mod list_gen;
mod mem_gen;
mod moniker;
mod null_gen;
mod readonly_gen;
mod stack;


pub use env_gen::*;
pub use ini_gen::*;
pub use list_gen::*;
pub use mem_gen::*;
pub use moniker::*;
pub use null_gen::*;
pub use readonly_gen::*;
pub(crate) use stack::*;

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;

use crate::ConfigKey;
use crate::Result;

/// One-shot sequence of direct child names (single-segment keys).
pub type KeyIter = Box<dyn Iterator<Item = ConfigKey> + Send>;

/// How far below a key an operation reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    /// The exact key only, no descendants
    Zero,
    /// Direct children only, not the key itself
    OneLevel,
    /// The key and its entire subtree
    #[default]
    Infinite,
}

impl Depth {
    /// True if `key` falls inside the region this depth describes below `base`
    pub fn covers(
        &self,
        base: &ConfigKey,
        key: &ConfigKey,
    ) -> bool {
        match self {
            Depth::Zero => base == key,
            Depth::OneLevel => {
                key.segment_count() == base.segment_count() + 1 && base.is_prefix_of(key)
            }
            Depth::Infinite => base.is_prefix_of(key),
        }
    }
}

#[cfg_attr(test, automock)]
pub trait Generator: Send + Sync + 'static {
    /// Stored value, or `None` if the key is absent
    fn get(
        &self,
        key: &ConfigKey,
    ) -> Option<String>;

    /// Creates/updates the key, or deletes it with all descendants on `None`
    fn set(
        &self,
        key: &ConfigKey,
        value: Option<String>,
    ) -> Result<()>;

    fn exists(
        &self,
        key: &ConfigKey,
    ) -> bool;

    fn has_children(
        &self,
        key: &ConfigKey,
    ) -> bool;

    /// Direct children of `key` in backend-native order
    fn iterate_children(
        &self,
        key: &ConfigKey,
    ) -> KeyIter;

    /// Pushes local changes below `key` (bounded by `depth`) to the backing store
    fn commit(
        &self,
        key: &ConfigKey,
        depth: Depth,
    ) -> Result<()>;

    /// Pulls authoritative state below `key`; may discard uncommitted changes
    fn refresh(
        &self,
        key: &ConfigKey,
        depth: Depth,
    ) -> Result<()>;

    fn is_ok(&self) -> bool;
}

/// Identity comparison for shared generators
pub fn same_generator(
    a: &Arc<dyn Generator>,
    b: &Arc<dyn Generator>,
) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
