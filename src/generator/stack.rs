//! Priority-stack semantics shared by `ListGenerator` and same-key mount
//! stacks in the root. Index 0 has the highest priority.

use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Arc;

use tracing::warn;

use super::Depth;
use super::Generator;
use super::KeyIter;
use crate::ConfigKey;
use crate::Error;
use crate::Result;
use crate::SyncFailures;

/// First present value in priority order
pub(crate) fn stack_get(
    generators: &[Arc<dyn Generator>],
    key: &ConfigKey,
) -> Option<String> {
    generators.iter().find_map(|g| g.get(key))
}

/// Writes go to the first generator in the stack, never to a fallback
pub(crate) fn stack_set(
    generators: &[Arc<dyn Generator>],
    key: &ConfigKey,
    value: Option<String>,
) -> Result<()> {
    match generators.first() {
        Some(g) => g.set(key, value),
        None => Err(Error::rejected(key, "empty generator list")),
    }
}

pub(crate) fn stack_exists(
    generators: &[Arc<dyn Generator>],
    key: &ConfigKey,
) -> bool {
    generators.iter().any(|g| g.exists(key))
}

pub(crate) fn stack_has_children(
    generators: &[Arc<dyn Generator>],
    key: &ConfigKey,
) -> bool {
    generators.iter().any(|g| g.has_children(key))
}

pub(crate) fn stack_children(
    generators: &[Arc<dyn Generator>],
    key: &ConfigKey,
) -> KeyIter {
    Box::new(MergedKeys::new(
        generators.iter().map(|g| g.iterate_children(key)).collect(),
    ))
}

pub(crate) fn stack_is_ok(generators: &[Arc<dyn Generator>]) -> bool {
    generators.iter().all(|g| g.is_ok())
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum SyncOp {
    Commit,
    Refresh,
}

impl SyncOp {
    pub(crate) fn apply(
        &self,
        generator: &dyn Generator,
        key: &ConfigKey,
        depth: Depth,
    ) -> Result<()> {
        match self {
            SyncOp::Commit => generator.commit(key, depth),
            SyncOp::Refresh => generator.refresh(key, depth),
        }
    }
}

/// Runs `op` on every generator, even after a failure, and aggregates
/// the failures under `key`
pub(crate) fn stack_sync(
    generators: &[Arc<dyn Generator>],
    key: &ConfigKey,
    depth: Depth,
    op: SyncOp,
) -> Result<()> {
    let mut failures = SyncFailures::new();
    for (index, generator) in generators.iter().enumerate() {
        if let Err(e) = op.apply(generator.as_ref(), key, depth) {
            warn!(?op, index, key = %key, error = %e, "generator sync failed");
            failures.push(key.clone(), e);
        }
    }
    failures.into_result()
}

/// Concatenates several child sequences, yielding each key once at the
/// position of its first (highest-priority) occurrence.
pub struct MergedKeys {
    sources: VecDeque<KeyIter>,
    seen: HashSet<ConfigKey>,
}

impl MergedKeys {
    pub fn new(sources: Vec<KeyIter>) -> Self {
        Self {
            sources: sources.into(),
            seen: HashSet::new(),
        }
    }
}

impl Iterator for MergedKeys {
    type Item = ConfigKey;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(source) = self.sources.front_mut() {
            match source.next() {
                Some(key) => {
                    if self.seen.insert(key.clone()) {
                        return Some(key);
                    }
                }
                None => {
                    self.sources.pop_front();
                }
            }
        }
        None
    }
}
