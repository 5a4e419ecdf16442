use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::trace;

use super::Depth;
use super::Generator;
use super::KeyIter;
use crate::ConfigKey;
use crate::Result;

/// In-memory key tree shared by the memory-backed generators.
///
/// Children are keyed by single-segment keys, so lookups are
/// case-insensitive while the first-written spelling is kept. Setting a
/// value creates missing ancestors with empty values.
#[derive(Debug, Default, Clone)]
pub(crate) struct MemTree {
    root: Node,
}

#[derive(Debug, Default, Clone)]
struct Node {
    value: Option<String>,
    children: BTreeMap<ConfigKey, Node>,
}

impl MemTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn find(
        &self,
        key: &ConfigKey,
    ) -> Option<&Node> {
        let mut node = &self.root;
        for segment in key.segments() {
            node = node.children.get(&ConfigKey::new(segment))?;
        }
        Some(node)
    }

    pub(crate) fn get(
        &self,
        key: &ConfigKey,
    ) -> Option<String> {
        self.find(key).and_then(|n| n.value.clone())
    }

    pub(crate) fn exists(
        &self,
        key: &ConfigKey,
    ) -> bool {
        self.find(key).is_some()
    }

    pub(crate) fn has_children(
        &self,
        key: &ConfigKey,
    ) -> bool {
        self.find(key).map(|n| !n.children.is_empty()).unwrap_or(false)
    }

    pub(crate) fn children(
        &self,
        key: &ConfigKey,
    ) -> Vec<ConfigKey> {
        self.find(key)
            .map(|n| n.children.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn set(
        &mut self,
        key: &ConfigKey,
        value: String,
    ) {
        let mut node = &mut self.root;
        for segment in key.segments() {
            node = node.children.entry(ConfigKey::new(segment)).or_insert_with(|| Node {
                value: Some(String::new()),
                children: BTreeMap::new(),
            });
        }
        node.value = Some(value);
    }

    /// Removes `key` and its subtree; removing the root empties the tree
    pub(crate) fn remove(
        &mut self,
        key: &ConfigKey,
    ) -> bool {
        if key.is_empty() {
            let had_content = self.root.value.is_some() || !self.root.children.is_empty();
            self.root = Node::default();
            return had_content;
        }

        let mut node = &mut self.root;
        for segment in key.parent().segments() {
            match node.children.get_mut(&ConfigKey::new(segment)) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.children.remove(&key.last()).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.root = Node::default();
    }

    /// Visits every valued node below `key` in pre-order with its key
    /// relative to `key`
    pub(crate) fn walk<F>(
        &self,
        key: &ConfigKey,
        mut visit: F,
    ) where
        F: FnMut(&ConfigKey, &str),
    {
        let Some(start) = self.find(key) else {
            return;
        };
        let mut stack: Vec<(ConfigKey, &Node)> = start
            .children
            .iter()
            .rev()
            .map(|(name, node)| (name.clone(), node))
            .collect();
        while let Some((path, node)) = stack.pop() {
            if let Some(value) = &node.value {
                visit(&path, value);
            }
            for (name, child) in node.children.iter().rev() {
                stack.push((path.concat(name), child));
            }
        }
    }
}

/// Writable in-memory generator (`temp:` / `mem:` monikers).
///
/// Commit and refresh are successful no-ops: there is nothing behind it.
#[derive(Debug, Default)]
pub struct MemGenerator {
    tree: RwLock<MemTree>,
}

impl MemGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a generator pre-populated with `(key, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ConfigKey>,
        V: Into<String>,
    {
        let mut tree = MemTree::new();
        for (key, value) in pairs {
            tree.set(&key.into(), value.into());
        }
        Self {
            tree: RwLock::new(tree),
        }
    }
}

impl Generator for MemGenerator {
    fn get(
        &self,
        key: &ConfigKey,
    ) -> Option<String> {
        self.tree.read().get(key)
    }

    fn set(
        &self,
        key: &ConfigKey,
        value: Option<String>,
    ) -> Result<()> {
        trace!(key = %key, ?value, "MemGenerator set");
        let mut tree = self.tree.write();
        match value {
            Some(v) => tree.set(key, v),
            None => {
                tree.remove(key);
            }
        }
        Ok(())
    }

    fn exists(
        &self,
        key: &ConfigKey,
    ) -> bool {
        self.tree.read().exists(key)
    }

    fn has_children(
        &self,
        key: &ConfigKey,
    ) -> bool {
        self.tree.read().has_children(key)
    }

    fn iterate_children(
        &self,
        key: &ConfigKey,
    ) -> KeyIter {
        Box::new(self.tree.read().children(key).into_iter())
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
