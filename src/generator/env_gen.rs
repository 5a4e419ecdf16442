//! Read-only view of the process environment (`env:PREFIX` moniker).
//!
//! `PREFIX__NET__PORT=80` appears as key `net/port` with value `80`.
//! Names are lower-cased and split on `__`. With an empty prefix every
//! variable is visible. The snapshot is taken at construction and again on
//! every `refresh`.

use parking_lot::RwLock;
use tracing::debug;

use super::Depth;
use super::Generator;
use super::KeyIter;
use super::MemTree;
use crate::ConfigKey;
use crate::Error;
use crate::Result;
use crate::ENV_KEY_SEPARATOR;

#[derive(Debug)]
pub struct EnvGenerator {
    prefix: String,
    tree: RwLock<MemTree>,
}

impl EnvGenerator {
    /// Snapshots the current process environment
    pub fn new(prefix: &str) -> Self {
        Self::from_vars(prefix, process_vars())
    }

    /// Builds from an explicit variable list instead of the process environment
    pub fn from_vars<I>(
        prefix: &str,
        vars: I,
    ) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let gen = Self {
            prefix: prefix.to_string(),
            tree: RwLock::new(MemTree::new()),
        };
        gen.load(vars);
        gen
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key_for(
        &self,
        name: &str,
    ) -> Option<ConfigKey> {
        let rest = if self.prefix.is_empty() {
            name
        } else {
            let head = format!("{}{}", self.prefix, ENV_KEY_SEPARATOR);
            match name.get(..head.len()) {
                Some(h) if h.eq_ignore_ascii_case(&head) => &name[head.len()..],
                _ => return None,
            }
        };
        let key = ConfigKey::from_segments(
            rest.split(ENV_KEY_SEPARATOR).map(|s| s.to_ascii_lowercase()),
        );
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    fn load<I>(
        &self,
        vars: I,
    ) where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut tree = MemTree::new();
        let mut count = 0usize;
        for (name, value) in vars {
            if let Some(key) = self.key_for(&name) {
                tree.set(&key, value);
                count += 1;
            }
        }
        debug!(prefix = %self.prefix, count, "EnvGenerator loaded variables");
        *self.tree.write() = tree;
    }
}

/// Process variables whose name and value are both valid UTF-8
fn process_vars() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
            (Ok(name), Ok(value)) => Some((name, value)),
            (name, _) => {
                debug!(name = ?name, "Skipping non UTF-8 environment variable");
                None
            }
        })
        .collect()
}

impl Generator for EnvGenerator {
    fn get(
        &self,
        key: &ConfigKey,
    ) -> Option<String> {
        self.tree.read().get(key)
    }

    fn set(
        &self,
        key: &ConfigKey,
        _value: Option<String>,
    ) -> Result<()> {
        Err(Error::rejected(key, "environment generator is read-only"))
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
        self.load(process_vars());
        Ok(())
    }

    fn is_ok(&self) -> bool {
        true
    }
}
