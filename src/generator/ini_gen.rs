//! Legacy flat section format (`ini:PATH` moniker).
//!
//! ```text
//! [network]
//! eth0/ip = 10.0.0.1
//! mtu = 1500
//! ```
//!
//! The first key segment names the section, the remaining segments form the
//! entry name. Sections never hold values, and storing an empty value
//! deletes the entry. Entry names match case-insensitively.
//!
//! State lives in memory between `refresh` calls. `refresh` reloads the
//! whole file and drops uncommitted edits; `commit` rewrites the whole
//! file atomically, and only when something changed. Both ignore the key
//! and depth they are given: the file is the unit of synchronization.
//!
//! The format has no escaping. Writes whose key or value would not read
//! back unchanged are rejected: line breaks anywhere, surrounding
//! whitespace, `=` in an entry name, or an entry name starting with `[`,
//! `#` or `;`.

use std::path::Path;
use std::path::PathBuf;

use parking_lot::RwLock;
use tracing::info;
use tracing::warn;

use super::Depth;
use super::Generator;
use super::KeyIter;
use super::MemTree;
use crate::utils::file_io::read_to_string_if_exists;
use crate::utils::file_io::write_atomically;
use crate::ConfigKey;
use crate::Error;
use crate::Result;
use crate::StorageError;

#[derive(Debug)]
pub struct IniGenerator {
    path: PathBuf,
    state: RwLock<IniState>,
}

#[derive(Debug)]
struct IniState {
    tree: MemTree,
    dirty: bool,
    ok: bool,
}

impl IniGenerator {
    /// Opens `path`, loading it if it exists.
    ///
    /// A missing file is a healthy empty store (created on first commit).
    /// A file that cannot be read or parsed leaves the generator empty with
    /// `is_ok() == false`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let gen = Self {
            path: path.as_ref().to_path_buf(),
            state: RwLock::new(IniState {
                tree: MemTree::new(),
                dirty: false,
                ok: true,
            }),
        };
        if let Err(e) = gen.reload() {
            warn!(path = ?gen.path, error = %e, "IniGenerator failed initial load");
        }
        gen
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if there are edits not yet committed
    pub fn is_dirty(&self) -> bool {
        self.state.read().dirty
    }

    fn reload(&self) -> Result<()> {
        let loaded = read_to_string_if_exists(&self.path)
            .and_then(|content| parse_sections(&self.path, content.as_deref().unwrap_or("")));

        let mut state = self.state.write();
        match loaded {
            Ok(tree) => {
                state.tree = tree;
                state.dirty = false;
                state.ok = true;
                info!(path = ?self.path, "IniGenerator loaded");
                Ok(())
            }
            Err(e) => {
                state.tree.clear();
                state.dirty = false;
                state.ok = false;
                Err(e)
            }
        }
    }
}

fn parse_sections(
    path: &Path,
    content: &str,
) -> Result<MemTree> {
    let mut tree = MemTree::new();
    let mut section: Option<ConfigKey> = None;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest
                .strip_suffix(']')
                .ok_or_else(|| parse_error(path, index, "unterminated section header"))?;
            let key = ConfigKey::new(name.trim());
            if key.segment_count() != 1 {
                return Err(parse_error(path, index, "section name must be a single segment"));
            }
            if !tree.exists(&key) {
                tree.set(&key, String::new());
            }
            section = Some(key);
            continue;
        }

        let Some(section) = &section else {
            return Err(parse_error(path, index, "entry outside of any section"));
        };
        let (name, value) = match line.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => (line, ""),
        };
        let entry = ConfigKey::new(name);
        if entry.is_empty() {
            return Err(parse_error(path, index, "empty entry name"));
        }
        if !value.is_empty() {
            tree.set(&section.concat(&entry), value.to_string());
        }
    }
    Ok(tree)
}

fn parse_error(
    path: &Path,
    index: usize,
    message: &str,
) -> Error {
    StorageError::Parse {
        path: path.to_path_buf(),
        line: index + 1,
        message: message.to_string(),
    }
    .into()
}

fn render_sections(tree: &MemTree) -> String {
    let mut out = String::new();
    for section in tree.children(&ConfigKey::root()) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{}]\n", section));
        tree.walk(&section, |entry, value| {
            if !value.is_empty() {
                out.push_str(&format!("{} = {}\n", entry, value));
            }
        });
    }
    out
}

/// Why `section/entry = value` would not survive a render and reparse
fn unrepresentable(
    key: &ConfigKey,
    value: &str,
) -> Option<&'static str> {
    let breaks = |s: &str| s.contains(['\n', '\r']);
    let padded = |s: &str| s.trim() != s;

    let section = key.first().to_string();
    let entry = key.remove_first(1).to_string();
    if breaks(&section) || padded(&section) {
        return Some("section name cannot be written to an ini file");
    }
    if breaks(&entry)
        || padded(&entry)
        || entry.contains('=')
        || entry.starts_with(['[', '#', ';'])
    {
        return Some("entry name cannot be written to an ini file");
    }
    if breaks(value) || padded(value) {
        return Some("value cannot be written to an ini file");
    }
    None
}

impl Generator for IniGenerator {
    fn get(
        &self,
        key: &ConfigKey,
    ) -> Option<String> {
        self.state.read().tree.get(key)
    }

    fn set(
        &self,
        key: &ConfigKey,
        value: Option<String>,
    ) -> Result<()> {
        let value = value.filter(|v| !v.is_empty());
        let mut state = self.state.write();
        match (key.segment_count(), value) {
            (0, Some(_)) | (1, Some(_)) => {
                return Err(Error::rejected(key, "sections cannot hold values"));
            }
            (_, Some(v)) => {
                if let Some(reason) = unrepresentable(key, &v) {
                    return Err(Error::rejected(key, reason));
                }
                state.tree.set(key, v)
            }
            (_, None) => {
                state.tree.remove(key);
            }
        }
        state.dirty = true;
        Ok(())
    }

    fn exists(
        &self,
        key: &ConfigKey,
    ) -> bool {
        self.state.read().tree.exists(key)
    }

    fn has_children(
        &self,
        key: &ConfigKey,
    ) -> bool {
        self.state.read().tree.has_children(key)
    }

    fn iterate_children(
        &self,
        key: &ConfigKey,
    ) -> KeyIter {
        Box::new(self.state.read().tree.children(key).into_iter())
    }

    fn commit(
        &self,
        _key: &ConfigKey,
        _depth: Depth,
    ) -> Result<()> {
        let mut state = self.state.write();
        if !state.dirty {
            return Ok(());
        }
        write_atomically(&self.path, render_sections(&state.tree).as_bytes())?;
        state.dirty = false;
        info!(path = ?self.path, "IniGenerator committed");
        Ok(())
    }

    fn refresh(
        &self,
        _key: &ConfigKey,
        _depth: Depth,
    ) -> Result<()> {
        self.reload()
    }

    fn is_ok(&self) -> bool {
        self.state.read().ok
    }
}
