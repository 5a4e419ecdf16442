//! Generator factory keyed on monikers.
//!
//! A moniker is `scheme:argument`, e.g. `ini:/etc/app.ini` or
//! `readonly:env:APP`. `list:` takes a whitespace separated list of
//! monikers where braces group an item that itself contains spaces:
//!
//! ```text
//! list:readonly:ini:admin.ini {list:ini:user1.ini ini:user2.ini} ini:def.ini
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::EnvGenerator;
use super::Generator;
use super::IniGenerator;
use super::ListGenerator;
use super::MemGenerator;
use super::NullGenerator;
use super::ReadOnlyGenerator;
use crate::MonikerError;
use crate::Result;
use crate::ENV_SCHEME;
use crate::INI_SCHEME;
use crate::LIST_SCHEME;
use crate::MEM_SCHEME;
use crate::MONIKER_SCHEME_SEPARATOR;
use crate::NULL_SCHEME;
use crate::READONLY_SCHEME;
use crate::TEMP_SCHEME;

/// Builds a generator from the moniker argument. The registry is passed in
/// so wrapping schemes can create their inner generators.
pub type GeneratorCreator =
    Arc<dyn Fn(&str, &MonikerRegistry) -> Result<Arc<dyn Generator>> + Send + Sync>;

pub struct MonikerRegistry {
    creators: RwLock<HashMap<String, GeneratorCreator>>,
}

impl std::fmt::Debug for MonikerRegistry {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("MonikerRegistry").field("schemes", &self.schemes()).finish()
    }
}

impl Default for MonikerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MonikerRegistry {
    /// A registry with every built-in scheme
    pub fn new() -> Self {
        let registry = Self::empty();

        registry.register(NULL_SCHEME, |_, _| Ok(Arc::new(NullGenerator::new())));
        registry.register(TEMP_SCHEME, |_, _| Ok(Arc::new(MemGenerator::new())));
        registry.register(MEM_SCHEME, |_, _| Ok(Arc::new(MemGenerator::new())));
        registry.register(ENV_SCHEME, |prefix, _| Ok(Arc::new(EnvGenerator::new(prefix))));
        registry.register(INI_SCHEME, |path, _| {
            if path.is_empty() {
                return Err(MonikerError::MissingArgument {
                    moniker: format!("{}:", INI_SCHEME),
                    expected: "file path",
                }
                .into());
            }
            Ok(Arc::new(IniGenerator::new(path)))
        });
        registry.register(READONLY_SCHEME, |inner, registry| {
            if inner.is_empty() {
                return Err(MonikerError::MissingArgument {
                    moniker: format!("{}:", READONLY_SCHEME),
                    expected: "inner moniker",
                }
                .into());
            }
            Ok(Arc::new(ReadOnlyGenerator::new(registry.create(inner)?)))
        });
        registry.register(LIST_SCHEME, |items, registry| {
            let generators = split_list(items)?
                .iter()
                .map(|item| registry.create(item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Arc::new(ListGenerator::new(generators)))
        });

        registry
    }

    /// A registry without any scheme
    pub fn empty() -> Self {
        Self {
            creators: RwLock::new(HashMap::new()),
        }
    }

    /// Registers (or replaces) the creator for `scheme`
    pub fn register<F>(
        &self,
        scheme: &str,
        creator: F,
    ) where
        F: Fn(&str, &MonikerRegistry) -> Result<Arc<dyn Generator>> + Send + Sync + 'static,
    {
        self.creators.write().insert(scheme.to_ascii_lowercase(), Arc::new(creator));
    }

    pub fn contains(
        &self,
        scheme: &str,
    ) -> bool {
        self.creators.read().contains_key(&scheme.to_ascii_lowercase())
    }

    /// Registered scheme names, sorted
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.creators.read().keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Creates the generator named by `moniker`
    pub fn create(
        &self,
        moniker: &str,
    ) -> Result<Arc<dyn Generator>> {
        let (scheme, argument) = split_moniker(moniker)?;
        // clone out so the lock is not held while nested monikers are created
        let creator = self.creators.read().get(&scheme.to_ascii_lowercase()).cloned();
        let creator = creator.ok_or_else(|| MonikerError::UnknownScheme {
            scheme: scheme.to_string(),
            moniker: moniker.to_string(),
        })?;
        debug!(moniker, "creating generator");
        creator(argument, self)
    }

    /// Checks that `moniker` is well formed and every scheme it names is
    /// registered, without creating anything
    pub fn check(
        &self,
        moniker: &str,
    ) -> Result<()> {
        let (scheme, argument) = split_moniker(moniker)?;
        if !self.contains(scheme) {
            return Err(MonikerError::UnknownScheme {
                scheme: scheme.to_string(),
                moniker: moniker.to_string(),
            }
            .into());
        }
        if scheme.eq_ignore_ascii_case(READONLY_SCHEME) && !argument.is_empty() {
            self.check(argument)?;
        }
        if scheme.eq_ignore_ascii_case(LIST_SCHEME) {
            for item in split_list(argument)? {
                self.check(&item)?;
            }
        }
        Ok(())
    }
}

/// Splits `scheme:argument`; a bare `scheme` has an empty argument
pub fn split_moniker(moniker: &str) -> Result<(&str, &str)> {
    let moniker = moniker.trim();
    let (scheme, argument) = match moniker.split_once(MONIKER_SCHEME_SEPARATOR) {
        Some((scheme, argument)) => (scheme.trim(), argument.trim()),
        None => (moniker, ""),
    };
    if scheme.is_empty() {
        return Err(MonikerError::Malformed(moniker.to_string()).into());
    }
    Ok((scheme, argument))
}

/// Splits a brace-grouped, whitespace separated list into its items.
/// Outer braces of an item are stripped, inner ones are kept.
pub fn split_list(list: &str) -> Result<Vec<String>> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in list.chars() {
        match c {
            '{' => {
                if depth > 0 {
                    current.push(c);
                }
                depth += 1;
            }
            '}' => {
                if depth == 0 {
                    return Err(MonikerError::UnbalancedBraces(list.to_string()).into());
                }
                depth -= 1;
                if depth > 0 {
                    current.push(c);
                }
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    items.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if depth != 0 {
        return Err(MonikerError::UnbalancedBraces(list.to_string()).into());
    }
    if !current.is_empty() {
        items.push(current);
    }
    Ok(items)
}
