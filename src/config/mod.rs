//! Registry settings.
//!
//! Loaded hierarchically through the `config` crate:
//! - Default values as code base
//! - Configuration file named by `CONFIG_PATH`
//! - `REGISTRY__`-prefixed environment variables (highest priority)
//!
//! Loading never validates; call [`RegistryConfig::validate`] once every
//! override is applied.

mod mount;
mod teardown;
mod watch;


pub use mount::*;
pub use teardown::*;
pub use watch::*;

use std::collections::HashSet;
use std::env;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::MonikerRegistry;
use crate::Result;
use crate::ENV_KEY_SEPARATOR;
use crate::SETTINGS_ENV_PREFIX;
use crate::SETTINGS_PATH_ENV;

/// Settings for one [`ConfigRoot`](crate::ConfigRoot)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RegistryConfig {
    /// Generators mounted by `ConfigRoot::from_config`, in order
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
    /// Change notification
    #[serde(default)]
    pub watch: WatchConfig,
    /// Behaviour when the root is dropped
    #[serde(default)]
    pub teardown: TeardownConfig,
}

impl RegistryConfig {
    /// Merges defaults, the `CONFIG_PATH` file and `REGISTRY__*` variables.
    ///
    /// ```ignore
    /// std::env::set_var("REGISTRY__TEARDOWN__COMMIT_ON_DROP", "true");
    /// let cfg = RegistryConfig::new()?.validate()?;
    /// let root = ConfigRoot::from_config(&cfg)?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(SETTINGS_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(settings_env());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Layers `path` over the current values; environment still wins
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(settings_env())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Consumes and returns the settings if every mount entry is usable
    pub fn validate(self) -> Result<Self> {
        let registry = MonikerRegistry::new();
        let mut seen = HashSet::new();
        for mount in &self.mounts {
            mount.validate(&registry)?;
            if !seen.insert((mount.key.clone(), mount.moniker.trim().to_ascii_lowercase())) {
                return Err(Error::Config(ConfigError::Message(format!(
                    "mount '{}' at '/{}' is listed twice",
                    mount.moniker, mount.key
                ))));
            }
        }
        Ok(self)
    }
}

fn settings_env() -> Environment {
    Environment::with_prefix(SETTINGS_ENV_PREFIX)
        .separator(ENV_KEY_SEPARATOR)
        .ignore_empty(true)
        .try_parsing(true)
}
