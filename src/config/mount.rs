use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::ConfigKey;
use crate::Error;
use crate::MonikerRegistry;
use crate::Result;

/// A generator to mount at startup
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MountConfig {
    /// Mount point
    #[serde(default)]
    pub key: ConfigKey,

    /// Generator moniker, e.g. `ini:/etc/app.ini`
    pub moniker: String,

    /// Refresh the generator right after mounting
    #[serde(default = "default_refresh")]
    pub refresh: bool,
}

impl MountConfig {
    pub fn new(
        key: impl Into<ConfigKey>,
        moniker: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            moniker: moniker.into(),
            refresh: default_refresh(),
        }
    }

    pub(super) fn validate(
        &self,
        registry: &MonikerRegistry,
    ) -> Result<()> {
        if self.moniker.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(format!(
                "mount at '/{}' has an empty moniker",
                self.key
            ))));
        }
        registry.check(&self.moniker)
    }
}

fn default_refresh() -> bool {
    true
}
