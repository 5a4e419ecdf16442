use serde::Deserialize;
use serde::Serialize;

/// Change notification settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WatchConfig {
    /// When false, registrations are accepted but no callback runs
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

fn default_enabled() -> bool {
    true
}
