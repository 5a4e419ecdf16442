use serde::Deserialize;
use serde::Serialize;

/// What happens to mounted generators when the root is dropped
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TeardownConfig {
    /// Commit every generator the root owns before destroying it.
    /// Failures are logged, never raised.
    #[serde(default)]
    pub commit_on_drop: bool,
}
