//! Registry Error Hierarchy
//!
//! Defines the error types surfaced by the registry engine and its generators,
//! categorized by the layer that produced them. A missing key is never an
//! error: reads report absence as `None`.

use std::fmt;
use std::path::PathBuf;

use config::ConfigError;

use crate::ConfigKey;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `set` was refused by the responsible generator, or no generator
    /// answers for the key at all
    #[error("Write to '{key}' rejected: {reason}")]
    Rejected { key: ConfigKey, reason: String },

    /// Generator is not in a usable state (construction or refresh failed)
    #[error("Backend unavailable: {moniker}")]
    BackendUnavailable { moniker: String },

    /// One or more generators failed to commit or refresh
    #[error(transparent)]
    Sync(#[from] SyncFailures),

    /// Generator factory failures
    #[error(transparent)]
    Moniker(#[from] MonikerError),

    /// File-backed generator failures
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Registry settings load/validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub(crate) fn rejected(
        key: &ConfigKey,
        reason: impl Into<String>,
    ) -> Self {
        Error::Rejected {
            key: key.clone(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonikerError {
    /// No creator registered for the scheme
    #[error("Unknown generator scheme '{scheme}' in moniker '{moniker}'")]
    UnknownScheme { scheme: String, moniker: String },

    /// Moniker without a `scheme:` prefix
    #[error("Malformed moniker '{0}'")]
    Malformed(String),

    /// Unbalanced braces inside a `list:` moniker
    #[error("Unbalanced braces in list moniker '{0}'")]
    UnbalancedBraces(String),

    /// Scheme requires an argument that was not supplied
    #[error("Moniker '{moniker}' requires an argument: {expected}")]
    MissingArgument {
        moniker: String,
        expected: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failures while loading or saving a backing file
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// I/O failure tied to a specific file
    #[error("Error occurred at path: {path}")]
    PathError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Backing file content that cannot be understood
    #[error("Parse error in {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// A single failed commit or refresh inside a subtree sync.
#[derive(Debug)]
pub struct SyncFailure {
    /// Mount point of the failing generator
    pub mount_point: ConfigKey,
    /// What the generator reported
    pub error: Box<Error>,
}

/// Aggregate of every generator that failed during one commit/refresh pass.
///
/// Every covered generator is attempted before this is returned, so the
/// list is complete, in attempt order.
#[derive(Debug, Default)]
pub struct SyncFailures {
    failures: Vec<SyncFailure>,
}

impl SyncFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        mount_point: ConfigKey,
        error: Error,
    ) {
        self.failures.push(SyncFailure {
            mount_point,
            error: Box::new(error),
        });
    }

    pub fn failures(&self) -> &[SyncFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok(())` if nothing failed, otherwise the whole aggregate as an error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Sync(self))
        }
    }
}

impl fmt::Display for SyncFailures {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Sync failed for {} generator(s)", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; '{}': {}", failure.mount_point, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for SyncFailures {}
