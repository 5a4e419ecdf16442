// -
// Key syntax

/// Separator between key segments
pub(crate) const KEY_SEPARATOR: &str = "/";

/// Segment value matching any single segment in a pattern
pub const WILDCARD_SEGMENT: &str = "*";

// -
// Monikers

/// Separator between a moniker scheme and its argument
pub(crate) const MONIKER_SCHEME_SEPARATOR: char = ':';

/// Built-in generator schemes
pub const NULL_SCHEME: &str = "null";
pub const TEMP_SCHEME: &str = "temp";
pub const MEM_SCHEME: &str = "mem";
pub const ENV_SCHEME: &str = "env";
pub const INI_SCHEME: &str = "ini";
pub const READONLY_SCHEME: &str = "readonly";
pub const LIST_SCHEME: &str = "list";

/// Separator inside environment variable names mapped by the env generator
pub(crate) const ENV_KEY_SEPARATOR: &str = "__";

// -
// Settings

/// Environment prefix for registry settings overrides
pub(crate) const SETTINGS_ENV_PREFIX: &str = "REGISTRY";

/// Environment variable naming an extra settings file
pub(crate) const SETTINGS_PATH_ENV: &str = "CONFIG_PATH";
