//! Shared constants for configuration and logging

/// Environment variable prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "MAF";

/// Default configuration file name looked up in the working directory
pub const DEFAULT_CONFIG_FILENAME: &str = "maf.toml";

/// Environment variable consulted for the tracing filter
pub const LOG_ENV_VAR: &str = "MAF_LOG";

/// Default log level when nothing else is configured
pub const DEFAULT_LOG_LEVEL: &str = "info";
