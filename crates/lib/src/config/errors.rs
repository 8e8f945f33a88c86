//! Configuration error types.

use thiserror::Error;

/// Errors raised while building a [`super::StoreConfig`].
///
/// All of these are fatal at construction time: a store is never opened
/// from a configuration that failed to parse.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The connection string is not a valid URL.
    #[error("Invalid connection string: {reason}")]
    InvalidConnectionString {
        /// Why parsing failed
        reason: String,
    },

    /// The connection string does not name a target database.
    #[error("Connection string does not specify a database name: {connection}")]
    MissingDatabaseName {
        /// The offending connection string, credentials redacted
        connection: String,
    },

    /// The URL scheme does not map to a known backend.
    #[error("Unsupported connection scheme '{scheme}'")]
    UnsupportedScheme {
        /// The scheme as written
        scheme: String,
    },

    /// A required environment variable is not set.
    #[error("Required configuration variable {name} is not set")]
    MissingVariable {
        /// Variable name
        name: String,
    },

    /// A configuration value could not be interpreted.
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue {
        /// Configuration key
        key: String,
        /// The rejected value
        value: String,
    },
}

impl ConfigError {
    /// Check if this error concerns the connection string itself.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ConfigError::InvalidConnectionString { .. }
                | ConfigError::MissingDatabaseName { .. }
                | ConfigError::UnsupportedScheme { .. }
        )
    }
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err)
    }
}
