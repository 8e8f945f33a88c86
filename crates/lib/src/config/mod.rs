//! Store configuration.
//!
//! A [`StoreConfig`] names the document database through a
//! [`ConnectionString`] and carries the few knobs the repository needs:
//! the collection name, the [`ConcurrencyMode`] used by merge-update and
//! whether a unique index is kept on user names.
//!
//! Connection strings are URLs of the form
//! `<scheme>://[host]/<database>[?options]`:
//!
//! * `memory://localhost/accounts` - volatile in-memory store
//! * `memory:///accounts?file=/var/lib/accounts.json` - in-memory store
//!   persisted to a JSON file
//! * `sqlite:///var/lib/app/accounts.db` - SQLite file (feature `sqlite`)
//! * `sqlite:///accounts?mode=memory` - in-memory SQLite (feature `sqlite`)

mod errors;

use std::{fmt, str::FromStr};

use url::Url;

pub use errors::ConfigError;

use crate::constants::{
    ENV_COLLECTION, ENV_CONCURRENCY, ENV_CONNECTION, ENV_UNIQUE_USER_NAMES, USERS,
};

/// Storage backend selected by the connection string scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// `memory://` - in-memory collections, optionally persisted to JSON
    InMemory,
    /// `sqlite://` - SQLite database
    Sqlite,
}

/// A parsed connection string.
///
/// Construction fails if the string does not name a target database.
/// `Display` and `Debug` redact credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    url: Url,
    kind: BackendKind,
    database: String,
}

impl ConnectionString {
    /// Parse and validate a connection string.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidConnectionString {
            reason: e.to_string(),
        })?;

        let kind = match url.scheme() {
            "memory" | "mem" => BackendKind::InMemory,
            "sqlite" => BackendKind::Sqlite,
            other => {
                return Err(ConfigError::UnsupportedScheme {
                    scheme: other.to_string(),
                });
            }
        };

        let last_segment = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();

        // A file name like `accounts.db` names the `accounts` database.
        let database = match kind {
            BackendKind::Sqlite => last_segment
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .unwrap_or(last_segment),
            BackendKind::InMemory => last_segment,
        };

        if database.is_empty() {
            return Err(ConfigError::MissingDatabaseName {
                connection: redact(&url),
            });
        }

        Ok(Self {
            database: database.to_string(),
            url,
            kind,
        })
    }

    /// The backend selected by the scheme.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// The target database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The URL path, e.g. the SQLite file path.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Look up a query option such as `file` or `mode`.
    pub fn option(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// The connection string with credentials replaced by `***`.
    pub fn redacted(&self) -> String {
        redact(&self.url)
    }
}

/// Redact credentials from a connection URL for safe logging
fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    if !url.username().is_empty() {
        let _ = redacted.set_username("***");
    }
    if url.password().is_some() {
        let _ = redacted.set_password(Some("***"));
    }
    redacted.to_string()
}

impl FromStr for ConnectionString {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("url", &self.redacted())
            .field("kind", &self.kind)
            .field("database", &self.database)
            .finish()
    }
}

/// How merge-update guards against concurrent writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyMode {
    /// Read-then-replace without a guard. Two concurrent updates of the same
    /// account may lose one side's change.
    #[default]
    LastWriterWins,
    /// The replace only succeeds if the stored revision still matches the
    /// one the merge was based on; otherwise the update fails with a
    /// conflict and the caller re-fetches.
    Optimistic,
}

impl FromStr for ConcurrencyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-writer-wins" | "lww" => Ok(ConcurrencyMode::LastWriterWins),
            "optimistic" => Ok(ConcurrencyMode::Optimistic),
            _ => Err(ConfigError::InvalidValue {
                key: ENV_CONCURRENCY.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration for opening a [`crate::store::UserStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Target database
    pub connection: ConnectionString,
    /// Collection holding the user documents
    pub collection: String,
    /// Merge-update guard
    pub concurrency: ConcurrencyMode,
    /// Keep a unique index on `userName`
    pub unique_user_names: bool,
}

impl StoreConfig {
    /// Configuration with defaults for everything but the connection string.
    pub fn new(connection: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            connection: ConnectionString::parse(connection)?,
            collection: USERS.to_string(),
            concurrency: ConcurrencyMode::default(),
            unique_user_names: true,
        })
    }

    /// Read the configuration from the process environment.
    ///
    /// `ACCOUNT_STORE_CONNECTION` is required; `ACCOUNT_STORE_COLLECTION`,
    /// `ACCOUNT_STORE_CONCURRENCY` and `ACCOUNT_STORE_UNIQUE_USER_NAMES` are
    /// optional overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let connection = lookup(ENV_CONNECTION).ok_or_else(|| ConfigError::MissingVariable {
            name: ENV_CONNECTION.to_string(),
        })?;
        let mut config = Self::new(&connection)?;

        if let Some(collection) = lookup(ENV_COLLECTION) {
            config = config.with_collection(collection);
        }
        if let Some(mode) = lookup(ENV_CONCURRENCY) {
            config = config.with_concurrency(mode.parse()?);
        }
        if let Some(flag) = lookup(ENV_UNIQUE_USER_NAMES) {
            let unique = match flag.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_UNIQUE_USER_NAMES.to_string(),
                        value: flag,
                    });
                }
            };
            config = config.with_unique_user_names(unique);
        }

        Ok(config)
    }

    /// Use a different collection.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Use a different concurrency mode.
    pub fn with_concurrency(mut self, concurrency: ConcurrencyMode) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Enable or disable the unique index on user names.
    pub fn with_unique_user_names(mut self, unique: bool) -> Self {
        self.unique_user_names = unique;
        self
    }
}
