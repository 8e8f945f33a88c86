//! Constants used throughout the account-store library.
//!
//! This module provides central definitions for document field names,
//! the default collection and the environment keys read by
//! [`crate::config::StoreConfig::from_env`].

/// Default collection holding one document per account.
pub const USERS: &str = "users";

/// Document field holding the store-assigned identifier.
pub const ID_FIELD: &str = "id";

/// Document field holding the revision counter.
pub const REVISION_FIELD: &str = "revision";

/// Document field holding the user name.
pub const USER_NAME_FIELD: &str = "userName";

/// Document field holding role names.
pub const ROLES_FIELD: &str = "roles";

/// Document field holding external login pairs.
pub const LOGINS_FIELD: &str = "logins";

/// Document field holding claims.
pub const CLAIMS_FIELD: &str = "claims";

/// Login sub-document field for the provider name.
pub const LOGIN_PROVIDER_FIELD: &str = "loginProvider";

/// Login sub-document field for the provider key.
pub const PROVIDER_KEY_FIELD: &str = "providerKey";

/// Sub-collections that merge-update always takes from the in-memory aggregate.
pub const SUB_COLLECTION_FIELDS: [&str; 3] = [ROLES_FIELD, LOGINS_FIELD, CLAIMS_FIELD];

/// Environment variable holding the connection string.
pub const ENV_CONNECTION: &str = "ACCOUNT_STORE_CONNECTION";

/// Environment variable overriding the collection name.
pub const ENV_COLLECTION: &str = "ACCOUNT_STORE_COLLECTION";

/// Environment variable selecting the concurrency mode.
pub const ENV_CONCURRENCY: &str = "ACCOUNT_STORE_CONCURRENCY";

/// Environment variable toggling the unique index on user names.
pub const ENV_UNIQUE_USER_NAMES: &str = "ACCOUNT_STORE_UNIQUE_USER_NAMES";
