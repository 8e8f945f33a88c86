//!
//! account-store: account identity persistence over schemaless document stores.
//!
//! The library keeps user accounts (credentials, external logins, claims and
//! role memberships) as one JSON document per account and exposes them to
//! calling code through narrow capability groups.
//!
//! ## Core Concepts
//!
//! * **Document stores (`backend::DocumentStore`)**: the storage collaborator. Named
//!   collections of JSON documents with filtered queries, id-assigning inserts,
//!   whole-document replaces and filtered deletes. `InMemory` and (feature `sqlite`)
//!   `Sqlite` implementations are provided.
//! * **User aggregates (`user::IdentityUser`)**: the in-memory account with its
//!   logins, claims and roles. Extended account types embed one and implement
//!   `user::UserRecord`.
//! * **Repository (`repository::UserRepository`)**: lazy typed queries, inserts,
//!   deletes and the merge-update that reconciles a partially mutated aggregate with
//!   the authoritative stored document before writing it back.
//! * **Façade (`store::UserStore`)**: login, claim, role, password, security-stamp
//!   and lifecycle capabilities, each a thin argument-validating wrapper over the
//!   repository.
//!
//! ```no_run
//! use account_store::{StoreConfig, UserStore, user::{IdentityUser, UserLoginInfo}};
//! use account_store::store::{UserLifecycleStore, UserLoginStore};
//!
//! # async fn run() -> account_store::Result<()> {
//! let store: UserStore = UserStore::open(StoreConfig::new("memory://localhost/accounts")?).await?;
//!
//! let mut alice = IdentityUser::new("alice");
//! store.create(&mut alice).await?;
//! store.add_login(&mut alice, UserLoginInfo::new("google", "abc123")).await?;
//!
//! let found = store.find_by_login(&UserLoginInfo::new("google", "abc123")).await?;
//! assert_eq!(found.map(|u| u.user_name), Some("alice".to_string()));
//! store.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod repository;
pub mod store;
pub mod user;

pub use config::StoreConfig;
pub use store::UserStore;

/// Result type used throughout the account-store library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the account-store library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured configuration errors from the config module
    #[error(transparent)]
    Config(config::ConfigError),

    /// Structured storage errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured repository errors from the repository module
    #[error(transparent)]
    Repository(repository::RepositoryError),

    /// Structured façade errors from the store module
    #[error(transparent)]
    Store(store::StoreError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Backend(_) => "backend",
            Error::Repository(_) => "repository",
            Error::Store(_) => "store",
        }
    }

    /// Check if a required input was missing or empty.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_invalid_argument(),
            Error::Repository(repo_err) => repo_err.is_transient_aggregate(),
            _ => false,
        }
    }

    /// Check if the store handle had already been released.
    pub fn is_disposed(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_disposed(),
            _ => false,
        }
    }

    /// Check if this error indicates the update target was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Repository(repo_err) => repo_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if the store could not be reached or failed in transport.
    pub fn is_store_unavailable(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_unavailable(),
            _ => false,
        }
    }

    /// Check if the store rejected a write because of a uniqueness or schema rule.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_constraint_violation(),
            _ => false,
        }
    }

    /// Check if an optimistic merge-update lost against a concurrent writer.
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Repository(repo_err) => repo_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error is configuration-related.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
