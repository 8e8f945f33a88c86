//! Account store façade.
//!
//! [`UserStore`] is the type applications hold. It implements one trait per
//! capability group ([`UserLoginStore`], [`UserClaimStore`],
//! [`UserRoleStore`], [`UserPasswordStore`], [`UserSecurityStampStore`],
//! [`UserLifecycleStore`]), so code that only manages roles can depend on
//! `impl UserRoleStore<U>` alone.
//!
//! Every method checks that the store is still open and validates its
//! arguments before delegating to the [`UserRepository`]. Mutating methods
//! change the caller's aggregate and persist it through a merge-update; a
//! mutation that changes nothing does not write.

mod capabilities;
mod errors;

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::RwLock;

pub use capabilities::{
    UserClaimStore, UserLifecycleStore, UserLoginStore, UserPasswordStore, UserRoleStore,
    UserSecurityStampStore,
};
pub use errors::StoreError;

use crate::{
    Result,
    backend::{self, DocumentStore},
    config::StoreConfig,
    repository::UserRepository,
    user::{IdentityUser, UserRecord},
};

/// Connection shared by all clones of a [`UserStore`]; `None` once closed.
struct StoreHandle {
    store: RwLock<Option<Arc<dyn DocumentStore>>>,
    config: StoreConfig,
}

/// Account store over a document database.
///
/// Clones share one connection. [`UserStore::close`] releases it for every
/// clone; afterwards all methods fail with [`StoreError::Disposed`].
pub struct UserStore<U = IdentityUser> {
    handle: Arc<StoreHandle>,
    _marker: PhantomData<fn() -> U>,
}

impl<U> Clone for UserStore<U> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
            _marker: PhantomData,
        }
    }
}

impl<U> std::fmt::Debug for UserStore<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("connection", &self.handle.config.connection)
            .field("collection", &self.handle.config.collection)
            .finish()
    }
}

impl<U: UserRecord> UserStore<U> {
    /// Connect to the database named by `config` and prepare the collection.
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let store = backend::open(&config.connection).await?;
        Self::with_backend(store, config).await
    }

    /// Use an already opened document store.
    pub async fn with_backend(store: Arc<dyn DocumentStore>, config: StoreConfig) -> Result<Self> {
        UserRepository::new(Arc::clone(&store), &config)
            .ensure_indexes()
            .await?;
        tracing::info!(
            database = store.database_name(),
            collection = %config.collection,
            concurrency = ?config.concurrency,
            "Account store ready"
        );
        Ok(Self {
            handle: Arc::new(StoreHandle {
                store: RwLock::new(Some(store)),
                config,
            }),
            _marker: PhantomData,
        })
    }

    /// The configuration the store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.handle.config
    }

    /// A repository over the live connection, for queries the capability
    /// groups do not cover.
    pub async fn repository(&self) -> Result<UserRepository> {
        let guard = self.handle.store.read().await;
        match guard.as_ref() {
            Some(store) => Ok(UserRepository::new(Arc::clone(store), &self.handle.config)),
            None => Err(self.disposed()),
        }
    }

    /// Fail with [`StoreError::Disposed`] once the store is closed.
    pub(crate) async fn ensure_open(&self) -> Result<()> {
        if self.is_closed().await {
            return Err(self.disposed());
        }
        Ok(())
    }

    fn disposed(&self) -> crate::Error {
        StoreError::Disposed {
            store: self.handle.config.connection.database().to_string(),
        }
        .into()
    }

    /// Whether [`Self::close`] has been called on this store or a clone.
    pub async fn is_closed(&self) -> bool {
        self.handle.store.read().await.is_none()
    }

    /// Release the connection for every clone and close the store.
    ///
    /// Closing an already closed store does nothing.
    pub async fn close(self) -> Result<()> {
        let released = self.handle.store.write().await.take();
        match released {
            Some(store) => {
                store.close().await?;
                tracing::info!(database = store.database_name(), "Account store closed");
            }
            None => tracing::debug!("Account store already closed"),
        }
        Ok(())
    }
}

/// Reject a missing or empty argument.
pub(crate) fn require(argument: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(StoreError::InvalidArgument {
            argument,
            reason: "must not be empty".to_string(),
        }
        .into());
    }
    Ok(())
}
