//! Repository over the users collection.
//!
//! [`UserRepository`] is the only component that talks to the
//! [`DocumentStore`]. It offers lazy typed queries, inserts, hard deletes and
//! the merge-update, which reconciles an in-memory aggregate with the
//! authoritative stored document instead of overwriting it (see [`merge`]).

mod errors;
pub mod merge;
mod query;

use std::sync::Arc;

pub use errors::RepositoryError;
pub use merge::MergedDocument;
pub use query::Query;

use self::merge::{decode, encode, stored_revision};
use crate::{
    Result,
    backend::{DocumentStore, Filter},
    config::{ConcurrencyMode, StoreConfig},
    constants::{REVISION_FIELD, USER_NAME_FIELD},
    user::UserRecord,
};

/// Typed access to the account documents of one collection.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
    concurrency: ConcurrencyMode,
    unique_user_names: bool,
}

impl std::fmt::Debug for UserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRepository")
            .field("database", &self.store.database_name())
            .field("collection", &self.collection)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl UserRepository {
    /// Create a repository over `store` using the collection and concurrency
    /// mode from `config`.
    pub fn new(store: Arc<dyn DocumentStore>, config: &StoreConfig) -> Self {
        Self {
            store,
            collection: config.collection.clone(),
            concurrency: config.concurrency,
            unique_user_names: config.unique_user_names,
        }
    }

    /// The collection holding the account documents.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The concurrency mode used by [`Self::update_merge`].
    pub fn concurrency(&self) -> ConcurrencyMode {
        self.concurrency
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Create the indexes the configuration asks for.
    pub async fn ensure_indexes(&self) -> Result<()> {
        if self.unique_user_names {
            self.store
                .create_unique_index(&self.collection, USER_NAME_FIELD)
                .await?;
        }
        Ok(())
    }

    /// Start a lazy query over the collection, decoding documents as `T`.
    pub fn query<T: UserRecord>(&self) -> Query<T> {
        Query::new(Arc::clone(&self.store), self.collection.as_str())
    }

    /// Persist a new aggregate.
    ///
    /// Any id the caller set is discarded; the store assigns one, which is
    /// written back into `user` along with revision 0.
    pub async fn insert<U: UserRecord>(&self, user: &mut U) -> Result<()> {
        {
            let identity = user.identity_mut();
            identity.id = None;
            identity.revision = 0;
        }
        let document = encode(user)?;

        let id = self.store.insert_one(&self.collection, document).await?;
        tracing::info!(
            collection = %self.collection,
            id = %id,
            user_name = %user.identity().user_name,
            "Created account"
        );
        user.identity_mut().id = Some(id);
        Ok(())
    }

    /// Write an aggregate back, merged with the stored document.
    ///
    /// The stored document is loaded by id and the written document keeps its
    /// id and any fields the caller's type does not know about, while every
    /// field the type maps and the `roles`, `logins` and `claims` collections
    /// come from `user`. The revision is bumped and written back into `user`.
    ///
    /// Fails with [`RepositoryError::TransientAggregate`] if `user` has no id
    /// and with [`RepositoryError::NotFound`] if no document has that id; in
    /// both cases nothing is written. In [`ConcurrencyMode::Optimistic`] a
    /// stale `user` fails with [`RepositoryError::Conflict`].
    pub async fn update_merge<U: UserRecord>(&self, user: &mut U) -> Result<()> {
        let id = user
            .identity()
            .id()
            .ok_or(RepositoryError::TransientAggregate)?
            .to_string();
        let by_id = Filter::by_id(&id);

        let Some(stored) = self.store.find_one(&self.collection, &by_id).await? else {
            tracing::warn!(collection = %self.collection, id = %id, "Update target not found");
            return Err(self.not_found(&id));
        };
        let base_revision = stored_revision(&stored);

        let target = match self.concurrency {
            ConcurrencyMode::LastWriterWins => by_id,
            ConcurrencyMode::Optimistic => {
                let expected = user.identity().revision;
                if expected != base_revision {
                    tracing::warn!(
                        id = %id,
                        expected,
                        found = base_revision,
                        "Stale aggregate rejected"
                    );
                    return Err(RepositoryError::Conflict { id, expected }.into());
                }
                by_id.and(Filter::eq(REVISION_FIELD, base_revision))
            }
        };

        let incoming = encode(user)?;
        let mapped = encode(&decode::<U>(&self.collection, stored.clone())?)?;
        let merged = MergedDocument::from_authoritative(stored)
            .without_fields_of(&mapped)
            .with_fields_from(&incoming)
            .with_collections_from(&incoming)
            .finish(base_revision + 1);

        let replaced = self
            .store
            .replace_one(&self.collection, &target, merged)
            .await?;
        if replaced == 0 {
            return Err(match self.concurrency {
                ConcurrencyMode::LastWriterWins => {
                    tracing::warn!(id = %id, "Account vanished during update");
                    self.not_found(&id)
                }
                ConcurrencyMode::Optimistic => {
                    tracing::warn!(id = %id, expected = base_revision, "Lost update race");
                    RepositoryError::Conflict {
                        id,
                        expected: base_revision,
                    }
                    .into()
                }
            });
        }

        tracing::debug!(id = %id, revision = base_revision + 1, "Merged account update");
        user.identity_mut().revision = base_revision + 1;
        Ok(())
    }

    /// Delete the account with `id`. Deleting a missing account is not an
    /// error. Returns whether a document was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self
            .store
            .delete_many(&self.collection, &Filter::by_id(id))
            .await?;
        if removed > 0 {
            tracing::info!(collection = %self.collection, id, "Deleted account");
        } else {
            tracing::debug!(collection = %self.collection, id, "Delete matched no account");
        }
        Ok(removed > 0)
    }

    /// Load the account with `id` as `T`.
    pub async fn get<T: UserRecord>(&self, id: &str) -> Result<Option<T>> {
        match self
            .store
            .find_one(&self.collection, &Filter::by_id(id))
            .await?
        {
            Some(document) => decode(&self.collection, document).map(Some),
            None => Ok(None),
        }
    }

    fn not_found(&self, id: &str) -> crate::Error {
        RepositoryError::NotFound {
            collection: self.collection.clone(),
            id: id.to_string(),
        }
        .into()
    }
}
