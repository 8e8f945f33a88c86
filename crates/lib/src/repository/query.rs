//! Lazy typed queries over the users collection.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use super::merge::decode;
use crate::{
    Result,
    backend::{DocumentStore, Filter},
    constants::{LOGIN_PROVIDER_FIELD, LOGINS_FIELD, PROVIDER_KEY_FIELD, USER_NAME_FIELD},
    user::{UserLoginInfo, UserRecord},
};

/// A composable query that runs only when a terminal method is called.
///
/// Builder methods AND their filters together. Each terminal call evaluates
/// the query against the store again, so a `Query` can be kept and re-run.
///
/// ```no_run
/// # use account_store::{backend::Filter, repository::UserRepository, user::IdentityUser};
/// # async fn run(repo: &UserRepository) -> account_store::Result<()> {
/// let google = repo
///     .query::<IdentityUser>()
///     .filter(Filter::elem_match("logins", Filter::eq("loginProvider", "google")))
///     .limit(10);
/// let first_page = google.fetch_all().await?;
/// let shown = google.count().await?;
/// # Ok(())
/// # }
/// ```
pub struct Query<T> {
    store: Arc<dyn DocumentStore>,
    collection: String,
    filter: Filter,
    limit: Option<usize>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            collection: self.collection.clone(),
            filter: self.filter.clone(),
            limit: self.limit,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("collection", &self.collection)
            .field("filter", &self.filter)
            .field("limit", &self.limit)
            .finish()
    }
}

impl<T: UserRecord> Query<T> {
    pub(crate) fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            filter: Filter::All,
            limit: None,
            _marker: PhantomData,
        }
    }

    /// Add an arbitrary filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = self.filter.and(filter);
        self
    }

    /// Match the account with this id.
    pub fn by_id(self, id: &str) -> Self {
        self.filter(Filter::by_id(id))
    }

    /// Match accounts with this exact user name.
    pub fn by_user_name(self, user_name: &str) -> Self {
        self.filter(Filter::eq(USER_NAME_FIELD, user_name))
    }

    /// Match accounts holding this external login pair.
    pub fn with_login(self, login: &UserLoginInfo) -> Self {
        self.filter(Filter::elem_match(
            LOGINS_FIELD,
            Filter::eq(
                LOGIN_PROVIDER_FIELD,
                Value::String(login.login_provider.clone()),
            )
            .and(Filter::eq(
                PROVIDER_KEY_FIELD,
                Value::String(login.provider_key.clone()),
            )),
        ))
    }

    /// Return at most `limit` accounts.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The filter this query will run.
    pub fn as_filter(&self) -> &Filter {
        &self.filter
    }

    /// First matching account, in insertion order.
    pub async fn first(&self) -> Result<Option<T>> {
        tracing::debug!(
            collection = %self.collection,
            filter = ?self.filter,
            "Querying first account"
        );
        match self.store.find_one(&self.collection, &self.filter).await? {
            Some(document) => decode(&self.collection, document).map(Some),
            None => Ok(None),
        }
    }

    /// All matching accounts, in insertion order.
    pub async fn fetch_all(&self) -> Result<Vec<T>> {
        tracing::debug!(
            collection = %self.collection,
            filter = ?self.filter,
            limit = ?self.limit,
            "Querying accounts"
        );
        self.store
            .find_many(&self.collection, &self.filter, self.limit)
            .await?
            .into_iter()
            .map(|document| decode(&self.collection, document))
            .collect()
    }

    /// Number of matching accounts, honoring the limit.
    pub async fn count(&self) -> Result<u64> {
        let count = self.store.count(&self.collection, &self.filter).await?;
        Ok(match self.limit {
            Some(limit) => count.min(limit as u64),
            None => count,
        })
    }
}
