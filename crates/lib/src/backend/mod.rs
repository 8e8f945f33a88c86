//! Document store backends for account-store
//!
//! This module provides the core `DocumentStore` trait and the backend
//! implementations organized under [`database`].
//!
//! The `DocumentStore` trait is the storage collaborator of the repository: named
//! collections of JSON documents with filtered queries, id-assigning inserts,
//! whole-document replaces and filtered deletes. The repository and façade are
//! independent of the specific storage mechanism.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::Result;
use crate::config::{BackendKind, ConnectionString};
use crate::constants::ID_FIELD;

pub mod database;
mod errors;
mod filter;

pub use errors::BackendError;
pub use filter::Filter;

/// A JSON document: one top-level object.
pub type Document = Map<String, Value>;

/// Storage collaborator abstracting the underlying document database.
///
/// Documents live in named collections and are identified by the string
/// field `id`, which the store assigns on insert. Queries take a [`Filter`]
/// that the implementation evaluates before materializing documents, and
/// return documents in insertion order.
///
/// Every method may fail with [`BackendError::Unavailable`] (or another
/// transport-level variant) when the store cannot be reached; implementations
/// never retry on their own.
///
/// All implementations must be `Send` and `Sync` to allow sharing across tasks,
/// and implement `Any` to allow for downcasting if needed.
#[async_trait]
pub trait DocumentStore: Send + Sync + Any {
    /// Name of the database this store is connected to.
    fn database_name(&self) -> &str;

    /// Returns the first document matching `filter`, if any.
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        Ok(self
            .find_many(collection, filter, Some(1))
            .await?
            .into_iter()
            .next())
    }

    /// Returns the documents matching `filter` in insertion order, at most
    /// `limit` of them when given.
    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Document>>;

    /// Counts the documents matching `filter`.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        Ok(self.find_many(collection, filter, None).await?.len() as u64)
    }

    /// Inserts a document and returns its store-assigned id.
    ///
    /// Any `id` already present in `document` is replaced by a fresh one.
    /// Fails with [`BackendError::ConstraintViolation`] when a unique index
    /// rejects the document.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<String>;

    /// Replaces the whole first document matching `filter` with `document`,
    /// keeping the stored id. Returns the number of documents replaced (0 or 1).
    ///
    /// The match and the write happen atomically with respect to other
    /// calls on the same store, which makes a filter over `id` plus a revision
    /// field a compare-and-swap.
    async fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> Result<u64>;

    /// Deletes every document matching `filter` and returns how many were removed.
    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Enforces uniqueness of a top-level field across the collection.
    ///
    /// Documents where the field is missing or `null` are not constrained.
    /// Creating an index that already exists is a no-op.
    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<()>;

    /// Releases the connection, flushing anything the backend buffers.
    async fn close(&self) -> Result<()>;

    /// Returns a reference to the store instance as a dynamic `Any` type.
    fn as_any(&self) -> &dyn Any;
}

/// Open the backend named by a connection string.
///
/// Fails with [`BackendError::Unavailable`] when the store cannot be reached.
pub async fn open(connection: &ConnectionString) -> Result<Arc<dyn DocumentStore>> {
    tracing::info!(
        connection = %connection,
        database = connection.database(),
        "Opening document store"
    );
    match connection.kind() {
        BackendKind::InMemory => {
            let store = match connection.option("file") {
                Some(path) => database::InMemory::open_file(connection.database(), path).await?,
                None => database::InMemory::new(connection.database()),
            };
            Ok(Arc::new(store))
        }
        #[cfg(feature = "sqlite")]
        BackendKind::Sqlite => Ok(Arc::new(database::Sqlite::connect(connection).await?)),
        #[cfg(not(feature = "sqlite"))]
        BackendKind::Sqlite => Err(BackendError::Unavailable {
            reason: "SQLite support requires the 'sqlite' feature".to_string(),
        }
        .into()),
    }
}

/// Generate a fresh document id.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Check a collection or field name before it reaches a backend.
///
/// Names are restricted to ASCII letters, digits and `_` so they can be used
/// as SQL identifiers and JSON paths without quoting.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(BackendError::InvalidName {
            name: name.to_string(),
            reason: "names must be ASCII letters, digits or '_' and not start with a digit"
                .to_string(),
        }
        .into())
    }
}

/// Check every path a filter references.
pub(crate) fn validate_filter(filter: &Filter) -> Result<()> {
    for path in filter.paths() {
        for segment in path.split('.') {
            validate_name(segment)?;
        }
    }
    Ok(())
}

/// Extract the string id of a stored document.
pub(crate) fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}
