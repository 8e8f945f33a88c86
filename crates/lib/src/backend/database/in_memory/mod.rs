//! In-memory document store implementation
//!
//! This module provides an in-memory implementation of the DocumentStore trait,
//! suitable for testing, development, or deployments that snapshot the whole
//! state to a JSON file.

mod persistence;
mod storage;

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Result;
use crate::backend::{Document, DocumentStore, Filter};

/// One named collection: documents in insertion order plus its unique fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Collection {
    pub(crate) documents: Vec<Document>,
    #[serde(default)]
    pub(crate) unique_fields: BTreeSet<String>,
}

/// A document store kept entirely in memory.
///
/// Each operation takes the collection lock once, so a replace observes and
/// writes the same state. When opened with a file, the state is loaded on open
/// and written back on [`DocumentStore::close`]; `save_to_file` can also be
/// called directly.
#[derive(Debug)]
pub struct InMemory {
    database: String,
    pub(crate) collections: RwLock<HashMap<String, Collection>>,
    file: Option<PathBuf>,
}

impl InMemory {
    /// Creates a new, empty database.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collections: RwLock::new(HashMap::new()),
            file: None,
        }
    }

    /// Opens a database backed by a JSON file, loading it if the file exists.
    ///
    /// The state is written back to the same file on close.
    pub async fn open_file(database: &str, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut db = persistence::load_from_file(database, &path).await?;
        tracing::debug!(database, path = %path.display(), "Opened file-backed in-memory store");
        db.file = Some(path);
        Ok(db)
    }

    /// Saves the entire database state to a file as JSON.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads the database state from a JSON file.
    ///
    /// If the file does not exist, a new, empty database is returned.
    pub async fn load_from_file<P: AsRef<Path>>(database: &str, path: P) -> Result<Self> {
        persistence::load_from_file(database, path).await
    }

    /// Names of the collections that currently exist.
    pub async fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl DocumentStore for InMemory {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Document>> {
        storage::find_many(self, collection, filter, limit).await
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        storage::count(self, collection, filter).await
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<String> {
        storage::insert_one(self, collection, document).await
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> Result<u64> {
        storage::replace_one(self, collection, filter, document).await
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64> {
        storage::delete_many(self, collection, filter).await
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<()> {
        storage::create_unique_index(self, collection, field).await
    }

    async fn close(&self) -> Result<()> {
        if let Some(path) = &self.file {
            tracing::debug!(database = %self.database, path = %path.display(), "Flushing in-memory store");
            self.save_to_file(path).await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
