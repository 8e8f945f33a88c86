//! SQLite document store.
//!
//! Each collection is a table holding one JSON document per row:
//!
//! ```sql
//! CREATE TABLE "<collection>" (
//!     seq INTEGER PRIMARY KEY AUTOINCREMENT,
//!     id  TEXT NOT NULL UNIQUE,
//!     doc TEXT NOT NULL
//! )
//! ```
//!
//! `seq` preserves insertion order, `id` mirrors the document's `id` field and
//! `doc` is the whole document. Filters are compiled to `WHERE` clauses over
//! the JSON1 functions (see [`filter`]) so only matching rows are read, and
//! unique fields become expression indexes on `json_extract`.
//!
//! Tables are created lazily on first use.

mod filter;

use std::any::Any;
use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Row};
use tokio::sync::RwLock;

use self::filter::{SqlArg, WhereClause};
use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{
    Document, DocumentStore, Filter, new_document_id, validate_filter, validate_name,
};
use crate::config::ConnectionString;
use crate::constants::ID_FIELD;

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Similar to `anyhow::Context`, this trait adds a method to convert
/// sqlx errors to `BackendError::Sql` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to BackendError with context message.
    fn sql_context(self, context: &str) -> Result<T>;

    /// Like `sql_context`, but unique-constraint failures become
    /// `BackendError::ConstraintViolation` on `collection`.
    fn write_context(self, collection: &str, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::Sql {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }

    fn write_context(self, collection: &str, context: &str) -> Result<T> {
        self.map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                BackendError::ConstraintViolation {
                    collection: collection.to_string(),
                    reason: db_err.message().to_string(),
                }
                .into()
            }
            _ => BackendError::Sql {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into(),
        })
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>;

fn bind_all<'q>(mut query: SqliteQuery<'q>, args: Vec<SqlArg>) -> SqliteQuery<'q> {
    for arg in args {
        query = match arg {
            SqlArg::Text(s) => query.bind(s),
            SqlArg::Integer(i) => query.bind(i),
            SqlArg::Real(f) => query.bind(f),
        };
    }
    query
}

fn compile(filter: &Filter) -> Result<WhereClause> {
    validate_filter(filter)?;
    filter::compile(filter)
}

fn encode(collection: &str, document: &Document) -> Result<String> {
    serde_json::to_string(document).map_err(|e| {
        tracing::error!(collection, error = %e, "Failed to encode document");
        BackendError::SerializationFailed { source: e }.into()
    })
}

fn decode(text: &str) -> Result<Document> {
    serde_json::from_str(text).map_err(|e| BackendError::DeserializationFailed { source: e }.into())
}

/// Document store over a SQLite database.
pub struct Sqlite {
    pool: SqlitePool,
    database: String,
    tables: RwLock<HashSet<String>>,
}

impl Sqlite {
    /// Connect using a `sqlite://` connection string.
    ///
    /// `?mode=memory` opens a private in-memory database; anything else opens
    /// (and creates if needed) the file named by the path.
    pub async fn connect(connection: &ConnectionString) -> Result<Self> {
        if connection.option("mode").as_deref() == Some("memory") {
            Self::in_memory(connection.database()).await
        } else {
            Self::open_file(connection.database(), connection.path()).await
        }
    }

    /// Open a SQLite database file, creating it if it doesn't exist.
    pub async fn open_file<P: AsRef<std::path::Path>>(database: &str, path: P) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute(
                        "PRAGMA synchronous = NORMAL;
                         PRAGMA busy_timeout = 5000;",
                    )
                    .await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await
            .sql_context("Failed to connect to SQLite")?;

        // WAL is a property of the file, so setting it once suffices.
        sqlx::query("PRAGMA journal_mode = WAL;")
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;

        Ok(Self::from_pool(database, pool))
    }

    /// Create a private in-memory SQLite database.
    ///
    /// The database exists only for the lifetime of this store.
    pub async fn in_memory(database: &str) -> Result<Self> {
        // Shared cache lets every pooled connection see the same database; the
        // unique name keeps separate stores apart.
        let unique_id = uuid::Uuid::new_v4().simple();
        let url = format!("sqlite:file:{database}_{unique_id}?mode=memory&cache=shared");

        // The database is destroyed when its last connection closes, so keep
        // one open for the life of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(&url)
            .await
            .sql_context("Failed to connect to SQLite")?;

        sqlx::query("PRAGMA busy_timeout = 5000;")
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;

        Ok(Self::from_pool(database, pool))
    }

    fn from_pool(database: &str, pool: SqlitePool) -> Self {
        Self {
            pool,
            database: database.to_string(),
            tables: RwLock::new(HashSet::new()),
        }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the collection table on first use.
    async fn ensure_collection(&self, collection: &str) -> Result<()> {
        validate_name(collection)?;
        if self.tables.read().await.contains(collection) {
            return Ok(());
        }

        let mut tables = self.tables.write().await;
        if tables.contains(collection) {
            return Ok(());
        }
        sqlx::query(&format!(
            r#"CREATE TABLE IF NOT EXISTS "{collection}" (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                doc TEXT NOT NULL
            )"#
        ))
        .execute(&self.pool)
        .await
        .sql_context("Failed to create collection table")?;
        tracing::debug!(database = %self.database, collection, "Created collection table");
        tables.insert(collection.to_string());
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for Sqlite {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Document>> {
        self.ensure_collection(collection).await?;
        let WhereClause { sql: clause, args } = compile(filter)?;

        let mut sql = format!(r#"SELECT doc FROM "{collection}" WHERE {clause} ORDER BY seq"#);
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = bind_all(sqlx::query(&sql), args)
            .fetch_all(&self.pool)
            .await
            .sql_context("Failed to query documents")?;

        rows.iter()
            .map(|row| {
                let text: String = row.try_get("doc").sql_context("Failed to read document")?;
                decode(&text)
            })
            .collect()
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        self.ensure_collection(collection).await?;
        let WhereClause { sql: clause, args } = compile(filter)?;

        let sql = format!(r#"SELECT COUNT(*) FROM "{collection}" WHERE {clause}"#);
        let row = bind_all(sqlx::query(&sql), args)
            .fetch_one(&self.pool)
            .await
            .sql_context("Failed to count documents")?;
        let count: i64 = row.try_get(0).sql_context("Failed to read count")?;
        Ok(count as u64)
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<String> {
        self.ensure_collection(collection).await?;

        let id = new_document_id();
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        let text = encode(collection, &document)?;

        sqlx::query(&format!(
            r#"INSERT INTO "{collection}" (id, doc) VALUES (?, ?)"#
        ))
        .bind(&id)
        .bind(text)
        .execute(&self.pool)
        .await
        .write_context(collection, "Failed to insert document")?;

        Ok(id)
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> Result<u64> {
        self.ensure_collection(collection).await?;
        let WhereClause { sql: clause, args } = compile(filter)?;
        let text = encode(collection, &document)?;

        // One statement, so the match and the write are atomic.
        let sql = format!(
            r#"UPDATE "{collection}" SET doc = json_set(?, '$.{ID_FIELD}', id)
               WHERE seq = (SELECT seq FROM "{collection}" WHERE {clause} ORDER BY seq LIMIT 1)"#
        );
        let result = bind_all(sqlx::query(&sql).bind(text), args)
            .execute(&self.pool)
            .await
            .write_context(collection, "Failed to replace document")?;

        Ok(result.rows_affected())
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64> {
        self.ensure_collection(collection).await?;
        let WhereClause { sql: clause, args } = compile(filter)?;

        let sql = format!(r#"DELETE FROM "{collection}" WHERE {clause}"#);
        let result = bind_all(sqlx::query(&sql), args)
            .execute(&self.pool)
            .await
            .sql_context("Failed to delete documents")?;

        Ok(result.rows_affected())
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<()> {
        self.ensure_collection(collection).await?;
        validate_name(field)?;

        // SQLite unique indexes allow any number of NULLs, which covers both
        // missing and null fields.
        sqlx::query(&format!(
            r#"CREATE UNIQUE INDEX IF NOT EXISTS "ux_{collection}_{field}"
               ON "{collection}" (json_extract(doc, '$.{field}'))"#
        ))
        .execute(&self.pool)
        .await
        .write_context(collection, "Failed to create unique index")?;

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
