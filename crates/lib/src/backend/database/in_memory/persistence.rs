//! Persistence operations for InMemory database
//!
//! This module handles serialization and file I/O for saving/loading
//! the in-memory collections to/from JSON files.

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Deserializer, Serialize};

use super::{Collection, InMemory};
use crate::{Error, Result, backend::errors::BackendError};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// On-disk shape of an InMemory database
#[derive(Serialize, Deserialize)]
struct SerializableDatabase {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    database: String,
    #[serde(default)]
    collections: HashMap<String, Collection>,
}

/// Writes every collection, unique indexes included, to `path` as JSON.
pub(crate) async fn save_to_file<P: AsRef<Path>>(backend: &InMemory, path: P) -> Result<()> {
    let serializable = SerializableDatabase {
        version: PERSISTENCE_VERSION,
        database: backend.database.clone(),
        collections: backend.collections.read().await.clone(),
    };

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|e| -> Error { BackendError::SerializationFailed { source: e }.into() })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| -> Error { BackendError::FileIo { source: e }.into() })
}

/// Reads a database previously written by [`save_to_file`].
///
/// A missing file yields an empty database named `database`.
pub(crate) async fn load_from_file<P: AsRef<Path>>(database: &str, path: P) -> Result<InMemory> {
    match tokio::fs::read_to_string(path).await {
        Ok(json) => {
            let serializable: SerializableDatabase =
                serde_json::from_str(&json).map_err(|e| -> Error {
                    BackendError::DeserializationFailed { source: e }.into()
                })?;
            if serializable.database != database {
                tracing::warn!(
                    expected = database,
                    found = %serializable.database,
                    "Loaded database file was saved under another name"
                );
            }
            let db = InMemory::new(database);
            *db.collections.write().await = serializable.collections;
            Ok(db)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(InMemory::new(database)),
        Err(e) => Err(BackendError::FileIo { source: e }.into()),
    }
}
