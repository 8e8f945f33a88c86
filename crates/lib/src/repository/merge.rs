//! Merge-update document construction.
//!
//! A merge-update never writes the caller's aggregate verbatim. The written
//! document starts from the stored one, drops every field the caller's type
//! maps, takes those fields from the in-memory copy, and bumps the revision:
//!
//! | field                         | source                      |
//! |-------------------------------|-----------------------------|
//! | `id`                          | stored                      |
//! | fields unknown to the caller  | stored                      |
//! | scalar fields of the caller   | in-memory                   |
//! | `roles`, `logins`, `claims`   | in-memory                   |
//! | `revision`                    | stored + 1                  |

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::RepositoryError;
use crate::{
    Result,
    backend::Document,
    constants::{ID_FIELD, REVISION_FIELD, SUB_COLLECTION_FIELDS},
};

/// Builder for the document written by a merge-update.
#[derive(Debug, Clone)]
pub struct MergedDocument {
    document: Document,
}

impl MergedDocument {
    /// Start from the authoritative stored document.
    pub fn from_authoritative(stored: Document) -> Self {
        Self { document: stored }
    }

    /// Drop the scalar fields the caller's type maps.
    ///
    /// `mapped` is the stored document read back through the caller's type,
    /// so its keys are the stored fields that type knows about. A field the
    /// caller omits when serializing (e.g. a `None` skipped by
    /// `skip_serializing_if`) is then absent from the merge instead of keeping
    /// its stale stored value.
    pub fn without_fields_of(mut self, mapped: &Document) -> Self {
        for key in mapped.keys().filter(|key| is_scalar_field(key)) {
            self.document.remove(key);
        }
        self
    }

    /// Overwrite the scalar fields present in `incoming`.
    ///
    /// `id`, `revision` and the sub-collections are left alone.
    pub fn with_fields_from(mut self, incoming: &Document) -> Self {
        let scalars = incoming.iter().filter(|(key, _)| is_scalar_field(key));
        for (key, value) in scalars {
            self.document.insert(key.clone(), value.clone());
        }
        self
    }

    /// Overwrite `roles`, `logins` and `claims` with the in-memory
    /// collections in `incoming`.
    pub fn with_collections_from(mut self, incoming: &Document) -> Self {
        for field in SUB_COLLECTION_FIELDS {
            let value = incoming
                .get(field)
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new()));
            self.document.insert(field.to_string(), value);
        }
        self
    }

    /// Set the revision and return the document to write.
    pub fn finish(mut self, revision: u64) -> Document {
        self.document
            .insert(REVISION_FIELD.to_string(), Value::from(revision));
        self.document
    }
}

fn is_scalar_field(key: &str) -> bool {
    key != ID_FIELD && key != REVISION_FIELD && !SUB_COLLECTION_FIELDS.contains(&key)
}

/// Revision of a stored document; documents written without one count as 0.
pub(crate) fn stored_revision(document: &Document) -> u64 {
    document
        .get(REVISION_FIELD)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Serialize an aggregate to a document.
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(other) => Err(RepositoryError::EncodeFailed {
            reason: format!("expected a JSON object, got {other}"),
        }
        .into()),
        Err(e) => Err(RepositoryError::EncodeFailed {
            reason: e.to_string(),
        }
        .into()),
    }
}

/// Deserialize a stored document into an aggregate.
pub(crate) fn decode<T: DeserializeOwned>(collection: &str, document: Document) -> Result<T> {
    serde_json::from_value(Value::Object(document)).map_err(|e| {
        RepositoryError::DecodeFailed {
            collection: collection.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
