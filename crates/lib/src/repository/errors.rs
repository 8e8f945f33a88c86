//! Error types for repository operations.

use thiserror::Error;

/// Errors raised by [`super::UserRepository`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The document to update does not exist (or vanished during the update)
    #[error("Document '{id}' not found in collection '{collection}'")]
    NotFound { collection: String, id: String },

    /// The aggregate has no id, so it cannot be updated
    #[error("Aggregate has not been persisted yet and has no id")]
    TransientAggregate,

    /// An optimistic merge-update lost against a concurrent writer
    #[error("Document '{id}' changed concurrently; expected revision {expected}")]
    Conflict { id: String, expected: u64 },

    /// A stored document could not be decoded into the requested type
    #[error("Failed to decode document from collection '{collection}': {reason}")]
    DecodeFailed { collection: String, reason: String },

    /// An aggregate could not be encoded as a JSON object
    #[error("Failed to encode aggregate: {reason}")]
    EncodeFailed { reason: String },
}

impl RepositoryError {
    /// Check if the update target was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    /// Check if an optimistic update lost a race
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict { .. })
    }

    /// Check if the operation needed a persisted aggregate
    pub fn is_transient_aggregate(&self) -> bool {
        matches!(self, RepositoryError::TransientAggregate)
    }

    /// Check if this error is related to serialization
    pub fn is_serialization_error(&self) -> bool {
        matches!(
            self,
            RepositoryError::DecodeFailed { .. } | RepositoryError::EncodeFailed { .. }
        )
    }
}

impl From<RepositoryError> for crate::Error {
    fn from(err: RepositoryError) -> Self {
        crate::Error::Repository(err)
    }
}
