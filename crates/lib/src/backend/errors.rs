//! Storage error types for the account-store backends.
//!
//! This module defines structured error types for document store operations,
//! providing better error context and type safety compared to string-based errors.

use thiserror::Error;

/// Errors that can occur during document store operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// The store could not be reached or failed in transport.
    #[error("Document store unavailable: {reason}")]
    Unavailable {
        /// Description of the failure
        reason: String,
    },

    /// A write violated a uniqueness rule configured on the store.
    #[error("Constraint violation in collection '{collection}': {reason}")]
    ConstraintViolation {
        /// The collection written to
        collection: String,
        /// Which rule was violated
        reason: String,
    },

    /// A document could not be written because it is not a JSON object or
    /// carries an unusable id.
    #[error("Invalid document for collection '{collection}': {reason}")]
    InvalidDocument {
        /// The collection written to
        collection: String,
        /// What is wrong with the document
        reason: String,
    },

    /// A collection or field name cannot be used by this backend.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// The filter cannot be evaluated by this backend.
    #[error("Unsupported filter: {reason}")]
    UnsupportedFilter {
        /// Why the filter was rejected
        reason: String,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// SQL driver error.
    #[cfg(feature = "sqlite")]
    #[error("SQL error: {reason}")]
    Sql {
        /// Context for the failed statement
        reason: String,
        /// The underlying driver error
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if the store could not be reached or failed in transport.
    pub fn is_unavailable(&self) -> bool {
        match self {
            BackendError::Unavailable { .. } | BackendError::FileIo { .. } => true,
            #[cfg(feature = "sqlite")]
            BackendError::Sql {
                source: Some(source),
                ..
            } => matches!(
                source,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }

    /// Check if a write was rejected by a uniqueness rule.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, BackendError::ConstraintViolation { .. })
    }

    /// Check if this error is related to serialization.
    pub fn is_serialization_error(&self) -> bool {
        matches!(
            self,
            BackendError::SerializationFailed { .. } | BackendError::DeserializationFailed { .. }
        )
    }

    /// Check if the caller supplied something the backend cannot handle.
    pub fn is_logical_error(&self) -> bool {
        matches!(
            self,
            BackendError::InvalidDocument { .. }
                | BackendError::InvalidName { .. }
                | BackendError::UnsupportedFilter { .. }
        )
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
