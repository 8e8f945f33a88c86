//! Error types for the account store façade.

use thiserror::Error;

/// Errors raised by [`super::UserStore`] before any storage is touched.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store handle was released by `close`
    #[error("Account store '{store}' has been closed")]
    Disposed { store: String },

    /// A required argument was missing or empty
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },
}

impl StoreError {
    /// Check if the store handle had already been released
    pub fn is_disposed(&self) -> bool {
        matches!(self, StoreError::Disposed { .. })
    }

    /// Check if a required argument was missing or empty
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StoreError::InvalidArgument { .. })
    }

    /// Get the argument name if this is an argument error
    pub fn argument(&self) -> Option<&'static str> {
        match self {
            StoreError::InvalidArgument { argument, .. } => Some(argument),
            _ => None,
        }
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
