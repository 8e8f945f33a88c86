//! User account aggregates
//!
//! [`IdentityUser`] is the persisted account: credentials, external logins,
//! claims and roles in one document. Applications that need more fields wrap
//! it in their own type and implement [`UserRecord`]:
//!
//! ```
//! use account_store::user::{IdentityUser, UserRecord};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Member {
//!     #[serde(flatten)]
//!     identity: IdentityUser,
//!     display_name: Option<String>,
//! }
//!
//! impl UserRecord for Member {
//!     fn identity(&self) -> &IdentityUser {
//!         &self.identity
//!     }
//!     fn identity_mut(&mut self) -> &mut IdentityUser {
//!         &mut self.identity
//!     }
//! }
//! ```

mod types;

use serde::{Serialize, de::DeserializeOwned};

pub use types::*;

/// An account type the store can persist.
///
/// Implementors serialize to one JSON object whose fields include those of
/// the embedded [`IdentityUser`], normally through `#[serde(flatten)]`.
pub trait UserRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The embedded account.
    fn identity(&self) -> &IdentityUser;

    /// Mutable access to the embedded account.
    fn identity_mut(&mut self) -> &mut IdentityUser;
}

impl UserRecord for IdentityUser {
    fn identity(&self) -> &IdentityUser {
        self
    }

    fn identity_mut(&mut self) -> &mut IdentityUser {
        self
    }
}
