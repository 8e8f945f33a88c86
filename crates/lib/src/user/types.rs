//! Core data types for user accounts

use serde::{Deserialize, Serialize};

/// A user account as stored in the users collection.
///
/// The aggregate is a plain value: mutations only change this copy until it
/// is written back with a merge-update. Sub-collections keep their insertion
/// order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    /// Store-assigned identifier; `None` until the account is created
    #[serde(default)]
    pub id: Option<String>,

    /// Login name
    pub user_name: String,

    /// Opaque password hash, `None` for passwordless accounts
    #[serde(default)]
    pub password_hash: Option<String>,

    /// Opaque token that changes whenever credentials change
    #[serde(default)]
    pub security_stamp: Option<String>,

    /// Role names, stored with their original casing
    #[serde(default)]
    pub roles: Vec<String>,

    /// External login pairs
    #[serde(default)]
    pub logins: Vec<UserLoginInfo>,

    /// Claims; several may share a type
    #[serde(default)]
    pub claims: Vec<UserClaim>,

    /// Document revision, bumped by every merge-update
    #[serde(default)]
    pub revision: u64,
}

impl IdentityUser {
    /// Create a transient account with the given user name.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            ..Default::default()
        }
    }

    /// The store-assigned id, if the account has been created.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Whether the account has not been created yet.
    pub fn is_transient(&self) -> bool {
        self.id().is_none()
    }

    /// Whether a password hash is present and non-empty.
    pub fn has_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }

    pub fn has_login(&self, login: &UserLoginInfo) -> bool {
        self.logins.contains(login)
    }

    /// Append a login pair unless it is already present. Returns whether the
    /// aggregate changed.
    pub fn add_login(&mut self, login: UserLoginInfo) -> bool {
        if self.has_login(&login) {
            return false;
        }
        self.logins.push(login);
        true
    }

    /// Remove every entry equal to `login`. Returns how many were removed.
    pub fn remove_login(&mut self, login: &UserLoginInfo) -> usize {
        let before = self.logins.len();
        self.logins.retain(|l| l != login);
        before - self.logins.len()
    }

    pub fn has_claim(&self, claim: &UserClaim) -> bool {
        self.claims.contains(claim)
    }

    /// Append a claim unless an identical `(type, value)` pair is present.
    /// Returns whether the aggregate changed.
    pub fn add_claim(&mut self, claim: UserClaim) -> bool {
        if self.has_claim(&claim) {
            return false;
        }
        self.claims.push(claim);
        true
    }

    /// Remove all claims of `claim_type`, whatever their value. Returns how
    /// many were removed.
    pub fn remove_claims_of_type(&mut self, claim_type: &str) -> usize {
        let before = self.claims.len();
        self.claims.retain(|c| c.claim_type != claim_type);
        before - self.claims.len()
    }

    /// Case-insensitive role membership.
    pub fn is_in_role(&self, role: &str) -> bool {
        let role = role.to_lowercase();
        self.roles.iter().any(|r| r.to_lowercase() == role)
    }

    /// Append a role unless a case-insensitive match is present. Returns
    /// whether the aggregate changed.
    pub fn add_role(&mut self, role: impl Into<String>) -> bool {
        let role = role.into();
        if self.is_in_role(&role) {
            return false;
        }
        self.roles.push(role);
        true
    }

    /// Remove every role matching `role` case-insensitively. Returns how many
    /// were removed.
    pub fn remove_role(&mut self, role: &str) -> usize {
        let role = role.to_lowercase();
        let before = self.roles.len();
        self.roles.retain(|r| r.to_lowercase() != role);
        before - self.roles.len()
    }
}

/// An external login: provider name plus the provider's key for the account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLoginInfo {
    pub login_provider: String,
    pub provider_key: String,
}

impl UserLoginInfo {
    pub fn new(login_provider: impl Into<String>, provider_key: impl Into<String>) -> Self {
        Self {
            login_provider: login_provider.into(),
            provider_key: provider_key.into(),
        }
    }
}

/// A claim as stored in the account document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaim {
    pub claim_type: String,
    pub claim_value: String,
}

impl UserClaim {
    pub fn new(claim_type: impl Into<String>, claim_value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            claim_value: claim_value.into(),
        }
    }
}

/// A claim as handed to and returned from the account store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

impl From<Claim> for UserClaim {
    fn from(claim: Claim) -> Self {
        UserClaim {
            claim_type: claim.claim_type,
            claim_value: claim.value,
        }
    }
}

impl From<&UserClaim> for Claim {
    fn from(claim: &UserClaim) -> Self {
        Claim {
            claim_type: claim.claim_type.clone(),
            value: claim.claim_value.clone(),
        }
    }
}
