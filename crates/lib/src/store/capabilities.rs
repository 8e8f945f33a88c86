//! Capability groups implemented by [`UserStore`].

use async_trait::async_trait;

use super::{StoreError, UserStore, require};
use crate::{
    Result,
    user::{Claim, UserClaim, UserLoginInfo, UserRecord},
};

/// External login management.
#[async_trait]
pub trait UserLoginStore<U: UserRecord>: Send + Sync {
    /// Attach a login pair and persist. Attaching a pair the account already
    /// has does nothing.
    async fn add_login(&self, user: &mut U, login: UserLoginInfo) -> Result<()>;

    /// The first account holding the login pair.
    async fn find_by_login(&self, login: &UserLoginInfo) -> Result<Option<U>>;

    /// The account's login pairs.
    async fn get_logins(&self, user: &U) -> Result<Vec<UserLoginInfo>>;

    /// Detach a login pair, persisting if the account had it.
    async fn remove_login(&self, user: &mut U, login: &UserLoginInfo) -> Result<()>;
}

/// Claim management.
#[async_trait]
pub trait UserClaimStore<U: UserRecord>: Send + Sync {
    /// Add a claim and persist, unless an identical claim is present.
    async fn add_claim(&self, user: &mut U, claim: Claim) -> Result<()>;

    /// The account's claims.
    async fn get_claims(&self, user: &U) -> Result<Vec<Claim>>;

    /// Remove every claim with the type of `claim`, whatever its value, and
    /// persist.
    async fn remove_claim(&self, user: &mut U, claim: &Claim) -> Result<()>;
}

/// Role membership. Role names compare case-insensitively.
#[async_trait]
pub trait UserRoleStore<U: UserRecord>: Send + Sync {
    /// Add the account to a role and persist, unless it is already a member.
    async fn add_to_role(&self, user: &mut U, role: &str) -> Result<()>;

    /// The account's roles with their stored casing.
    async fn get_roles(&self, user: &U) -> Result<Vec<String>>;

    async fn is_in_role(&self, user: &U, role: &str) -> Result<bool>;

    /// Remove the account from a role, persisting if it was a member.
    async fn remove_from_role(&self, user: &mut U, role: &str) -> Result<()>;
}

/// Password hash access. Changes are persisted by [`UserLifecycleStore::update`].
#[async_trait]
pub trait UserPasswordStore<U: UserRecord>: Send + Sync {
    async fn set_password_hash(&self, user: &mut U, password_hash: Option<String>) -> Result<()>;

    async fn get_password_hash(&self, user: &U) -> Result<Option<String>>;

    /// Whether the account has a non-empty password hash.
    async fn has_password(&self, user: &U) -> Result<bool>;
}

/// Security stamp access. Changes are persisted by [`UserLifecycleStore::update`].
#[async_trait]
pub trait UserSecurityStampStore<U: UserRecord>: Send + Sync {
    async fn set_security_stamp(&self, user: &mut U, stamp: String) -> Result<()>;

    async fn get_security_stamp(&self, user: &U) -> Result<Option<String>>;
}

/// Account creation, lookup, update and deletion.
#[async_trait]
pub trait UserLifecycleStore<U: UserRecord>: Send + Sync {
    /// Persist a new account; its id is assigned by the store.
    async fn create(&self, user: &mut U) -> Result<()>;

    /// Delete the account. Deleting an account that is already gone is not
    /// an error.
    async fn delete(&self, user: &U) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<U>>;

    async fn find_by_name(&self, user_name: &str) -> Result<Option<U>>;

    /// Merge the account into its stored document.
    async fn update(&self, user: &mut U) -> Result<()>;
}

#[async_trait]
impl<U: UserRecord> UserLoginStore<U> for UserStore<U> {
    async fn add_login(&self, user: &mut U, login: UserLoginInfo) -> Result<()> {
        let repo = self.repository().await?;
        require("login_provider", &login.login_provider)?;
        require("provider_key", &login.provider_key)?;

        if !user.identity_mut().add_login(login) {
            tracing::debug!(user_name = %user.identity().user_name, "Login already present");
            return Ok(());
        }
        repo.update_merge(user).await
    }

    async fn find_by_login(&self, login: &UserLoginInfo) -> Result<Option<U>> {
        let repo = self.repository().await?;
        require("login_provider", &login.login_provider)?;
        require("provider_key", &login.provider_key)?;

        repo.query::<U>().with_login(login).first().await
    }

    async fn get_logins(&self, user: &U) -> Result<Vec<UserLoginInfo>> {
        self.ensure_open().await?;
        Ok(user.identity().logins.clone())
    }

    async fn remove_login(&self, user: &mut U, login: &UserLoginInfo) -> Result<()> {
        let repo = self.repository().await?;
        require("login_provider", &login.login_provider)?;
        require("provider_key", &login.provider_key)?;

        if user.identity_mut().remove_login(login) == 0 {
            return Ok(());
        }
        repo.update_merge(user).await
    }
}

#[async_trait]
impl<U: UserRecord> UserClaimStore<U> for UserStore<U> {
    async fn add_claim(&self, user: &mut U, claim: Claim) -> Result<()> {
        let repo = self.repository().await?;
        require("claim_type", &claim.claim_type)?;

        if !user.identity_mut().add_claim(UserClaim::from(claim)) {
            tracing::debug!(user_name = %user.identity().user_name, "Claim already present");
            return Ok(());
        }
        repo.update_merge(user).await
    }

    async fn get_claims(&self, user: &U) -> Result<Vec<Claim>> {
        self.ensure_open().await?;
        Ok(user.identity().claims.iter().map(Claim::from).collect())
    }

    async fn remove_claim(&self, user: &mut U, claim: &Claim) -> Result<()> {
        let repo = self.repository().await?;
        require("claim_type", &claim.claim_type)?;

        let removed = user.identity_mut().remove_claims_of_type(&claim.claim_type);
        tracing::debug!(claim_type = %claim.claim_type, removed, "Removed claims");
        repo.update_merge(user).await
    }
}

#[async_trait]
impl<U: UserRecord> UserRoleStore<U> for UserStore<U> {
    async fn add_to_role(&self, user: &mut U, role: &str) -> Result<()> {
        let repo = self.repository().await?;
        require("role", role)?;

        if !user.identity_mut().add_role(role) {
            tracing::debug!(user_name = %user.identity().user_name, role, "Already in role");
            return Ok(());
        }
        repo.update_merge(user).await
    }

    async fn get_roles(&self, user: &U) -> Result<Vec<String>> {
        self.ensure_open().await?;
        Ok(user.identity().roles.clone())
    }

    async fn is_in_role(&self, user: &U, role: &str) -> Result<bool> {
        self.ensure_open().await?;
        require("role", role)?;
        Ok(user.identity().is_in_role(role))
    }

    async fn remove_from_role(&self, user: &mut U, role: &str) -> Result<()> {
        let repo = self.repository().await?;
        require("role", role)?;

        if user.identity_mut().remove_role(role) == 0 {
            return Ok(());
        }
        repo.update_merge(user).await
    }
}

#[async_trait]
impl<U: UserRecord> UserPasswordStore<U> for UserStore<U> {
    async fn set_password_hash(&self, user: &mut U, password_hash: Option<String>) -> Result<()> {
        self.ensure_open().await?;
        user.identity_mut().password_hash = password_hash;
        Ok(())
    }

    async fn get_password_hash(&self, user: &U) -> Result<Option<String>> {
        self.ensure_open().await?;
        Ok(user.identity().password_hash.clone())
    }

    async fn has_password(&self, user: &U) -> Result<bool> {
        self.ensure_open().await?;
        Ok(user.identity().has_password())
    }
}

#[async_trait]
impl<U: UserRecord> UserSecurityStampStore<U> for UserStore<U> {
    async fn set_security_stamp(&self, user: &mut U, stamp: String) -> Result<()> {
        self.ensure_open().await?;
        user.identity_mut().security_stamp = Some(stamp);
        Ok(())
    }

    async fn get_security_stamp(&self, user: &U) -> Result<Option<String>> {
        self.ensure_open().await?;
        Ok(user.identity().security_stamp.clone())
    }
}

#[async_trait]
impl<U: UserRecord> UserLifecycleStore<U> for UserStore<U> {
    async fn create(&self, user: &mut U) -> Result<()> {
        let repo = self.repository().await?;
        require("user_name", &user.identity().user_name)?;
        repo.insert(user).await
    }

    async fn delete(&self, user: &U) -> Result<()> {
        let repo = self.repository().await?;
        let id = user.identity().id().ok_or(StoreError::InvalidArgument {
            argument: "user",
            reason: "account has not been created".to_string(),
        })?;
        repo.delete(id).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<U>> {
        let repo = self.repository().await?;
        require("id", id)?;
        repo.query::<U>().by_id(id).first().await
    }

    async fn find_by_name(&self, user_name: &str) -> Result<Option<U>> {
        let repo = self.repository().await?;
        require("user_name", user_name)?;
        repo.query::<U>().by_user_name(user_name).first().await
    }

    async fn update(&self, user: &mut U) -> Result<()> {
        let repo = self.repository().await?;
        repo.update_merge(user).await
    }
}
