//! Merge-update behavior of UserRepository.

use std::sync::Arc;

use account_store::{
    backend::{DocumentStore, Filter},
    config::ConcurrencyMode,
    repository::UserRepository,
    user::{IdentityUser, UserClaim, UserLoginInfo, UserRecord},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::helpers::{CountingStore, test_backend, test_config, test_repository};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Member {
    #[serde(flatten)]
    identity: IdentityUser,
    display_name: Option<String>,
}

impl UserRecord for Member {
    fn identity(&self) -> &IdentityUser {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut IdentityUser {
        &mut self.identity
    }
}

#[tokio::test]
async fn test_merge_preserves_unknown_stored_fields() {
    let repo = test_repository(&test_config()).await;

    // Written by a richer account type the caller does not know about.
    let mut member = Member {
        identity: IdentityUser::new("alice"),
        display_name: Some("Alice A.".to_string()),
    };
    repo.insert(&mut member).await.unwrap();
    let id = member.identity.id().unwrap().to_string();

    let mut plain: IdentityUser = repo.get(&id).await.unwrap().unwrap();
    plain.add_claim(UserClaim::new("dept", "eng"));
    repo.update_merge(&mut plain).await.unwrap();

    let stored: Member = repo.get(&id).await.unwrap().unwrap();
    assert_eq!(stored.display_name.as_deref(), Some("Alice A."));
    assert_eq!(stored.identity.claims, vec![UserClaim::new("dept", "eng")]);
    assert_eq!(stored.identity.revision, 1);
}

#[tokio::test]
async fn test_merge_writes_extension_fields() {
    let repo = test_repository(&test_config()).await;
    let mut member = Member {
        identity: IdentityUser::new("bob"),
        display_name: None,
    };
    repo.insert(&mut member).await.unwrap();

    member.display_name = Some("Bobby".to_string());
    member.identity.add_role("Ops");
    repo.update_merge(&mut member).await.unwrap();

    let stored: Member = repo.get(member.identity.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.display_name.as_deref(), Some("Bobby"));
    assert_eq!(stored.identity.roles, vec!["Ops"]);
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Nicknamed {
    #[serde(flatten)]
    identity: IdentityUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
}

impl UserRecord for Nicknamed {
    fn identity(&self) -> &IdentityUser {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut IdentityUser {
        &mut self.identity
    }
}

#[tokio::test]
async fn test_merge_clears_fields_skipped_when_none() {
    let repo = test_repository(&test_config()).await;
    let mut user = Nicknamed {
        identity: IdentityUser::new("bob"),
        nickname: Some("bobby".to_string()),
    };
    repo.insert(&mut user).await.unwrap();
    let id = user.identity.id().unwrap().to_string();

    user.nickname = None;
    repo.update_merge(&mut user).await.unwrap();

    let stored: Nicknamed = repo.get(&id).await.unwrap().unwrap();
    assert_eq!(stored.nickname, None);

    // Fields unknown to the type still survive.
    let mut member: Member = repo.get(&id).await.unwrap().unwrap();
    member.display_name = Some("Bob B.".to_string());
    repo.update_merge(&mut member).await.unwrap();

    let mut user: Nicknamed = repo.get(&id).await.unwrap().unwrap();
    user.identity.add_role("Ops");
    repo.update_merge(&mut user).await.unwrap();

    let stored: Member = repo.get(&id).await.unwrap().unwrap();
    assert_eq!(stored.display_name.as_deref(), Some("Bob B."));
    assert_eq!(stored.identity.roles, vec!["Ops"]);
}

#[tokio::test]
async fn test_merge_takes_scalars_from_memory() {
    let repo = test_repository(&test_config()).await;
    let mut user = IdentityUser::new("carol");
    user.password_hash = Some("hash".to_string());
    user.security_stamp = Some("stamp-1".to_string());
    repo.insert(&mut user).await.unwrap();

    user.password_hash = None;
    user.security_stamp = Some("stamp-2".to_string());
    repo.update_merge(&mut user).await.unwrap();

    let by_id = Filter::by_id(user.id().unwrap());
    let stored = repo.store().find_one("users", &by_id).await.unwrap().unwrap();
    assert_eq!(stored["passwordHash"], Value::Null);
    assert_eq!(stored["securityStamp"], "stamp-2");
}

#[tokio::test]
async fn test_update_missing_document_is_not_found_without_write() {
    let counting = Arc::new(CountingStore::new(test_backend().await));
    let repo = UserRepository::new(counting.clone(), &test_config());

    let mut ghost = IdentityUser::new("ghost");
    ghost.id = Some("does-not-exist".to_string());
    ghost.add_login(UserLoginInfo::new("google", "abc"));

    let err = repo.update_merge(&mut ghost).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(counting.writes(), 0);
    assert_eq!(counting.count("users", &Filter::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_transient_is_invalid_argument() {
    let repo = test_repository(&test_config()).await;
    let mut user = IdentityUser::new("dave");
    let err = repo.update_merge(&mut user).await.unwrap_err();
    assert!(err.is_invalid_argument());
}

#[tokio::test]
async fn test_last_writer_wins_on_sub_collections() {
    let repo = test_repository(&test_config()).await;
    let mut first = IdentityUser::new("erin");
    repo.insert(&mut first).await.unwrap();
    let mut second = first.clone();

    first.add_role("Admin");
    repo.update_merge(&mut first).await.unwrap();
    second.add_role("Ops");
    repo.update_merge(&mut second).await.unwrap();

    let stored: IdentityUser = repo.get(first.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.roles, vec!["Ops"]);
    assert_eq!(stored.revision, 2);
}

#[tokio::test]
async fn test_optimistic_conflict_then_retry() {
    let config = test_config().with_concurrency(ConcurrencyMode::Optimistic);
    let repo = test_repository(&config).await;
    let mut first = IdentityUser::new("frank");
    repo.insert(&mut first).await.unwrap();
    let mut second = first.clone();

    first.add_role("Admin");
    repo.update_merge(&mut first).await.unwrap();

    second.add_role("Ops");
    let err = repo.update_merge(&mut second).await.unwrap_err();
    assert!(err.is_conflict());

    // Re-fetch and re-apply.
    let mut second: IdentityUser = repo.get(first.id().unwrap()).await.unwrap().unwrap();
    second.add_role("Ops");
    repo.update_merge(&mut second).await.unwrap();

    let stored = repo
        .store()
        .find_one("users", &Filter::by_id(second.id().unwrap()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["roles"], json!(["Admin", "Ops"]));
    assert_eq!(stored["revision"], 2);
}
