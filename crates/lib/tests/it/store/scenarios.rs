//! End-to-end flows across capability groups.

use account_store::{
    config::ConcurrencyMode,
    store::{UserClaimStore, UserLifecycleStore, UserLoginStore},
    user::{Claim, IdentityUser, UserLoginInfo},
};

use crate::helpers::{test_config, test_store, test_store_with};

#[tokio::test]
async fn test_alice_end_to_end() {
    let store = test_store().await;

    let mut alice = IdentityUser::new("alice");
    store.create(&mut alice).await.unwrap();
    let id = alice.id().unwrap().to_string();
    assert!(!id.is_empty());

    let google = UserLoginInfo::new("google", "abc123");
    store.add_login(&mut alice, google.clone()).await.unwrap();

    let mut found = store.find_by_login(&google).await.unwrap().unwrap();
    assert_eq!(found.id.as_deref(), Some(id.as_str()));
    assert_eq!(found.user_name, "alice");

    store
        .add_claim(&mut found, Claim::new("dept", "eng"))
        .await
        .unwrap();

    let fetched = store.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(
        store.get_claims(&fetched).await.unwrap(),
        vec![Claim::new("dept", "eng")]
    );
    assert_eq!(fetched.logins, vec![google]);

    store.delete(&fetched).await.unwrap();
    assert!(store.find_by_id(&id).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claim_updates_keep_at_least_one() {
    let store = test_store().await;
    let mut user = IdentityUser::new("bob");
    store.create(&mut user).await.unwrap();

    let mut left = user.clone();
    let mut right = user.clone();
    let (a, b) = tokio::join!(
        store.add_claim(&mut left, Claim::new("dept", "eng")),
        store.add_claim(&mut right, Claim::new("team", "core")),
    );
    a.unwrap();
    b.unwrap();

    let stored = store.find_by_id(user.id().unwrap()).await.unwrap().unwrap();
    let claims = store.get_claims(&stored).await.unwrap();
    assert!(!claims.is_empty());
    assert!(claims.len() <= 2);
    assert!(claims.iter().all(|c| {
        *c == Claim::new("dept", "eng") || *c == Claim::new("team", "core")
    }));
    assert!((1..=2).contains(&stored.revision));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_optimistic_updates_never_lose_silently() {
    let store = test_store_with(test_config().with_concurrency(ConcurrencyMode::Optimistic)).await;
    let mut user = IdentityUser::new("carol");
    store.create(&mut user).await.unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            let mut copy = user.clone();
            tokio::spawn(async move {
                store
                    .add_claim(&mut copy, Claim::new("slot", i.to_string()))
                    .await
            })
        })
        .collect();

    let mut succeeded = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(err) => assert!(err.is_conflict(), "unexpected error: {err}"),
        }
    }

    // Exactly one writer wins the compare-and-swap; the others get a conflict.
    let stored = store.find_by_id(user.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(succeeded, 1);
    assert_eq!(stored.claims.len(), 1);
    assert_eq!(stored.revision, 1);
}
