use account_store::{
    store::{UserClaimStore, UserLifecycleStore},
    user::{Claim, IdentityUser},
};

use crate::helpers::{counting_store, test_store};

#[tokio::test]
async fn test_add_claim_twice_stores_one() {
    let (store, counting) = counting_store().await;
    let mut user = IdentityUser::new("alice");
    store.create(&mut user).await.unwrap();

    store.add_claim(&mut user, Claim::new("role", "admin")).await.unwrap();
    let writes = counting.writes();
    store.add_claim(&mut user, Claim::new("role", "admin")).await.unwrap();
    assert_eq!(counting.writes(), writes);

    let stored = store.find_by_id(user.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(
        store.get_claims(&stored).await.unwrap(),
        vec![Claim::new("role", "admin")]
    );
}

#[tokio::test]
async fn test_remove_claim_removes_every_value_of_the_type() {
    let store = test_store().await;
    let mut user = IdentityUser::new("bob");
    store.create(&mut user).await.unwrap();

    for claim in [
        Claim::new("role", "admin"),
        Claim::new("role", "ops"),
        Claim::new("dept", "eng"),
    ] {
        store.add_claim(&mut user, claim).await.unwrap();
    }

    store
        .remove_claim(&mut user, &Claim::new("role", "admin"))
        .await
        .unwrap();
    assert_eq!(
        store.get_claims(&user).await.unwrap(),
        vec![Claim::new("dept", "eng")]
    );

    let stored = store.find_by_id(user.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(
        store.get_claims(&stored).await.unwrap(),
        vec![Claim::new("dept", "eng")]
    );
}

#[tokio::test]
async fn test_remove_claim_persists_even_without_a_match() {
    let (store, counting) = counting_store().await;
    let mut user = IdentityUser::new("dave");
    store.create(&mut user).await.unwrap();

    user.security_stamp = Some("stamp-2".to_string());
    let writes = counting.writes();
    store
        .remove_claim(&mut user, &Claim::new("dept", "x"))
        .await
        .unwrap();
    assert_eq!(counting.writes(), writes + 1);
    assert_eq!(user.revision, 1);

    let stored = store.find_by_id(user.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.security_stamp.as_deref(), Some("stamp-2"));
}

#[tokio::test]
async fn test_remove_claim_on_deleted_account_is_not_found() {
    let store = test_store().await;
    let mut user = IdentityUser::new("erin");
    store.create(&mut user).await.unwrap();
    store.delete(&user).await.unwrap();

    let err = store
        .remove_claim(&mut user, &Claim::new("dept", "x"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_claim_type_is_required() {
    let store = test_store().await;
    let mut user = IdentityUser::new("carol");
    store.create(&mut user).await.unwrap();

    let err = store.add_claim(&mut user, Claim::new("", "x")).await.unwrap_err();
    assert!(err.is_invalid_argument());
    let err = store
        .remove_claim(&mut user, &Claim::new("", "x"))
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
}
