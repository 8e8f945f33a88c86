use account_store::{
    UserStore,
    store::{UserLifecycleStore, UserLoginStore},
    user::{IdentityUser, UserLoginInfo},
};

use crate::helpers::{counting_store, test_store};

async fn created(store: &UserStore, name: &str) -> IdentityUser {
    let mut user = IdentityUser::new(name);
    store.create(&mut user).await.unwrap();
    user
}

#[tokio::test]
async fn test_add_and_find_by_login() {
    let store = test_store().await;
    let mut alice = created(&store, "alice").await;
    let google = UserLoginInfo::new("google", "abc123");

    store.add_login(&mut alice, google.clone()).await.unwrap();
    assert_eq!(store.get_logins(&alice).await.unwrap(), vec![google.clone()]);

    let found = store.find_by_login(&google).await.unwrap().unwrap();
    assert_eq!(found.id, alice.id);
    assert_eq!(found.logins, vec![google]);

    let missing = store
        .find_by_login(&UserLoginInfo::new("google", "other"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_duplicate_login_is_a_no_op() {
    let (store, counting) = counting_store().await;
    let mut alice = created(&store, "alice").await;
    let login = UserLoginInfo::new("github", "42");

    store.add_login(&mut alice, login.clone()).await.unwrap();
    let writes = counting.writes();

    store.add_login(&mut alice, login.clone()).await.unwrap();
    assert_eq!(counting.writes(), writes);
    assert_eq!(alice.logins.len(), 1);

    let stored = store.find_by_id(alice.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.logins.len(), 1);
}

#[tokio::test]
async fn test_remove_login_persists() {
    let (store, counting) = counting_store().await;
    let mut alice = created(&store, "alice").await;
    let login = UserLoginInfo::new("google", "abc123");
    store.add_login(&mut alice, login.clone()).await.unwrap();

    store.remove_login(&mut alice, &login).await.unwrap();
    assert!(store.find_by_login(&login).await.unwrap().is_none());

    // Removing a login the account does not have writes nothing.
    let writes = counting.writes();
    store.remove_login(&mut alice, &login).await.unwrap();
    assert_eq!(counting.writes(), writes);
}

#[tokio::test]
async fn test_login_arguments_are_required() {
    let store = test_store().await;
    let mut alice = created(&store, "alice").await;

    let err = store
        .add_login(&mut alice, UserLoginInfo::new("", "abc"))
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());

    let err = store
        .find_by_login(&UserLoginInfo::new("google", ""))
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(alice.logins.is_empty());
}
