//! DocumentStore contract tests, run against the backend chosen by TEST_BACKEND.

use account_store::backend::{Document, Filter};
use serde_json::{Value, json};

use crate::helpers::test_backend;

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_insert_and_find_in_insertion_order() {
    let store = test_backend().await;
    let mut ids = Vec::new();
    for name in ["alice", "bob", "carol"] {
        ids.push(
            store
                .insert_one("users", doc(json!({"userName": name})))
                .await
                .unwrap(),
        );
    }

    let all = store.find_many("users", &Filter::all(), None).await.unwrap();
    let names: Vec<_> = all.iter().map(|d| d["userName"].clone()).collect();
    assert_eq!(names, vec![json!("alice"), json!("bob"), json!("carol")]);
    assert_eq!(all[1]["id"], json!(ids[1]));

    let first_two = store.find_many("users", &Filter::all(), Some(2)).await.unwrap();
    assert_eq!(first_two.len(), 2);
}

#[tokio::test]
async fn test_find_in_empty_collection() {
    let store = test_backend().await;
    assert!(store.find_one("users", &Filter::all()).await.unwrap().is_none());
    assert_eq!(store.count("users", &Filter::all()).await.unwrap(), 0);
    assert_eq!(store.delete_many("users", &Filter::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_login_elem_match() {
    let store = test_backend().await;
    store
        .insert_one(
            "users",
            doc(json!({
                "userName": "alice",
                "logins": [
                    {"loginProvider": "google", "providerKey": "abc123"},
                    {"loginProvider": "github", "providerKey": "xyz"}
                ]
            })),
        )
        .await
        .unwrap();
    store
        .insert_one(
            "users",
            doc(json!({
                "userName": "bob",
                "logins": [{"loginProvider": "google", "providerKey": "xyz"}]
            })),
        )
        .await
        .unwrap();

    let login = |provider: &str, key: &str| {
        Filter::elem_match(
            "logins",
            Filter::eq("loginProvider", provider).and(Filter::eq("providerKey", key)),
        )
    };

    let found = store.find_one("users", &login("google", "xyz")).await.unwrap();
    assert_eq!(found.unwrap()["userName"], "bob");
    let found = store.find_one("users", &login("github", "xyz")).await.unwrap();
    assert_eq!(found.unwrap()["userName"], "alice");
    assert!(store.find_one("users", &login("github", "abc123")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_null_and_missing_fields_match_null() {
    let store = test_backend().await;
    store
        .insert_one("users", doc(json!({"userName": "a", "passwordHash": null})))
        .await
        .unwrap();
    store.insert_one("users", doc(json!({"userName": "b"}))).await.unwrap();
    store
        .insert_one("users", doc(json!({"userName": "c", "passwordHash": "h"})))
        .await
        .unwrap();

    assert_eq!(
        store.count("users", &Filter::eq("passwordHash", Value::Null)).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn test_revision_compare_and_swap() {
    let store = test_backend().await;
    let id = store
        .insert_one("users", doc(json!({"userName": "alice", "revision": 0})))
        .await
        .unwrap();

    let cas = |revision: u64| Filter::by_id(&id).and(Filter::eq("revision", revision));
    let replaced = store
        .replace_one("users", &cas(0), doc(json!({"userName": "alice", "revision": 1})))
        .await
        .unwrap();
    assert_eq!(replaced, 1);

    // The same expected revision no longer matches.
    let replaced = store
        .replace_one("users", &cas(0), doc(json!({"userName": "mallory", "revision": 1})))
        .await
        .unwrap();
    assert_eq!(replaced, 0);

    let stored = store.find_one("users", &Filter::by_id(&id)).await.unwrap().unwrap();
    assert_eq!(stored["userName"], "alice");
    assert_eq!(stored["revision"], 1);
}

#[tokio::test]
async fn test_unique_user_names() {
    let store = test_backend().await;
    store.create_unique_index("users", "userName").await.unwrap();
    store.create_unique_index("users", "userName").await.unwrap();

    store.insert_one("users", doc(json!({"userName": "alice"}))).await.unwrap();
    let err = store
        .insert_one("users", doc(json!({"userName": "alice"})))
        .await
        .unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(store.count("users", &Filter::all()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_collection_name() {
    let store = test_backend().await;
    let err = store
        .find_many("users\"; DROP TABLE users; --", &Filter::all(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        account_store::Error::Backend(account_store::backend::BackendError::InvalidName { .. })
    ));
}
