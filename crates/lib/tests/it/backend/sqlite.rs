//! SQLite-specific behavior: opening by connection string and file databases.

use account_store::{
    backend::{self, DocumentStore, Filter, database::Sqlite},
    config::ConnectionString,
};
use serde_json::json;

#[tokio::test]
async fn test_open_in_memory_by_connection_string() {
    let connection = ConnectionString::parse("sqlite:///accounts?mode=memory").unwrap();
    let store = backend::open(&connection).await.unwrap();
    assert_eq!(store.database_name(), "accounts");
    assert!(store.as_any().downcast_ref::<Sqlite>().is_some());

    let id = store
        .insert_one("users", json!({"userName": "alice"}).as_object().cloned().unwrap())
        .await
        .unwrap();
    assert!(store.find_one("users", &Filter::by_id(&id)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_open_file_by_connection_string() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.db");
    let connection = ConnectionString::parse(&format!("sqlite://{}", path.display())).unwrap();
    assert_eq!(connection.database(), "accounts");

    let store = backend::open(&connection).await.unwrap();
    store.create_unique_index("users", "userName").await.unwrap();
    store
        .insert_one("users", json!({"userName": "alice"}).as_object().cloned().unwrap())
        .await
        .unwrap();
    store.close().await.unwrap();
    assert!(path.exists());

    let reopened = backend::open(&connection).await.unwrap();
    assert_eq!(reopened.count("users", &Filter::all()).await.unwrap(), 1);
    let err = reopened
        .insert_one("users", json!({"userName": "alice"}).as_object().cloned().unwrap())
        .await
        .unwrap_err();
    assert!(err.is_constraint_violation());
}

#[tokio::test]
async fn test_closed_pool_is_unavailable() {
    let store = Sqlite::in_memory("accounts").await.unwrap();
    store.close().await.unwrap();
    let err = store.count("users", &Filter::all()).await.unwrap_err();
    assert!(err.is_store_unavailable());
}
