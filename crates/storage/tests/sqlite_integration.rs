use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteStore;

#[tokio::test]
async fn sqlite_kv_roundtrip_overwrite_and_delete() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    assert_eq!(store.get("tutor_progress_v1").await.unwrap(), None);

    store.set("tutor_progress_v1", "{\"a\":1}").await.unwrap();
    store.set("tutor_progress_v1", "{\"a\":2}").await.unwrap();
    assert_eq!(
        store.get("tutor_progress_v1").await.unwrap().as_deref(),
        Some("{\"a\":2}")
    );

    store.delete("tutor_progress_v1").await.unwrap();
    assert_eq!(store.get("tutor_progress_v1").await.unwrap(), None);
    // deleting twice is fine
    store.delete("tutor_progress_v1").await.unwrap();
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("first migrate");
    store.set("k", "v").await.unwrap();
    store.migrate().await.expect("second migrate");
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn storage_facade_uses_sqlite_backend() {
    let storage = Storage::sqlite("sqlite:file:memdb_kv_facade?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.kv.set("tutor_session_id", "abc").await.unwrap();
    assert_eq!(
        storage.kv.get("tutor_session_id").await.unwrap().as_deref(),
        Some("abc")
    );
}
