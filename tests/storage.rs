//! Storage engine integration tests.

use std::time::Duration;

use trellis::{FileStorage, MemoryStorage, Storage};

#[tokio::test]
async fn value_exists_until_its_ttl_passes() {
    let storage = MemoryStorage::new();
    storage
        .set("foo", b"bar", Some(Duration::from_secs(1)))
        .await
        .unwrap();
    assert!(storage.exists("foo").await.unwrap());

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(!storage.exists("foo").await.unwrap());
    assert_eq!(storage.get("foo", None).await.unwrap(), None);
}

#[tokio::test]
async fn renewal_slides_the_expiry_forward() {
    let storage = MemoryStorage::new();
    storage
        .set("foo", b"bar", Some(Duration::from_secs(2)))
        .await
        .unwrap();

    let value = storage
        .get("foo", Some(Duration::from_secs(10)))
        .await
        .unwrap();
    assert_eq!(value, Some(b"bar".to_vec()));

    let remaining = storage.expires_in("foo").await.unwrap().unwrap().as_secs();
    assert!((9..=10).contains(&remaining), "remaining was {remaining}");
}

#[tokio::test]
async fn expires_in_reports_remaining_lifetime() {
    let storage = MemoryStorage::new();
    storage
        .set("foo", b"bar", Some(Duration::from_secs(60)))
        .await
        .unwrap();
    let remaining = storage.expires_in("foo").await.unwrap().unwrap().as_secs();
    assert!((58..=60).contains(&remaining));

    storage.set("eternal", b"x", None).await.unwrap();
    assert_eq!(storage.expires_in("eternal").await.unwrap(), None);
}

#[tokio::test]
async fn concurrent_writers_do_not_corrupt_the_store() {
    let storage = MemoryStorage::new();
    let mut tasks = Vec::new();
    for i in 0..32 {
        let storage = storage.clone();
        tasks.push(tokio::spawn(async move {
            let key = format!("key-{i}");
            storage.set(&key, key.as_bytes(), None).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    for i in 0..32 {
        let key = format!("key-{i}");
        assert_eq!(
            storage.get(&key, None).await.unwrap(),
            Some(key.as_bytes().to_vec())
        );
    }
}

#[tokio::test]
async fn file_storage_round_trips_values() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());

    storage.set("foo/bar baz", b"payload", None).await.unwrap();
    assert_eq!(
        storage.get("foo/bar baz", None).await.unwrap(),
        Some(b"payload".to_vec())
    );
    assert!(storage.exists("foo/bar baz").await.unwrap());

    storage.delete("foo/bar baz").await.unwrap();
    assert!(!storage.exists("foo/bar baz").await.unwrap());
}

#[tokio::test]
async fn file_storage_evicts_expired_entries() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());

    storage
        .set("foo", b"bar", Some(Duration::from_secs(1)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(storage.get("foo", None).await.unwrap(), None);

    // The lazy eviction removed the envelope file as well.
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn delete_all_empties_both_backends() {
    let memory = MemoryStorage::new();
    memory.set("a", b"1", None).await.unwrap();
    memory.set("b", b"2", None).await.unwrap();
    memory.delete_all().await.unwrap();
    assert!(!memory.exists("a").await.unwrap());

    let dir = tempfile::tempdir().unwrap();
    let files = FileStorage::new(dir.path());
    files.set("a", b"1", None).await.unwrap();
    files.delete_all().await.unwrap();
    assert!(!files.exists("a").await.unwrap());
}

#[tokio::test]
async fn deleting_a_missing_key_is_a_noop() {
    let storage = MemoryStorage::new();
    storage.delete("missing").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let files = FileStorage::new(dir.path());
    files.delete("missing").await.unwrap();
}
