use std::sync::Mutex;

use mockup_schemes::core::models::{MockupConfig, SavedScheme};
use mockup_schemes::errors::StorageError;
use mockup_schemes::schemes::{SchemeRepository, SchemeStore};
use mockup_schemes::storage::{INDEX_KEY, KeyValueStore, MemoryStore, scheme_key};

/// Memory store that records every write it is asked to perform.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    writes: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    fn clear_writes(&self) {
        self.writes.lock().unwrap().clear();
    }
}

impl KeyValueStore for RecordingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes.lock().unwrap().push(key.to_string());
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

fn scheme(id: &str, name: &str, saved_at: i64) -> SavedScheme {
    SavedScheme {
        id: id.to_string(),
        name: name.to_string(),
        config: MockupConfig::default(),
        saved_at,
    }
}

fn ids(schemes: &[SavedScheme]) -> Vec<&str> {
    schemes.iter().map(|s| s.id.as_str()).collect()
}

#[tokio::test]
async fn add_list_delete_scenario() {
    let repo = SchemeRepository::new(MemoryStore::new());
    assert!(repo.list_schemes().await.is_empty());

    repo.add_scheme(&scheme("a", "First", 1000)).await;
    let listed = repo.list_schemes().await;
    assert_eq!(ids(&listed), ["a"]);
    assert_eq!(listed[0].name, "First");

    repo.add_scheme(&scheme("b", "Second", 2000)).await;
    assert_eq!(ids(&repo.list_schemes().await), ["b", "a"]);

    repo.delete_scheme("a").await;
    assert_eq!(ids(&repo.list_schemes().await), ["b"]);
    assert_eq!(repo.store().get(&scheme_key("a")).unwrap(), None);
}

#[tokio::test]
async fn add_is_idempotent_for_index_membership() {
    let repo = SchemeRepository::new(MemoryStore::new());
    repo.add_scheme(&scheme("a", "First", 1000)).await;
    repo.add_scheme(&scheme("b", "Second", 2000)).await;
    repo.add_scheme(&scheme("a", "First again", 3000)).await;

    let index = repo.store().get(INDEX_KEY).unwrap().unwrap();
    let stored: Vec<String> = serde_json::from_str(&index).unwrap();
    assert_eq!(stored, ["b", "a"]);

    // The blob was still rewritten.
    let listed = repo.list_schemes().await;
    assert_eq!(listed[1].name, "First again");
    assert_eq!(listed[1].saved_at, 3000);
}

#[tokio::test]
async fn delete_of_unknown_id_is_a_noop() {
    let repo = SchemeRepository::new(MemoryStore::new());
    repo.delete_scheme("ghost").await;
    assert!(repo.list_schemes().await.is_empty());

    repo.add_scheme(&scheme("a", "First", 1000)).await;
    repo.delete_scheme("ghost").await;
    assert_eq!(ids(&repo.list_schemes().await), ["a"]);
}

#[tokio::test]
async fn round_trip_keeps_screenshots_and_tags_in_order() {
    let repo = SchemeRepository::new(MemoryStore::new());
    let mut config = MockupConfig::default();
    config.screenshots = vec![
        "data:image/png;base64,AAA".into(),
        "https://example.com/2.png".into(),
        "https://example.com/3.png".into(),
    ];
    config.tags = vec!["Games".into(), "Puzzle".into(), "Offline".into()];
    let original = SavedScheme {
        id: "shots".into(),
        name: "With screenshots".into(),
        config,
        saved_at: 1_700_000_000_123,
    };

    repo.add_scheme(&original).await;
    repo.add_scheme(&scheme("other", "Other", 5)).await;

    let listed = repo.list_schemes().await;
    let found = listed.iter().find(|s| s.id == "shots").unwrap();
    assert_eq!(found.name, original.name);
    assert_eq!(found.saved_at, original.saved_at);
    assert_eq!(found.config.screenshots, original.config.screenshots);
    assert_eq!(found.config.tags, original.config.tags);
}

#[tokio::test]
async fn saved_scheme_is_a_copy_of_the_live_config() {
    let repo = SchemeRepository::new(MemoryStore::new());
    let mut live = MockupConfig::default();
    let saved = SavedScheme::capture("Snapshot", &live);
    repo.add_scheme(&saved).await;

    live.app_name = "Edited later".into();
    live.tags.push("New".into());

    let listed = repo.list_schemes().await;
    assert_eq!(listed[0].config, MockupConfig::default());
}

#[tokio::test]
async fn unchanged_update_performs_no_write() {
    let repo = SchemeRepository::new(RecordingStore::default());
    let s = scheme("a", "First", 1000);
    repo.add_scheme(&s).await;
    repo.store().clear_writes();

    repo.update_scheme(&s).await;
    assert!(repo.store().writes().is_empty());

    let mut renamed = s.clone();
    renamed.name = "Renamed".into();
    repo.update_scheme(&renamed).await;
    assert_eq!(repo.store().writes(), [scheme_key("a")]);
    assert_eq!(repo.list_schemes().await[0].name, "Renamed");
}

#[tokio::test]
async fn update_does_not_touch_the_index() {
    let repo = SchemeRepository::new(RecordingStore::default());
    repo.list_schemes().await;

    repo.update_scheme(&scheme("orphan", "Orphan", 1)).await;
    assert_eq!(repo.store().writes(), [scheme_key("orphan")]);
    // Not listed: membership comes from the index only.
    assert!(repo.list_schemes().await.is_empty());
}

#[tokio::test]
async fn missing_and_corrupt_blobs_are_skipped() {
    let store = MemoryStore::new();
    store
        .set(INDEX_KEY, r#"["a","missing","broken","partial","wrong","b","a"]"#)
        .unwrap();
    store
        .set(&scheme_key("a"), &serde_json::to_string(&scheme("a", "A", 1)).unwrap())
        .unwrap();
    store
        .set(&scheme_key("b"), &serde_json::to_string(&scheme("b", "B", 2)).unwrap())
        .unwrap();
    store.set(&scheme_key("broken"), "{not json").unwrap();
    // Valid JSON, but missing required fields.
    store.set(&scheme_key("partial"), r#"{"id":"partial"}"#).unwrap();
    store
        .set(
            &scheme_key("wrong"),
            &serde_json::to_string(&scheme("someone-else", "X", 3)).unwrap(),
        )
        .unwrap();

    let repo = SchemeRepository::new(store);
    assert_eq!(ids(&repo.list_schemes().await), ["a", "b"]);
}

#[tokio::test]
async fn corrupt_index_lists_nothing_and_add_recovers() {
    let store = MemoryStore::new();
    store.set(INDEX_KEY, "definitely not json").unwrap();
    let repo = SchemeRepository::new(store);

    assert!(repo.list_schemes().await.is_empty());
    repo.delete_scheme("a").await;
    assert_eq!(
        repo.store().get(INDEX_KEY).unwrap().as_deref(),
        Some("definitely not json")
    );

    repo.add_scheme(&scheme("a", "A", 1)).await;
    assert_eq!(ids(&repo.list_schemes().await), ["a"]);
}

#[tokio::test]
async fn save_order_rewrites_only_the_index() {
    let repo = SchemeRepository::new(RecordingStore::default());
    let a = scheme("a", "A", 1);
    let b = scheme("b", "B", 2);
    let c = scheme("c", "C", 3);
    for s in [&a, &b, &c] {
        repo.add_scheme(s).await;
    }
    assert_eq!(ids(&repo.list_schemes().await), ["c", "b", "a"]);
    repo.store().clear_writes();

    repo.save_schemes_order(&[a.clone(), c.clone(), b.clone()]).await;
    assert_eq!(repo.store().writes(), [INDEX_KEY]);
    assert_eq!(ids(&repo.list_schemes().await), ["a", "c", "b"]);
}

#[tokio::test]
async fn unavailable_storage_degrades_to_empty() {
    let repo = SchemeRepository::new(MemoryStore::disabled());
    repo.add_scheme(&scheme("a", "A", 1)).await;
    repo.update_scheme(&scheme("a", "B", 2)).await;
    repo.delete_scheme("a").await;
    repo.save_schemes_order(&[scheme("a", "A", 1)]).await;
    assert!(repo.list_schemes().await.is_empty());
}

#[tokio::test]
async fn quota_failure_keeps_existing_schemes() {
    let store = MemoryStore::with_quota(1200);
    let repo = SchemeRepository::new(store);
    repo.add_scheme(&scheme("a", "A", 1)).await;
    assert_eq!(ids(&repo.list_schemes().await), ["a"]);

    let mut huge = scheme("huge", "Huge", 2);
    huge.config.screenshots = vec!["x".repeat(4096)];
    repo.add_scheme(&huge).await;

    // The blob write failed, so the index never references it.
    assert_eq!(ids(&repo.list_schemes().await), ["a"]);
}
