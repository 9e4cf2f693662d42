use std::sync::Arc;

use common::storage::in_memory::{FailingStorage, InMemoryStorage};
use common::{StorageConfig, StorageError};
use docstore::{Config, DeepScan, DocumentStore, Error, ScanEntry, Value, WriteOptions};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn open_store() -> DocumentStore {
    init_tracing();
    DocumentStore::open(Config::default()).await.unwrap()
}

async fn collect_pages(store: &DocumentStore, first: DeepScan) -> Vec<Vec<ScanEntry>> {
    let mut pages = Vec::new();
    let mut scan = Some(first);
    while let Some(current) = scan {
        let page = store.deep_scan_page(&current).await.unwrap();
        pages.push(page.entries);
        scan = page.next;
    }
    pages
}

#[tokio::test]
async fn should_store_and_read_nested_document() {
    // given
    let store = open_store().await;
    let user = Value::from(json!({"name": "Alice", "address": {"city": "NY"}}));

    // when
    store.put("app/users/42", &user).await.unwrap();

    // then
    assert_eq!(store.get("app/users/42").await.unwrap(), user);
    let page = store
        .deep_scan_page(&DeepScan::new("app/users", 10))
        .await
        .unwrap();
    assert_eq!(page.entries.len(), 1);
    assert_eq!(page.entries[0].item_id, "42");
    assert_eq!(page.entries[0].document, user);
}

#[tokio::test]
async fn should_paginate_without_gaps_or_overlap() {
    // given
    let store = open_store().await;
    for i in 0..25 {
        store
            .put(
                &format!("app/items/{:02}", i),
                &Value::from(json!({"i": i, "tags": ["x"], "meta": {"even": i % 2 == 0}})),
            )
            .await
            .unwrap();
    }

    // when
    let pages = collect_pages(&store, DeepScan::new("app/items", 10)).await;

    // then
    let sizes: Vec<_> = pages.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![10, 10, 5]);
    let items: Vec<String> = pages.into_iter().flatten().map(|e| e.item_id).collect();
    let expected: Vec<String> = (0..25).map(|i| format!("{:02}", i)).collect();
    assert_eq!(items, expected);
}

#[tokio::test]
async fn should_paginate_within_bounds() {
    // given
    let store = open_store().await;
    for name in ["a", "b", "c", "d", "e", "f"] {
        store
            .put(&format!("app/letters/{}", name), &Value::from(name))
            .await
            .unwrap();
    }

    // when
    let pages = collect_pages(&store, DeepScan::new("app/letters", 2).gt("a").lte("e")).await;

    // then
    let items: Vec<String> = pages.into_iter().flatten().map(|e| e.item_id).collect();
    assert_eq!(items, vec!["b", "c", "d", "e"]);
}

#[tokio::test]
async fn should_paginate_past_items_wider_than_row_budget() {
    // given
    init_tracing();
    let config = Config {
        rows_per_item: 2,
        ..Config::default()
    };
    let store = DocumentStore::open(config).await.unwrap();
    store.put("app/w/a", &Value::from(json!({"x": 1}))).await.unwrap();
    store
        .put("app/w/b", &Value::from(json!({"p": 1, "q": 2, "r": 3, "s": 4})))
        .await
        .unwrap();
    store.put("app/w/c", &Value::from(json!({"x": 3}))).await.unwrap();

    // when
    let pages = collect_pages(&store, DeepScan::new("app/w", 2)).await;

    // then
    let items: Vec<String> = pages.into_iter().flatten().map(|e| e.item_id).collect();
    assert_eq!(items, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn should_continue_streamed_scan_after_row_cap() {
    // given
    init_tracing();
    let config = Config {
        rows_per_item: 1,
        ..Config::default()
    };
    let store = DocumentStore::open(config).await.unwrap();
    store.put("app/s/a", &Value::from(json!({"x": 1}))).await.unwrap();
    store
        .put("app/s/b", &Value::from(json!({"p": 1, "q": 2})))
        .await
        .unwrap();
    store.put("app/s/c", &Value::from(json!({"x": 3}))).await.unwrap();

    // when
    let mut items = Vec::new();
    let mut truncations = Vec::new();
    let mut scan = Some(DeepScan::new("app/s", 2));
    while let Some(current) = scan {
        let mut iter = store.deep_scan(&current).await.unwrap();
        while let Some(entry) = iter.next().await.unwrap() {
            items.push(entry.item_id);
        }
        truncations.push(iter.truncated());
        scan = iter.next_scan(&current);
    }

    // then
    assert_eq!(items, vec!["a", "b", "c"]);
    assert_eq!(truncations, vec![true, true, false]);
}

#[tokio::test]
async fn should_offer_next_scan_only_when_more_may_follow() {
    // given
    let store = open_store().await;
    for name in ["a", "b", "c"] {
        store
            .put(&format!("app/n/{}", name), &Value::from(1))
            .await
            .unwrap();
    }
    let scan = DeepScan::new("app/n", 2);

    // when
    let mut partial = store.deep_scan(&scan).await.unwrap();
    let before_any = partial.next_scan(&scan);
    partial.next().await.unwrap();
    let after_one = partial.next_scan(&scan);
    partial.next().await.unwrap();
    let after_full_page = partial.next_scan(&scan);

    // then
    assert!(before_any.is_none());
    assert!(after_one.is_none());
    let next = after_full_page.unwrap();
    let mut rest = store.deep_scan(&next).await.unwrap();
    let last = rest.next().await.unwrap().unwrap();
    assert_eq!(last.item_id, "c");
    assert!(rest.next().await.unwrap().is_none());
    assert!(rest.next_scan(&next).is_none());
}

#[tokio::test]
async fn should_not_return_collection_root_document() {
    // given
    let store = open_store().await;
    store
        .put("app/users", &Value::from(json!({"count": 1})))
        .await
        .unwrap();
    store
        .put("app/users/1", &Value::from(json!({"name": "Alice"})))
        .await
        .unwrap();

    // when
    let page = store
        .deep_scan_page(&DeepScan::new("app/users/", 10).gte(""))
        .await
        .unwrap();

    // then
    let items: Vec<_> = page.entries.iter().map(|e| e.item_id.as_str()).collect();
    assert_eq!(items, vec!["1"]);
    assert_eq!(
        store.get("app/users").await.unwrap(),
        Value::from(json!({"count": 1}))
    );
}

#[tokio::test]
async fn should_leave_no_residual_leaves_after_overwrite() {
    // given
    let store = open_store().await;
    let key = "app/docs/1";
    store
        .put(key, &Value::from(json!({"a": {"b": {"c": 1}}, "d": [1, 2], "e": "x"})))
        .await
        .unwrap();

    // when
    let replacement = Value::from(json!({"a": 5}));
    store
        .put_with_options(key, &replacement, WriteOptions::overwrite())
        .await
        .unwrap();

    // then
    assert_eq!(store.get(key).await.unwrap(), replacement);
}

#[tokio::test]
async fn should_read_back_normalized_timestamps() {
    // given
    let store = open_store().await;
    let at = chrono::DateTime::parse_from_rfc3339("2024-06-01T12:00:00+02:00").unwrap();
    let document: Value = [("at", Value::from(at)), ("n", Value::from(1))]
        .into_iter()
        .collect();

    // when
    store.put("app/events/1", &document).await.unwrap();

    // then
    assert_eq!(
        store.get("app/events/1").await.unwrap(),
        Value::from(json!({"at": "2024-06-01T10:00:00Z", "n": 1}))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn should_wait_on_deferred_operations_from_blocking_thread() {
    // given
    let store = open_store().await;
    let worker = store.clone();

    // when
    let document = tokio::task::spawn_blocking(move || {
        worker
            .put_deferred("app/users/1", Value::from(json!({"name": "Alice"})))
            .wait()?;
        worker.get_deferred("app/users/1").wait()
    })
    .await
    .unwrap()
    .unwrap();

    // then
    assert_eq!(document, Value::from(json!({"name": "Alice"})));
}

#[tokio::test]
async fn should_surface_unavailable_storage_on_write() {
    // given
    init_tracing();
    let storage = FailingStorage::wrap(Arc::new(InMemoryStorage::new()));
    let store = DocumentStore::new(storage.clone(), Config::default()).unwrap();
    storage.fail_apply(StorageError::Unavailable("connection refused".to_string()));

    // when
    let result = store.put("app/users/1", &Value::from(1)).await;

    // then
    assert!(matches!(result, Err(Error::Unavailable(_))));
}

#[tokio::test]
async fn should_surface_storage_failure_on_read() {
    // given
    init_tracing();
    let storage = FailingStorage::wrap(Arc::new(InMemoryStorage::new()));
    let store = DocumentStore::new(storage.clone(), Config::default()).unwrap();
    storage.fail_scan(StorageError::Storage("disk error".to_string()));

    // when
    let get = store.get("app/users/1").await;
    let scan = store.deep_scan(&DeepScan::new("app/users", 1)).await;

    // then
    assert_eq!(get, Err(Error::Storage("disk error".to_string())));
    assert!(matches!(scan, Err(Error::Storage(_))));
}

#[tokio::test]
async fn should_read_again_once_storage_recovers() {
    // given
    init_tracing();
    let storage = FailingStorage::wrap(Arc::new(InMemoryStorage::new()));
    let store = DocumentStore::new(storage.clone(), Config::default()).unwrap();
    let document = Value::from(json!({"name": "Alice"}));
    store.put("app/users/1", &document).await.unwrap();
    storage.fail_scan(StorageError::Unavailable("connection reset".to_string()));
    storage.fail_apply(StorageError::Unavailable("connection reset".to_string()));
    assert!(matches!(store.get("app/users/1").await, Err(Error::Unavailable(_))));

    // when
    storage.clear();

    // then
    assert_eq!(store.get("app/users/1").await.unwrap(), document);
    store.delete("app/users/1").await.unwrap();
    assert_eq!(store.get("app/users/1").await.unwrap(), Value::empty_map());
}

#[tokio::test]
async fn should_keep_previous_document_when_overwrite_fails() {
    // given
    init_tracing();
    let storage = FailingStorage::wrap(Arc::new(InMemoryStorage::new()));
    let store = DocumentStore::new(storage.clone(), Config::default()).unwrap();
    let original = Value::from(json!({"a": 1, "b": 2}));
    store.put("app/docs/1", &original).await.unwrap();
    storage.fail_apply_once(StorageError::Storage("write rejected".to_string()));

    // when
    let failed = store
        .put_with_options("app/docs/1", &Value::from(json!({"c": 3})), WriteOptions::overwrite())
        .await;

    // then
    assert!(matches!(failed, Err(Error::Storage(_))));
    assert_eq!(store.get("app/docs/1").await.unwrap(), original);
}

#[tokio::test]
async fn should_open_store_from_toml_config() {
    // given
    init_tracing();
    let config: Config = toml::from_str(
        r#"
        rows_per_item = 8

        [storage]
        type = "InMemory"
        "#,
    )
    .unwrap();

    // when
    let store = DocumentStore::open(config).await.unwrap();
    store.put("app/cfg/1", &Value::from(true)).await.unwrap();

    // then
    assert_eq!(store.get("app/cfg/1").await.unwrap(), Value::Bool(true));
    store.flush().await.unwrap();
    store.close().await.unwrap();
}

#[cfg(not(feature = "slatedb"))]
#[tokio::test]
async fn should_fail_to_open_slatedb_without_feature() {
    // given
    let config: Config = toml::from_str(
        r#"
        [storage]
        type = "SlateDb"
        path = "docs"
        object_store = { type = "InMemory" }
        "#,
    )
    .unwrap();
    assert!(matches!(config.storage, StorageConfig::SlateDb(_)));

    // when
    let result = DocumentStore::open(config).await;

    // then
    assert!(matches!(result, Err(Error::Storage(_))));
}
