//! Core DocumentStore implementation.

use std::future::Future;
use std::sync::Arc;

use common::Storage;
use common::storage::factory::create_storage;
use tokio::runtime::Handle;

use crate::collection::Collection;
use crate::config::{Config, WriteOptions};
use crate::deep_scan::{DeepScan, DocumentIterator};
use crate::deferred::Deferred;
use crate::document::{combine, flatten};
use crate::error::{Error, Result};
use crate::key::{ItemKey, collection_scope};
use crate::model::ScanPage;
use crate::serde::{RowKey, encode_value, item_bounds_range, item_range};
use crate::storage::{DocumentStorage, RowBatch};
use crate::value::Value;

/// A hierarchical document store.
///
/// Documents are addressed by slash-separated keys: `app/users/42` is the
/// document `42` of the collection `app/users`. Each document is stored as one
/// row per leaf, so writes merge into existing documents unless
/// [`WriteOptions::overwrite`] is set.
///
/// `DocumentStore` is cheap to clone; clones share the same storage.
///
/// # Example
///
/// ```ignore
/// use docstore::{Config, DeepScan, DocumentStore, Value};
/// use serde_json::json;
///
/// let store = DocumentStore::open(Config::default()).await?;
///
/// store.put("app/users/42", &Value::from(json!({"name": "Alice"}))).await?;
/// let user = store.get("app/users/42").await?;
///
/// let page = store.deep_scan_page(&DeepScan::new("app/users", 100)).await?;
/// for entry in page.entries {
///     println!("{}: {:?}", entry.item_id, entry.document);
/// }
/// ```
#[derive(Clone)]
pub struct DocumentStore {
    storage: DocumentStorage,
    rows_per_item: usize,
    runtime: Handle,
}

impl DocumentStore {
    /// Opens a document store with the given configuration.
    ///
    /// Deferred operations run on the runtime this is called from.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be initialized.
    pub async fn open(config: Config) -> Result<Self> {
        let storage = create_storage(&config.storage).await?;
        Self::new(storage, config)
    }

    /// Creates a document store over an existing storage.
    ///
    /// The storage section of `config` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] when called outside of a tokio runtime.
    pub fn new(storage: Arc<dyn Storage>, config: Config) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Internal(format!("no tokio runtime available: {}", e)))?;
        Ok(Self {
            storage: DocumentStorage::new(storage),
            rows_per_item: config.rows_per_item,
            runtime,
        })
    }

    /// Stores `document` under `key`, merging it into any existing document.
    ///
    /// Leaves of the existing document that `document` does not contain are
    /// kept. Use [`put_with_options`] with `overwrite` to replace it instead.
    ///
    /// [`put_with_options`]: DocumentStore::put_with_options
    pub async fn put(&self, key: &str, document: &Value) -> Result<()> {
        self.put_with_options(key, document, WriteOptions::default())
            .await
    }

    /// Stores `document` under `key` with custom options.
    ///
    /// Every leaf is encoded before anything is written, so a document that
    /// cannot be represented leaves the store untouched. All rows, and with
    /// `overwrite` the deletion of whatever rows the item has when the batch
    /// lands, are applied as one atomic batch.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidKey`] if `key` is not an item key.
    /// - [`Error::Serialization`] if a leaf or map key cannot be stored.
    /// - Storage errors from the backend.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(key = %key, overwrite = options.overwrite, rows = tracing::field::Empty)
    )]
    pub async fn put_with_options(
        &self,
        key: &str,
        document: &Value,
        options: WriteOptions,
    ) -> Result<()> {
        let item = ItemKey::parse(key)?;

        let mut rows = Vec::new();
        for pair in flatten(document) {
            let (path, leaf) = pair?;
            let row_key = RowKey::new(item.collection_id.as_str(), item.item_id.as_str(), path);
            rows.push((row_key.encode(), encode_value(leaf)?));
        }
        tracing::Span::current().record("rows", rows.len());

        let mut batch = RowBatch::new();
        if options.overwrite {
            batch.delete_range(item_range(&item.collection_id, &item.item_id));
        }
        for (row_key, value) in rows {
            batch.put(row_key, value);
        }

        self.storage.apply(batch, &options).await
    }

    /// Deletes the document under `key`. No-op if there is none.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.delete_with_options(key, WriteOptions::default()).await
    }

    /// Deletes the document under `key` with custom options.
    ///
    /// Every row of the document present when the batch is applied is
    /// removed. The `overwrite` option has no effect.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key))]
    pub async fn delete_with_options(&self, key: &str, options: WriteOptions) -> Result<()> {
        let item = ItemKey::parse(key)?;

        let mut batch = RowBatch::new();
        batch.delete_range(item_range(&item.collection_id, &item.item_id));
        tracing::debug!(
            collection_id = %item.collection_id,
            item_id = %item.item_id,
            "deleting document"
        );

        self.storage.apply(batch, &options).await
    }

    /// Returns the document under `key`, or an empty map if there is none.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key))]
    pub async fn get(&self, key: &str) -> Result<Value> {
        let item = ItemKey::parse(key)?;
        let pairs = self
            .storage
            .select_item(&item.collection_id, &item.item_id)
            .await?;
        Ok(combine(pairs))
    }

    /// Same as [`get`](DocumentStore::get).
    pub async fn scan(&self, key: &str) -> Result<Value> {
        self.get(key).await
    }

    /// Starts a deep scan over the items of a collection.
    ///
    /// Rows are read lazily as the returned iterator is advanced. At most
    /// `limit * rows_per_item` rows are read; an item cut short by that cap is
    /// not returned.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidKey`] if the scan key names no collection.
    /// - [`Error::InvalidInput`] if the limit or `rows_per_item` is zero.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(key = %scan.key(), limit = scan.limit())
    )]
    pub async fn deep_scan(&self, scan: &DeepScan) -> Result<DocumentIterator> {
        if scan.limit() == 0 {
            return Err(Error::InvalidInput(
                "deep scan limit must be at least 1".to_string(),
            ));
        }
        if self.rows_per_item == 0 {
            return Err(Error::InvalidInput(
                "rows_per_item must be at least 1".to_string(),
            ));
        }

        let collection_id = collection_scope(scan.key())?;
        let range = item_bounds_range(&collection_id, scan.lower_bound(), scan.upper_bound());
        let row_cap = scan.limit().saturating_mul(self.rows_per_item);
        let rows = self.storage.select_range(range, row_cap).await?;

        Ok(DocumentIterator::new(rows, scan.limit()))
    }

    /// Runs a deep scan and collects one page of results.
    ///
    /// [`ScanPage::next`] holds the scan for the following page, if there may
    /// be one.
    pub async fn deep_scan_page(&self, scan: &DeepScan) -> Result<ScanPage> {
        self.deep_scan(scan).await?.into_page(scan).await
    }

    /// Returns a dictionary-like view over the collection named by `key`.
    pub fn collection(&self, key: &str) -> Result<Collection> {
        Collection::new(self.clone(), key)
    }

    /// Starts [`put`](DocumentStore::put) in the background.
    pub fn put_deferred(&self, key: impl Into<String>, document: Value) -> Deferred<()> {
        let key = key.into();
        let store = self.clone();
        self.spawn(async move { store.put(&key, &document).await })
    }

    /// Starts [`delete`](DocumentStore::delete) in the background.
    pub fn delete_deferred(&self, key: impl Into<String>) -> Deferred<()> {
        let key = key.into();
        let store = self.clone();
        self.spawn(async move { store.delete(&key).await })
    }

    /// Starts [`get`](DocumentStore::get) in the background.
    pub fn get_deferred(&self, key: impl Into<String>) -> Deferred<Value> {
        let key = key.into();
        let store = self.clone();
        self.spawn(async move { store.get(&key).await })
    }

    /// Same as [`get_deferred`](DocumentStore::get_deferred).
    pub fn scan_deferred(&self, key: impl Into<String>) -> Deferred<Value> {
        self.get_deferred(key)
    }

    /// Starts [`deep_scan_page`](DocumentStore::deep_scan_page) in the
    /// background.
    pub fn deep_scan_deferred(&self, scan: DeepScan) -> Deferred<ScanPage> {
        let store = self.clone();
        self.spawn(async move { store.deep_scan_page(&scan).await })
    }

    pub(crate) fn spawn<T, F>(&self, operation: F) -> Deferred<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Deferred::spawn(&self.runtime, operation)
    }

    /// Flushes pending writes to durable storage.
    pub async fn flush(&self) -> Result<()> {
        self.storage.flush().await
    }

    /// Closes the store, releasing resources.
    ///
    /// Clones of this store must not be used afterwards.
    pub async fn close(self) -> Result<()> {
        self.storage.close().await
    }
}
