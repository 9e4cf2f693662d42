//! Dictionary-like access to the documents of one collection.

use crate::deep_scan::DeepScan;
use crate::deferred::Deferred;
use crate::error::{Error, Result};
use crate::key::{ItemKey, collection_scope, validate_segment};
use crate::model::ScanEntry;
use crate::store::DocumentStore;
use crate::value::Value;

/// A view over the documents of one collection, addressed by item name.
///
/// `store.collection("app/users")?.get("42")` reads the same document as
/// `store.get("app/users/42")`. Enumeration always takes a limit.
#[derive(Clone)]
pub struct Collection {
    store: DocumentStore,
    collection_id: String,
}

impl Collection {
    pub(crate) fn new(store: DocumentStore, key: &str) -> Result<Self> {
        let collection_id = collection_scope(key)?;
        // items of a single-segment collection are not addressable by key
        ItemKey::parse(&collection_id).map_err(|_| {
            Error::InvalidKey(format!(
                "collection '{}' needs at least two segments",
                collection_id
            ))
        })?;
        Ok(Self {
            store,
            collection_id,
        })
    }

    /// The collection's identifier.
    pub fn id(&self) -> &str {
        &self.collection_id
    }

    fn item_key(&self, name: &str) -> Result<String> {
        validate_segment(name)?;
        Ok(format!("{}/{}", self.collection_id, name))
    }

    /// Stores `document` as item `name`, merging into an existing one.
    pub async fn insert(&self, name: &str, document: &Value) -> Result<()> {
        self.store.put(&self.item_key(name)?, document).await
    }

    /// Starts [`insert`](Collection::insert) in the background.
    pub fn insert_deferred(&self, name: &str, document: Value) -> Deferred<()> {
        let store = self.store.clone();
        match self.item_key(name) {
            Ok(key) => self
                .store
                .spawn(async move { store.put(&key, &document).await }),
            Err(err) => self.store.spawn(async move { Err(err) }),
        }
    }

    /// Returns item `name`, or an empty map if absent.
    pub async fn get(&self, name: &str) -> Result<Value> {
        self.store.get(&self.item_key(name)?).await
    }

    /// Deletes item `name`. No-op if absent.
    pub async fn remove(&self, name: &str) -> Result<()> {
        self.store.delete(&self.item_key(name)?).await
    }

    /// Returns the first `limit` item names in order.
    pub async fn keys(&self, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .entries(limit)
            .await?
            .into_iter()
            .map(|entry| entry.item_id)
            .collect())
    }

    /// Returns the first `limit` documents in item order.
    pub async fn values(&self, limit: usize) -> Result<Vec<Value>> {
        Ok(self
            .entries(limit)
            .await?
            .into_iter()
            .map(|entry| entry.document)
            .collect())
    }

    /// Returns the first `limit` items with their documents.
    pub async fn entries(&self, limit: usize) -> Result<Vec<ScanEntry>> {
        let scan = DeepScan::new(self.collection_id.as_str(), limit);
        Ok(self.store.deep_scan_page(&scan).await?.entries)
    }
}
