use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use super::{RecordOp, Storage, WriteOptions};
use crate::{BytesRange, Record, StorageError, StorageIterator, StorageRead, StorageResult};

/// In-memory implementation of the Storage trait using a BTreeMap.
///
/// All data lives in memory, which makes it suitable for tests or scenarios
/// where durability is not required. Batches are applied under a single
/// write lock, so they are atomic with respect to readers.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    data: Arc<RwLock<BTreeMap<Bytes, Bytes>>>,
}

impl InMemoryStorage {
    /// Creates a new InMemoryStorage instance with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records currently stored.
    pub fn len(&self) -> StorageResult<usize> {
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::Internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(data.len())
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl StorageRead for InMemoryStorage {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>> {
        // BTreeMap::range panics on inverted bounds
        if range.is_empty() {
            return Ok(Box::new(InMemoryIterator {
                records: Vec::new().into_iter(),
            }));
        }

        let data = self
            .data
            .read()
            .map_err(|e| StorageError::Internal(format!("Failed to acquire read lock: {}", e)))?;

        let records: Vec<Record> = data
            .range((range.start, range.end))
            .map(|(k, v)| Record::new(k.clone(), v.clone()))
            .collect();

        Ok(Box::new(InMemoryIterator {
            records: records.into_iter(),
        }))
    }
}

/// Iterator over a point-in-time copy of the scanned records.
struct InMemoryIterator {
    records: std::vec::IntoIter<Record>,
}

#[async_trait]
impl StorageIterator for InMemoryIterator {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn next(&mut self) -> StorageResult<Option<Record>> {
        Ok(self.records.next())
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    /// Applies the batch under one write lock acquisition. Write options are
    /// ignored since there is no durable storage to await.
    async fn apply_with_options(
        &self,
        ops: Vec<RecordOp>,
        _options: WriteOptions,
    ) -> StorageResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::Internal(format!("Failed to acquire write lock: {}", e)))?;

        for op in ops {
            match op {
                RecordOp::Put(record) => {
                    data.insert(record.key, record.value);
                }
                RecordOp::Delete(key) => {
                    data.remove(&key);
                }
                RecordOp::DeleteRange(range) => {
                    // BTreeMap::range panics on inverted bounds
                    if range.is_empty() {
                        continue;
                    }
                    let doomed: Vec<Bytes> = data
                        .range((range.start, range.end))
                        .map(|(k, _)| k.clone())
                        .collect();
                    for key in doomed {
                        data.remove(&key);
                    }
                }
            }
        }

        Ok(())
    }

    async fn flush(&self) -> StorageResult<()> {
        // all writes are immediately visible
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Injected failure that fires either once or on every call.
#[cfg(feature = "test-utils")]
#[derive(Clone)]
enum Failure {
    /// Error is returned once, then automatically cleared.
    Once(StorageError),
    /// Error is returned on every subsequent call until explicitly cleared.
    Persistent(StorageError),
}

#[cfg(feature = "test-utils")]
type FailSlot = arc_swap::ArcSwap<Option<Failure>>;

/// Checks a [`FailSlot`] and returns an error if one is set.
///
/// For [`Failure::Once`], the slot is atomically swapped to `None` so the
/// error fires exactly once.
#[cfg(feature = "test-utils")]
fn check_failure(slot: &FailSlot) -> StorageResult<()> {
    let guard = slot.load();
    match guard.as_ref() {
        None => Ok(()),
        Some(Failure::Persistent(err)) => Err(err.clone()),
        Some(Failure::Once(_)) => {
            let prev = slot.swap(Arc::new(None));
            match prev.as_ref() {
                Some(Failure::Once(err)) => Err(err.clone()),
                _ => Ok(()),
            }
        }
    }
}

/// A storage wrapper that delegates to an inner [`Storage`] but can inject
/// failures into `apply`/`apply_with_options` and `scan_iter` on demand.
///
/// Failures can be *persistent* (returned on every call until cleared) or
/// *once* (returned on the next call, then automatically cleared).
///
/// Gated behind the `test-utils` feature.
///
/// ```ignore
/// let storage = FailingStorage::wrap(Arc::new(InMemoryStorage::new()));
/// storage.fail_apply(StorageError::Unavailable("connection refused".into()));
/// // every apply call now returns Err(...)
/// ```
#[cfg(feature = "test-utils")]
pub struct FailingStorage {
    inner: Arc<dyn Storage>,
    fail_apply: FailSlot,
    fail_scan: FailSlot,
}

#[cfg(feature = "test-utils")]
impl FailingStorage {
    /// Wraps an existing storage, with all failure injections initially `None`.
    pub fn wrap(inner: Arc<dyn Storage>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_apply: arc_swap::ArcSwap::from_pointee(None),
            fail_scan: arc_swap::ArcSwap::from_pointee(None),
        })
    }

    /// Makes `apply` return the given error on every subsequent call.
    pub fn fail_apply(&self, err: StorageError) {
        self.fail_apply
            .store(Arc::new(Some(Failure::Persistent(err))));
    }

    /// Makes `apply` return the given error on the next call only.
    pub fn fail_apply_once(&self, err: StorageError) {
        self.fail_apply.store(Arc::new(Some(Failure::Once(err))));
    }

    /// Makes `scan_iter` return the given error on every subsequent call.
    pub fn fail_scan(&self, err: StorageError) {
        self.fail_scan
            .store(Arc::new(Some(Failure::Persistent(err))));
    }

    /// Clears every injected failure.
    pub fn clear(&self) {
        self.fail_apply.store(Arc::new(None));
        self.fail_scan.store(Arc::new(None));
    }
}

#[cfg(feature = "test-utils")]
#[async_trait]
impl StorageRead for FailingStorage {
    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>> {
        check_failure(&self.fail_scan)?;
        self.inner.scan_iter(range).await
    }
}

#[cfg(feature = "test-utils")]
#[async_trait]
impl Storage for FailingStorage {
    async fn apply_with_options(
        &self,
        ops: Vec<RecordOp>,
        options: WriteOptions,
    ) -> StorageResult<()> {
        check_failure(&self.fail_apply)?;
        self.inner.apply_with_options(ops, options).await
    }

    async fn flush(&self) -> StorageResult<()> {
        self.inner.flush().await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}
