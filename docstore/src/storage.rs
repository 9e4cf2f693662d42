//! Row-level storage operations.
//!
//! [`DocumentStorage`] executes the three statements documents are built
//! from: an atomic batch of row puts and range deletes, a select of one
//! item's rows, and a capped select over a range of items.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use common::{BytesRange, Record, RecordOp, Storage, StorageIterator, StorageRead};

use crate::config::WriteOptions;
use crate::error::Result;
use crate::grouper::RowSource;
use crate::model::Row;
use crate::serde::{RowKey, decode_value, item_range};
use crate::value::Value;

/// An ordered set of row mutations applied atomically.
#[derive(Debug, Default)]
pub(crate) struct RowBatch {
    ops: Vec<RecordOp>,
}

impl RowBatch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put(&mut self, key: Bytes, value: Bytes) {
        self.ops.push(Record::new(key, value).into());
    }

    /// Deletes every row in `range` that exists when the batch is applied.
    pub(crate) fn delete_range(&mut self, range: BytesRange) {
        self.ops.push(RecordOp::DeleteRange(range));
    }

    pub(crate) fn len(&self) -> usize {
        self.ops.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Row storage over `Arc<dyn Storage>`.
#[derive(Clone)]
pub(crate) struct DocumentStorage {
    storage: Arc<dyn Storage>,
}

impl DocumentStorage {
    pub(crate) fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Creates a new storage with an in-memory backend.
    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        use common::storage::in_memory::InMemoryStorage;
        Self::new(Arc::new(InMemoryStorage::new()))
    }

    /// Applies a batch of row mutations atomically.
    pub(crate) async fn apply(&self, batch: RowBatch, options: &WriteOptions) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        tracing::debug!(ops = batch.len(), "applying row batch");
        let storage_options = common::WriteOptions {
            await_durable: options.await_durable,
        };
        self.storage
            .apply_with_options(batch.ops, storage_options)
            .await?;
        Ok(())
    }

    /// Selects the `(column, value)` pairs of one item in column order.
    pub(crate) async fn select_item(
        &self,
        collection_id: &str,
        item_id: &str,
    ) -> Result<Vec<(String, Value)>> {
        let records = self
            .storage
            .scan(item_range(collection_id, item_id))
            .await?;
        tracing::debug!(
            collection_id,
            item_id,
            rows = records.len(),
            "selected item rows"
        );
        records
            .into_iter()
            .map(|record| {
                let key = RowKey::decode(&record.key)?;
                Ok((key.column, decode_value(&record.value)?))
            })
            .collect()
    }

    /// Selects rows in `range` in key order, reading at most `row_cap` of them.
    pub(crate) async fn select_range(
        &self,
        range: BytesRange,
        row_cap: usize,
    ) -> Result<RowIterator> {
        // some backends reject inverted bounds
        let inner = if range.is_empty() {
            None
        } else {
            Some(self.storage.scan_iter(range).await?)
        };
        tracing::debug!(row_cap, "selecting row range");
        Ok(RowIterator {
            inner,
            remaining: row_cap,
            truncated_at: None,
        })
    }

    pub(crate) async fn flush(&self) -> Result<()> {
        self.storage.flush().await?;
        Ok(())
    }

    pub(crate) async fn close(&self) -> Result<()> {
        self.storage.close().await?;
        Ok(())
    }
}

/// Rows of a range select, stopping at the row cap.
///
/// When the cap is reached while more rows remain, the iterator records the
/// item of the first unread row so the consumer can tell whether its last
/// item was cut short.
pub(crate) struct RowIterator {
    inner: Option<Box<dyn StorageIterator + Send>>,
    remaining: usize,
    truncated_at: Option<String>,
}

#[async_trait]
impl RowSource for RowIterator {
    async fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };
        let Some(record) = inner.next().await? else {
            self.inner = None;
            return Ok(None);
        };
        let key = RowKey::decode(&record.key)?;

        if self.remaining == 0 {
            self.truncated_at = Some(key.item_id);
            self.inner = None;
            return Ok(None);
        }
        self.remaining -= 1;

        Ok(Some(Row {
            item_id: key.item_id,
            column: key.column,
            value: decode_value(&record.value)?,
        }))
    }

    fn truncated_at(&self) -> Option<&str> {
        self.truncated_at.as_deref()
    }
}
