pub mod config;
pub mod factory;
pub mod in_memory;
#[cfg(feature = "slatedb")]
pub mod slate;

use async_trait::async_trait;
use bytes::Bytes;

use crate::BytesRange;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub key: Bytes,
    pub value: Bytes,
}

impl Record {
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

/// A single mutation inside an atomic batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordOp {
    Put(Record),
    Delete(Bytes),
    /// Deletes every key in the range, as seen at the moment the batch is
    /// applied.
    DeleteRange(BytesRange),
}

impl From<Record> for RecordOp {
    fn from(record: Record) -> Self {
        RecordOp::Put(record)
    }
}

/// Options for write operations.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Whether to wait for the write to be durable before returning.
    ///
    /// When `false` (the default), the operation returns as soon as the data
    /// is visible to readers, trading durability for latency.
    pub await_durable: bool,
}

/// Error type for storage operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend rejected or failed to execute an operation.
    Storage(String),
    /// The backend cannot be reached (closed, fenced, or unreachable).
    Unavailable(String),
    /// Internal errors
    Internal(String),
}

impl std::error::Error for StorageError {}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StorageError::Storage(msg) => write!(f, "Storage error: {}", msg),
            StorageError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            StorageError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StorageError {
    /// Converts a backend error to StorageError::Storage.
    pub fn from_storage(e: impl std::fmt::Display) -> Self {
        StorageError::Storage(e.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Iterator over storage records in key order.
#[async_trait]
pub trait StorageIterator {
    async fn next(&mut self) -> StorageResult<Option<Record>>;
}

/// Read operations over a sorted key space.
#[async_trait]
pub trait StorageRead: Send + Sync {
    /// Returns an iterator over records in the given range, in ascending key
    /// order.
    ///
    /// The returned iterator is owned and does not borrow from the storage,
    /// allowing it to be stored in structs or passed across await points.
    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>>;

    /// Collects all records in the range into a Vec.
    #[tracing::instrument(level = "trace", skip_all)]
    async fn scan(&self, range: BytesRange) -> StorageResult<Vec<Record>> {
        let mut iter = self.scan_iter(range).await?;
        let mut records = Vec::new();
        while let Some(record) = iter.next().await? {
            records.push(record);
        }
        Ok(records)
    }
}

/// Read-write access to the underlying sorted store (in-memory or SlateDB).
#[async_trait]
pub trait Storage: StorageRead {
    /// Applies a batch of puts and deletes atomically.
    ///
    /// Operations are applied in order, so a delete followed by a put of the
    /// same key leaves the put. Either every operation is visible or none is.
    /// A [`RecordOp::DeleteRange`] removes the keys present when the batch is
    /// applied, so no write made before the batch survives it.
    async fn apply(&self, ops: Vec<RecordOp>) -> StorageResult<()> {
        self.apply_with_options(ops, WriteOptions::default()).await
    }

    /// Applies a batch atomically with custom durability options.
    async fn apply_with_options(
        &self,
        ops: Vec<RecordOp>,
        options: WriteOptions,
    ) -> StorageResult<()>;

    /// Flushes all pending writes to durable storage.
    async fn flush(&self) -> StorageResult<()>;

    /// Closes the storage, releasing any resources.
    ///
    /// For SlateDB this releases the database fence.
    async fn close(&self) -> StorageResult<()>;
}
