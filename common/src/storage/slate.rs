//! SlateDB-backed implementation of [`Storage`].

use std::sync::Arc;

use async_trait::async_trait;
use slatedb::config::Settings;
use slatedb::object_store::{self, ObjectStore};
use slatedb::{Db, DbBuilder, DbIterator, WriteBatch};
use tokio::runtime::Handle;
use tokio::sync::Mutex;

use super::config::{ObjectStoreConfig, SlateDbStorageConfig};
use super::{RecordOp, Storage, StorageError, StorageResult, WriteOptions};
use crate::{BytesRange, Record, StorageIterator, StorageRead};

/// Creates an object store from configuration.
pub fn create_object_store(config: &ObjectStoreConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config {
        ObjectStoreConfig::InMemory => Ok(Arc::new(object_store::memory::InMemory::new())),
        ObjectStoreConfig::Aws(aws_config) => {
            let store = object_store::aws::AmazonS3Builder::from_env()
                .with_region(&aws_config.region)
                .with_bucket_name(&aws_config.bucket)
                .build()
                .map_err(|e| {
                    StorageError::Unavailable(format!("Failed to create AWS S3 store: {}", e))
                })?;
            Ok(Arc::new(store))
        }
        ObjectStoreConfig::Local(local_config) => {
            std::fs::create_dir_all(&local_config.path).map_err(|e| {
                StorageError::Unavailable(format!(
                    "Failed to create storage directory '{}': {}",
                    local_config.path, e
                ))
            })?;
            let store = object_store::local::LocalFileSystem::new_with_prefix(&local_config.path)
                .map_err(|e| {
                    StorageError::Unavailable(format!(
                        "Failed to create local filesystem store: {}",
                        e
                    ))
                })?;
            Ok(Arc::new(store))
        }
    }
}

/// Storage over a SlateDB database.
///
/// Batches are applied one at a time under a mutex, so the keys a
/// [`RecordOp::DeleteRange`] reads cannot change before its batch lands.
/// The mutex is per process: writers in other processes sharing the same
/// database are not serialized against it.
pub struct SlateDbStorage {
    db: Arc<Db>,
    write_lock: Mutex<()>,
}

impl SlateDbStorage {
    /// Opens (or creates) the database described by `config`.
    pub async fn open(
        config: &SlateDbStorageConfig,
        compaction_runtime: Option<Handle>,
    ) -> StorageResult<Self> {
        let object_store = create_object_store(&config.object_store)?;

        let settings = match &config.settings_path {
            Some(path) => Settings::from_file(path).map_err(|e| {
                StorageError::Storage(format!(
                    "Failed to load SlateDB settings from {}: {}",
                    path, e
                ))
            })?,
            None => Settings::load().unwrap_or_default(),
        };

        let mut builder = DbBuilder::new(config.path.clone(), object_store).with_settings(settings);
        if let Some(handle) = compaction_runtime {
            builder = builder.with_compaction_runtime(handle);
        }

        let db = builder
            .build()
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to open SlateDB: {}", e)))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }
}

#[async_trait]
impl StorageRead for SlateDbStorage {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>> {
        let inner = self
            .db
            .scan(range)
            .await
            .map_err(StorageError::from_storage)?;
        Ok(Box::new(SlateDbIterator { inner }))
    }
}

struct SlateDbIterator {
    inner: DbIterator,
}

#[async_trait]
impl StorageIterator for SlateDbIterator {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn next(&mut self) -> StorageResult<Option<Record>> {
        let next = self
            .inner
            .next()
            .await
            .map_err(StorageError::from_storage)?;
        Ok(next.map(|kv| Record::new(kv.key, kv.value)))
    }
}

#[async_trait]
impl Storage for SlateDbStorage {
    async fn apply_with_options(
        &self,
        ops: Vec<RecordOp>,
        options: WriteOptions,
    ) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut batch = WriteBatch::new();
        for op in ops {
            match op {
                RecordOp::Put(record) => batch.put(record.key, record.value),
                RecordOp::Delete(key) => batch.delete(key),
                RecordOp::DeleteRange(range) => {
                    if range.is_empty() {
                        continue;
                    }
                    let mut iter = self
                        .db
                        .scan(range)
                        .await
                        .map_err(StorageError::from_storage)?;
                    while let Some(kv) = iter.next().await.map_err(StorageError::from_storage)?
                    {
                        batch.delete(kv.key);
                    }
                }
            }
        }
        let write_options = slatedb::config::WriteOptions {
            await_durable: options.await_durable,
            ..Default::default()
        };
        self.db
            .write_with_options(batch, &write_options)
            .await
            .map_err(StorageError::from_storage)
    }

    async fn flush(&self) -> StorageResult<()> {
        self.db.flush().await.map_err(StorageError::from_storage)
    }

    async fn close(&self) -> StorageResult<()> {
        self.db.close().await.map_err(StorageError::from_storage)
    }
}
