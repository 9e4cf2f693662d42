//! Storage factory for creating storage instances from configuration.

use std::sync::Arc;

use super::config::StorageConfig;
use super::in_memory::InMemoryStorage;
use super::{Storage, StorageResult};

/// Creates a storage instance based on the provided configuration.
///
/// This is a convenience function that uses default options. For more control,
/// use [`StorageBuilder`].
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    StorageBuilder::new(config.clone()).build().await
}

/// Builder for creating storage instances with runtime options that cannot
/// be expressed in configuration files.
pub struct StorageBuilder {
    config: StorageConfig,
    #[cfg(feature = "slatedb")]
    compaction_runtime: Option<tokio::runtime::Handle>,
}

impl StorageBuilder {
    /// Creates a new storage builder with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "slatedb")]
            compaction_runtime: None,
        }
    }

    /// Sets a separate runtime for SlateDB compaction tasks.
    ///
    /// Keeps compaction off the runtime that serves blocking waits on
    /// deferred operations.
    #[cfg(feature = "slatedb")]
    pub fn with_compaction_runtime(mut self, handle: tokio::runtime::Handle) -> Self {
        self.compaction_runtime = Some(handle);
        self
    }

    /// Builds the storage instance.
    pub async fn build(self) -> StorageResult<Arc<dyn Storage>> {
        match &self.config {
            StorageConfig::InMemory => Ok(Arc::new(InMemoryStorage::new())),
            #[cfg(feature = "slatedb")]
            StorageConfig::SlateDb(slate_config) => {
                let storage =
                    super::slate::SlateDbStorage::open(slate_config, self.compaction_runtime)
                        .await?;
                Ok(Arc::new(storage))
            }
            #[cfg(not(feature = "slatedb"))]
            StorageConfig::SlateDb(slate_config) => Err(super::StorageError::Storage(format!(
                "SlateDB storage at '{}' requires the `slatedb` feature",
                slate_config.path
            ))),
        }
    }
}
