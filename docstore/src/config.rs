//! Configuration options for document store operations.

use common::StorageConfig;
use serde::{Deserialize, Serialize};

/// Default assumed upper bound on leaf rows per document, used to cap the
/// row fetch of deep scans.
pub const DEFAULT_ROWS_PER_ITEM: usize = 250;

/// Configuration for opening a [`DocumentStore`](crate::DocumentStore).
///
/// Deserializable so hosts can embed it in their own configuration files:
///
/// ```toml
/// rows_per_item = 500
///
/// [storage]
/// type = "InMemory"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backend configuration.
    pub storage: StorageConfig,

    /// Assumed maximum number of leaf rows in one document.
    ///
    /// A deep scan for `limit` documents reads at most
    /// `limit * rows_per_item` rows. A document with more leaves than this
    /// cannot be returned by a deep scan with `limit = 1`; raise the value
    /// for stores holding very wide documents.
    pub rows_per_item: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::InMemory,
            rows_per_item: DEFAULT_ROWS_PER_ITEM,
        }
    }
}

/// Options for write operations.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Replace the stored document instead of merging leaves into it.
    ///
    /// When `true`, every existing row of the item is deleted in the same
    /// atomic batch as the new rows, so no leaf of the old document survives.
    /// When `false` (the default), leaves are upserted and leaves absent from
    /// the new document are kept.
    pub overwrite: bool,

    /// If true, waits for the write to be durable before returning.
    pub await_durable: bool,
}

impl WriteOptions {
    /// Options for a replacing write.
    pub fn overwrite() -> Self {
        Self {
            overwrite: true,
            ..Default::default()
        }
    }
}
