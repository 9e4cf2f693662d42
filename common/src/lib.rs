//! Shared building blocks for the document store.
//!
//! - [`storage`]: the sorted key-value storage abstraction ([`Storage`],
//!   [`StorageRead`]) with in-memory and SlateDB backends.
//! - [`serde`]: order-preserving byte encodings used to build storage keys.
//! - [`bytes`]: byte-range helpers for range scans.

pub mod bytes;
pub mod serde;
pub mod storage;

pub use bytes::BytesRange;
pub use storage::config::StorageConfig;
pub use storage::{
    Record, RecordOp, Storage, StorageError, StorageIterator, StorageRead, StorageResult,
    WriteOptions,
};
