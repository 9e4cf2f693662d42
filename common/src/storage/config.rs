//! Storage backend configuration.
//!
//! These types are deserializable so hosts can embed them in their own
//! configuration files:
//!
//! ```toml
//! [storage]
//! type = "SlateDb"
//! path = "documents"
//! object_store = { type = "Local", path = "/var/lib/docstore" }
//! ```

use serde::{Deserialize, Serialize};

/// Selects and configures the storage backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StorageConfig {
    /// Volatile BTreeMap-backed storage, for tests and development.
    #[default]
    InMemory,
    /// SlateDB on top of an object store. Requires the `slatedb` feature.
    SlateDb(SlateDbStorageConfig),
}

/// Configuration for the SlateDB backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlateDbStorageConfig {
    /// Path prefix of the database inside the object store.
    pub path: String,
    /// Object store holding the database.
    pub object_store: ObjectStoreConfig,
    /// Optional SlateDB settings file. Defaults are used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<String>,
}

/// Object store selection for SlateDB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectStoreConfig {
    InMemory,
    Aws(AwsObjectStoreConfig),
    Local(LocalObjectStoreConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsObjectStoreConfig {
    pub region: String,
    pub bucket: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalObjectStoreConfig {
    pub path: String,
}
