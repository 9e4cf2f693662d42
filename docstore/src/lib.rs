//! A hierarchical document store over a sorted row store.
//!
//! Documents are nested maps addressed by slash-separated keys. Each document
//! is decomposed into one row per leaf, keyed by `(collection, item, column)`,
//! and stored in a sorted key-value store (in-memory or SlateDB via
//! `common`). Reads reassemble documents from their rows.
//!
//! # Key Concepts
//!
//! - **Item key**: `app/users/42` addresses item `42` of collection
//!   `app/users`. A two-segment key such as `app/users` addresses the
//!   collection's own root document.
//! - **Leaf row**: `{"address": {"city": "NY"}}` is stored as the single row
//!   `address/city = "NY"`. Lists and empty maps are leaves.
//! - **Deep scan**: an ordered, bounded scan over the items of a collection,
//!   paginated with [`DeepScan::after`].
//! - **Deferred operations**: the `*_deferred` methods run an operation in the
//!   background and return a [`Deferred`] handle that can be awaited or
//!   waited on from a blocking thread.
//!
//! # Example
//!
//! ```ignore
//! use docstore::{Config, DeepScan, DocumentStore, Value, WriteOptions};
//! use serde_json::json;
//!
//! let store = DocumentStore::open(Config::default()).await?;
//!
//! let user = Value::from(json!({"name": "Alice", "address": {"city": "NY"}}));
//! store.put("app/users/42", &user).await?;
//! assert_eq!(store.get("app/users/42").await?, user);
//!
//! // replace instead of merging
//! let replacement = Value::from(json!({"name": "Bob"}));
//! store
//!     .put_with_options("app/users/42", &replacement, WriteOptions::overwrite())
//!     .await?;
//!
//! let mut scan = Some(DeepScan::new("app/users", 100));
//! while let Some(current) = scan {
//!     let page = store.deep_scan_page(&current).await?;
//!     for entry in &page.entries {
//!         println!("{}: {:?}", entry.item_id, entry.document);
//!     }
//!     scan = page.next;
//! }
//! ```

mod collection;
mod config;
mod deep_scan;
mod deferred;
pub mod document;
mod error;
mod grouper;
pub mod key;
mod model;
mod serde;
mod storage;
mod store;
pub mod value;

pub use collection::Collection;
pub use config::{Config, DEFAULT_ROWS_PER_ITEM, WriteOptions};
pub use deep_scan::{DeepScan, DocumentIterator};
pub use deferred::Deferred;
pub use error::{Error, Result};
pub use key::{ItemKey, ROOT_ITEM_ID};
pub use model::{ScanEntry, ScanPage};
pub use store::DocumentStore;
pub use value::Value;
