//! Storage encoding of document rows.
//!
//! Every leaf of every document is one record of the sorted store:
//!
//! ```text
//! key:   | version (u8) | record_tag (u8) | collection_id (TB) | item_id (TB) | column (TB) |
//! value: JSON encoding of the leaf
//! ```
//!
//! `TB` is the terminated bytes encoding from `common`. It preserves order and
//! is prefix-free, so records sort by collection, then item, then column, and
//! all rows of an item (or of a collection) share a key prefix.

use std::ops::Bound::{self, Excluded, Included, Unbounded};

use bytes::{BufMut, Bytes, BytesMut};
use common::BytesRange;
use common::bytes::lex_increment;
use common::serde::terminated_bytes;

use crate::error::{Error, Result};
use crate::value::Value;

/// Key format version.
pub const KEY_VERSION: u8 = 0x01;

/// Record tag: type 0x1 in high 4 bits, reserved 0x0 in low 4 bits.
pub const RECORD_TAG: u8 = 0x10;

/// Decoded storage key of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowKey {
    pub collection_id: String,
    pub item_id: String,
    pub column: String,
}

impl RowKey {
    pub fn new(
        collection_id: impl Into<String>,
        item_id: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            collection_id: collection_id.into(),
            item_id: item_id.into(),
            column: column.into(),
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = item_prefix(&self.collection_id, &self.item_id);
        terminated_bytes::serialize(self.column.as_bytes(), &mut buf);
        buf.freeze()
    }

    pub fn decode(storage_key: &[u8]) -> Result<Self> {
        if storage_key.len() < 2 {
            return Err(Error::Encoding(format!(
                "key too short: expected at least 2 bytes, got {}",
                storage_key.len()
            )));
        }
        if storage_key[0] != KEY_VERSION {
            return Err(Error::Encoding(format!(
                "invalid key version: expected 0x{:02x}, got 0x{:02x}",
                KEY_VERSION, storage_key[0]
            )));
        }
        if storage_key[1] != RECORD_TAG {
            return Err(Error::Encoding(format!(
                "invalid record tag: expected 0x{:02x}, got 0x{:02x}",
                RECORD_TAG, storage_key[1]
            )));
        }

        let mut buf = &storage_key[2..];
        let collection_id = decode_string(&mut buf, "collection_id")?;
        let item_id = decode_string(&mut buf, "item_id")?;
        let column = decode_string(&mut buf, "column")?;
        if !buf.is_empty() {
            return Err(Error::Encoding(format!(
                "{} trailing bytes after row key",
                buf.len()
            )));
        }

        Ok(Self {
            collection_id,
            item_id,
            column,
        })
    }
}

fn decode_string(buf: &mut &[u8], field: &str) -> Result<String> {
    let raw = terminated_bytes::deserialize(buf)?;
    String::from_utf8(raw.to_vec())
        .map_err(|e| Error::Encoding(format!("{} is not valid UTF-8: {}", field, e)))
}

fn collection_prefix(collection_id: &str) -> BytesMut {
    let mut buf = BytesMut::with_capacity(2 + collection_id.len() + 1);
    buf.put_u8(KEY_VERSION);
    buf.put_u8(RECORD_TAG);
    terminated_bytes::serialize(collection_id.as_bytes(), &mut buf);
    buf
}

fn item_prefix(collection_id: &str, item_id: &str) -> BytesMut {
    let mut buf = collection_prefix(collection_id);
    terminated_bytes::serialize(item_id.as_bytes(), &mut buf);
    buf
}

/// Returns the range holding every row of one item.
pub fn item_range(collection_id: &str, item_id: &str) -> BytesRange {
    BytesRange::prefix(item_prefix(collection_id, item_id).freeze())
}

/// Returns the range holding every row of the items of `collection_id` whose
/// identifiers fall within the given bounds.
///
/// An item bound covers all of that item's rows: excluding an item excludes
/// every one of its columns, including it includes every one.
pub fn item_bounds_range(
    collection_id: &str,
    lower: Bound<&str>,
    upper: Bound<&str>,
) -> BytesRange {
    // encoded prefixes end with a terminator, so lex_increment always succeeds
    let start = match lower {
        Included(item) => Included(item_prefix(collection_id, item).freeze()),
        Excluded(item) => {
            lex_increment(&item_prefix(collection_id, item)).map_or(Unbounded, Included)
        }
        Unbounded => Included(collection_prefix(collection_id).freeze()),
    };
    let end = match upper {
        Included(item) => {
            lex_increment(&item_prefix(collection_id, item)).map_or(Unbounded, Excluded)
        }
        Excluded(item) => Excluded(item_prefix(collection_id, item).freeze()),
        Unbounded => lex_increment(&collection_prefix(collection_id)).map_or(Unbounded, Excluded),
    };
    BytesRange::new(start, end)
}

/// Encodes a leaf value.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the value cannot be represented.
pub fn encode_value(value: &Value) -> Result<Bytes> {
    let json = value.to_json()?;
    serde_json::to_vec(&json)
        .map(Bytes::from)
        .map_err(|e| Error::Serialization(e.to_string()))
}

/// Decodes a stored leaf value.
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .map(Value::from)
        .map_err(|e| Error::Encoding(format!("invalid row value: {}", e)))
}
