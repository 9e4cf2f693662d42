//! Decomposition of documents into leaf rows and their reassembly.
//!
//! A document maps to one row per leaf, keyed by the relative path from the
//! document root:
//!
//! ```text
//! {"name": "Alice", "address": {"city": "NY"}}
//!   -> ("address/city", "NY"), ("name", "Alice")
//! ```
//!
//! Lists and empty maps are leaves. A document that is not a map is a single
//! leaf stored under the empty path.

use std::collections::{BTreeMap, btree_map};

use crate::error::{Error, Result};
use crate::key::SEPARATOR;
use crate::value::Value;

/// Path of the leaf holding a non-map document.
pub const ROOT_PATH: &str = "";

/// Returns an iterator over the leaves of `document`.
///
/// Each item is `(relative path, leaf)`. Map keys that are empty or contain
/// the separator cannot be addressed by a path; they yield
/// [`Error::Serialization`] and end the iteration.
pub fn flatten(document: &Value) -> Flatten<'_> {
    match document {
        Value::Map(map) if !map.is_empty() => Flatten {
            root: None,
            stack: vec![(String::new(), map.iter())],
        },
        leaf => Flatten {
            root: Some(leaf),
            stack: Vec::new(),
        },
    }
}

/// Depth-first iterator returned by [`flatten`].
pub struct Flatten<'a> {
    root: Option<&'a Value>,
    stack: Vec<(String, btree_map::Iter<'a, String, Value>)>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = Result<(String, &'a Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(leaf) = self.root.take() {
            return Some(Ok((ROOT_PATH.to_string(), leaf)));
        }

        while let Some((prefix, entries)) = self.stack.last_mut() {
            let Some((key, value)) = entries.next() else {
                self.stack.pop();
                continue;
            };

            if key.is_empty() || key.contains(SEPARATOR) {
                let err = Error::Serialization(format!(
                    "map key '{}' under '{}' cannot be part of a path",
                    key, prefix
                ));
                self.stack.clear();
                return Some(Err(err));
            }

            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, SEPARATOR, key)
            };

            match value {
                Value::Map(map) if !map.is_empty() => self.stack.push((path, map.iter())),
                leaf => return Some(Ok((path, leaf))),
            }
        }

        None
    }
}

/// Reassembles a document from `(relative path, leaf)` pairs.
///
/// Pairs are applied in order. The empty path replaces the whole document,
/// intermediate maps are created as needed, and a non-map standing where a map
/// is needed is replaced by one. Later pairs for the same path win. No pairs
/// yield an empty map.
pub fn combine<I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (String, Value)>,
{
    pairs
        .into_iter()
        .fold(Value::empty_map(), |document, (path, leaf)| {
            let segments: Vec<&str> = if path.is_empty() {
                Vec::new()
            } else {
                path.split(SEPARATOR).collect()
            };
            set_path(document, &segments, leaf)
        })
}

fn set_path(node: Value, segments: &[&str], leaf: Value) -> Value {
    let Some((head, rest)) = segments.split_first() else {
        return leaf;
    };
    let mut map = match node {
        Value::Map(map) => map,
        _ => BTreeMap::new(),
    };
    let child = map.remove(*head).unwrap_or(Value::Null);
    map.insert(head.to_string(), set_path(child, rest, leaf));
    Value::Map(map)
}
