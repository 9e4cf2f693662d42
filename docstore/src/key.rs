//! Hierarchical path keys and their mapping to row coordinates.
//!
//! A key such as `app/users/42` addresses the document `42` inside the
//! collection `app/users`. A two-segment key such as `app/users` addresses the
//! root document of the collection of that name, stored under
//! [`ROOT_ITEM_ID`].

use crate::error::{Error, Result};

/// Item identifier of a collection's own root document.
///
/// Encodes as the single terminator byte and therefore sorts before every
/// real item identifier, which is never empty.
pub const ROOT_ITEM_ID: &str = "";

/// Separator between key segments and between nested map keys.
pub const SEPARATOR: char = '/';

/// Storage coordinates of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub collection_id: String,
    pub item_id: String,
}

impl ItemKey {
    /// Parses a hierarchical key.
    ///
    /// Leading and trailing separators are ignored.
    ///
    /// - `a/b` → collection `a/b`, root item
    /// - `a/b/c` → collection `a/b`, item `c`
    /// - `a`, empty keys and keys with empty inner segments → [`Error::InvalidKey`]
    pub fn parse(key: &str) -> Result<Self> {
        let segments = segments(key)?;
        match segments.len() {
            0 | 1 => Err(Error::InvalidKey(format!(
                "key '{}' needs at least two segments",
                key
            ))),
            2 => Ok(Self {
                collection_id: segments.join("/"),
                item_id: ROOT_ITEM_ID.to_string(),
            }),
            n => Ok(Self {
                collection_id: segments[..n - 1].join("/"),
                item_id: segments[n - 1].to_string(),
            }),
        }
    }

    /// Returns true if this key addresses a collection's root document.
    pub fn is_root(&self) -> bool {
        self.item_id == ROOT_ITEM_ID
    }

    /// Reassembles the hierarchical key this item was parsed from.
    pub fn path(&self) -> String {
        if self.is_root() {
            self.collection_id.clone()
        } else {
            format!("{}/{}", self.collection_id, self.item_id)
        }
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Returns the collection whose items a deep scan of `key` enumerates.
///
/// The children of `users/42` live in the collection `users/42`, so the scope
/// is the trimmed key itself. A single segment is enough.
pub fn collection_scope(key: &str) -> Result<String> {
    let segments = segments(key)?;
    if segments.is_empty() {
        return Err(Error::InvalidKey(format!(
            "key '{}' does not name a collection",
            key
        )));
    }
    Ok(segments.join("/"))
}

/// Validates a single item name used under an existing collection.
pub(crate) fn validate_segment(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(SEPARATOR) {
        return Err(Error::InvalidKey(format!(
            "item name '{}' must be a single non-empty segment",
            name
        )));
    }
    Ok(())
}

fn segments(key: &str) -> Result<Vec<&str>> {
    let trimmed = key.trim_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<&str> = trimmed.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::InvalidKey(format!(
            "key '{}' contains an empty segment",
            key
        )));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("a/b", "a/b", ROOT_ITEM_ID)]
    #[case("a/b/c", "a/b", "c")]
    #[case("app/users/42", "app/users", "42")]
    #[case("/app/users/42/", "app/users", "42")]
    #[case("a/b/c/d/e", "a/b/c/d", "e")]
    fn should_parse_key(#[case] key: &str, #[case] collection: &str, #[case] item: &str) {
        // when
        let parsed = ItemKey::parse(key).unwrap();

        // then
        assert_eq!(parsed.collection_id, collection);
        assert_eq!(parsed.item_id, item);
    }

    #[rstest]
    #[case("")]
    #[case("/")]
    #[case("a")]
    #[case("/a/")]
    #[case("a//b")]
    #[case("a/b//c")]
    fn should_reject_invalid_key(#[case] key: &str) {
        // when
        let result = ItemKey::parse(key);

        // then
        assert!(matches!(result, Err(Error::InvalidKey(_))));
    }

    #[test]
    fn should_mark_two_segment_key_as_root() {
        assert!(ItemKey::parse("a/b").unwrap().is_root());
        assert!(!ItemKey::parse("a/b/c").unwrap().is_root());
    }

    #[test]
    fn should_not_collide_sibling_items() {
        // given
        let first = ItemKey::parse("users/42").unwrap();
        let second = ItemKey::parse("users/43").unwrap();

        // then
        assert_ne!(first, second);
    }

    #[test]
    fn should_reassemble_path() {
        assert_eq!(ItemKey::parse("/a/b/c").unwrap().path(), "a/b/c");
        assert_eq!(ItemKey::parse("a/b/").unwrap().to_string(), "a/b");
    }

    #[rstest]
    #[case("users", "users")]
    #[case("users/42", "users/42")]
    #[case("users/42/", "users/42")]
    #[case("/app/users/", "app/users")]
    fn should_compute_collection_scope(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(collection_scope(key).unwrap(), expected);
    }

    #[test]
    fn should_scope_item_key_to_its_own_children() {
        // given
        let parent = ItemKey::parse("users/42").unwrap();
        let child = ItemKey::parse("users/42/orders").unwrap();

        // then
        assert_eq!(collection_scope("users/42").unwrap(), parent.collection_id);
        assert_eq!(child.collection_id, collection_scope("users/42").unwrap());
    }

    #[rstest]
    #[case("")]
    #[case("//")]
    #[case("a//b")]
    fn should_reject_invalid_scope(#[case] key: &str) {
        assert!(matches!(collection_scope(key), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn should_validate_segment() {
        assert!(validate_segment("42").is_ok());
        assert!(validate_segment("").is_err());
        assert!(validate_segment("a/b").is_err());
    }

    #[test]
    fn should_sort_root_before_any_item() {
        assert!(ROOT_ITEM_ID < "0");
        assert!(ROOT_ITEM_ID < "\u{1}");
    }
}
