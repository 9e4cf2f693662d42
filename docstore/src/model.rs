//! Data types for document store operations.

use crate::deep_scan::DeepScan;
use crate::value::Value;

/// One stored leaf of a document, as read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Identifier of the item the leaf belongs to.
    pub item_id: String,
    /// Relative path of the leaf inside its document.
    pub column: String,
    pub value: Value,
}

/// A document returned by a deep scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEntry {
    /// The item's identifier within the scanned collection.
    pub item_id: String,
    /// The reconstructed document.
    pub document: Value,
}

/// One page of deep scan results.
#[derive(Debug, Clone)]
pub struct ScanPage {
    pub entries: Vec<ScanEntry>,
    /// The scan resuming after the last entry, when the page is full.
    pub next: Option<DeepScan>,
}
