//! Range scans over the items of a collection.

use std::ops::Bound;

use crate::error::Result;
use crate::grouper::RowGrouper;
use crate::key::ROOT_ITEM_ID;
use crate::model::{ScanEntry, ScanPage};
use crate::storage::RowIterator;

/// Parameters of a deep scan.
///
/// A deep scan enumerates the documents of the collection named by `key`,
/// in item order, between optional item bounds. The collection's own root
/// document is never returned.
///
/// ```ignore
/// let scan = DeepScan::new("app/users", 100).gte("a").lt("n");
/// let page = store.deep_scan_page(&scan).await?;
/// if let Some(next) = page.next {
///     let more = store.deep_scan_page(&next).await?;
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepScan {
    key: String,
    limit: usize,
    gt: Option<String>,
    gte: Option<String>,
    lt: Option<String>,
    lte: Option<String>,
}

impl DeepScan {
    /// Scans up to `limit` documents of the collection addressed by `key`.
    pub fn new(key: impl Into<String>, limit: usize) -> Self {
        Self {
            key: key.into(),
            limit,
            gt: None,
            gte: None,
            lt: None,
            lte: None,
        }
    }

    /// Only items sorting after `item`.
    pub fn gt(mut self, item: impl Into<String>) -> Self {
        self.gt = Some(item.into());
        self
    }

    /// Only items sorting at or after `item`. Takes precedence over `gt`.
    pub fn gte(mut self, item: impl Into<String>) -> Self {
        self.gte = Some(item.into());
        self
    }

    /// Only items sorting before `item`.
    pub fn lt(mut self, item: impl Into<String>) -> Self {
        self.lt = Some(item.into());
        self
    }

    /// Only items sorting at or before `item`. Takes precedence over `lt`.
    pub fn lte(mut self, item: impl Into<String>) -> Self {
        self.lte = Some(item.into());
        self
    }

    /// Returns the scan resuming after `item_id`, keeping the upper bound.
    pub fn after(&self, item_id: impl Into<String>) -> Self {
        Self {
            gt: Some(item_id.into()),
            gte: None,
            ..self.clone()
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Lower item bound. An empty `gte` cannot include anything but the root
    /// document, so it falls back to the default of starting after the root.
    pub(crate) fn lower_bound(&self) -> Bound<&str> {
        match (self.gte.as_deref(), self.gt.as_deref()) {
            (Some(gte), _) if !gte.is_empty() => Bound::Included(gte),
            (_, Some(gt)) => Bound::Excluded(gt),
            _ => Bound::Excluded(ROOT_ITEM_ID),
        }
    }

    pub(crate) fn upper_bound(&self) -> Bound<&str> {
        match (self.lte.as_deref(), self.lt.as_deref()) {
            (Some(lte), _) => Bound::Included(lte),
            (_, Some(lt)) => Bound::Excluded(lt),
            _ => Bound::Unbounded,
        }
    }
}

/// Documents produced by a deep scan, in item order.
pub struct DocumentIterator {
    grouper: RowGrouper<RowIterator>,
    emitted: usize,
    last_item: Option<String>,
}

impl DocumentIterator {
    pub(crate) fn new(rows: RowIterator, limit: usize) -> Self {
        Self {
            grouper: RowGrouper::new(rows, limit),
            emitted: 0,
            last_item: None,
        }
    }

    /// Returns the next document, or None when the scan is complete.
    pub async fn next(&mut self) -> Result<Option<ScanEntry>> {
        let entry = self.grouper.next().await?;
        if let Some(entry) = &entry {
            self.emitted += 1;
            self.last_item = Some(entry.item_id.clone());
        }
        Ok(entry)
    }

    /// Whether the row cap stopped the read before the end of the range.
    pub fn truncated(&self) -> bool {
        self.grouper.truncated()
    }

    /// The scan that continues after the last document returned so far.
    ///
    /// Returns `Some` once `scan.limit()` documents have been returned, or
    /// once the row cap stopped the read early. Returns `None` when the range
    /// may hold nothing past what was returned.
    pub fn next_scan(&self, scan: &DeepScan) -> Option<DeepScan> {
        let more = self.emitted >= scan.limit() || self.truncated();
        match &self.last_item {
            Some(last) if more => Some(scan.after(last.clone())),
            _ => None,
        }
    }

    /// Drains the iterator into one page of `scan`.
    pub(crate) async fn into_page(mut self, scan: &DeepScan) -> Result<ScanPage> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next().await? {
            entries.push(entry);
        }
        let next = self.next_scan(scan);
        Ok(ScanPage { entries, next })
    }
}
