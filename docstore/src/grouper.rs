//! Regrouping of ordered rows into documents.

use async_trait::async_trait;

use crate::document::combine;
use crate::error::{Error, Result};
use crate::model::{Row, ScanEntry};
use crate::value::Value;

/// An ordered stream of rows, sorted by item and then by column.
#[async_trait]
pub(crate) trait RowSource: Send {
    /// Returns the next row, or None once the stream is exhausted.
    async fn next_row(&mut self) -> Result<Option<Row>>;

    /// Item of the first row left unread because the stream was cut short,
    /// if it was.
    fn truncated_at(&self) -> Option<&str> {
        None
    }
}

/// Turns a [`RowSource`] into a stream of at most `limit` documents.
///
/// A document is emitted when the first row of the next item arrives, or when
/// the stream ends. Once `limit` documents have been emitted no further rows
/// are pulled. An item cut short by a truncated source is never emitted.
pub(crate) struct RowGrouper<S> {
    source: S,
    limit: usize,
    emitted: usize,
    current: Option<(String, Vec<(String, Value)>)>,
    exhausted: bool,
}

impl<S: RowSource> RowGrouper<S> {
    pub(crate) fn new(source: S, limit: usize) -> Self {
        Self {
            source,
            limit,
            emitted: 0,
            current: None,
            exhausted: false,
        }
    }

    /// Returns the next document, or None once `limit` documents were emitted
    /// or the rows ran out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the very first item does not fit
    /// in the source's row budget, since no progress could ever be made.
    pub(crate) async fn next(&mut self) -> Result<Option<ScanEntry>> {
        if self.exhausted || self.emitted >= self.limit {
            return Ok(None);
        }

        while let Some(row) = self.source.next_row().await? {
            if let Some((item_id, pairs)) = self.current.as_mut()
                && *item_id == row.item_id
            {
                pairs.push((row.column, row.value));
                continue;
            }

            let finished = self
                .current
                .replace((row.item_id, vec![(row.column, row.value)]));
            if let Some((item_id, pairs)) = finished {
                return Ok(Some(self.emit(item_id, pairs)));
            }
        }

        self.exhausted = true;
        let Some((item_id, pairs)) = self.current.take() else {
            return Ok(None);
        };

        if self.source.truncated_at() == Some(item_id.as_str()) {
            if self.emitted == 0 {
                return Err(Error::InvalidInput(format!(
                    "item '{}' has more rows than the scan reads per item; \
                     increase rows_per_item",
                    item_id
                )));
            }
            tracing::warn!(
                item_id = %item_id,
                rows = pairs.len(),
                emitted = self.emitted,
                "row cap reached mid-item, leaving it for the next page"
            );
            return Ok(None);
        }

        Ok(Some(self.emit(item_id, pairs)))
    }

    /// Returns true if the source stopped at its row cap with rows left, so
    /// documents beyond the ones emitted may exist.
    pub(crate) fn truncated(&self) -> bool {
        self.source.truncated_at().is_some()
    }

    fn emit(&mut self, item_id: String, pairs: Vec<(String, Value)>) -> ScanEntry {
        self.emitted += 1;
        ScanEntry {
            item_id,
            document: combine(pairs),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    /// Row source over a fixed list that counts how many rows were pulled.
    struct VecSource {
        rows: VecDeque<Row>,
        pulled: usize,
        truncated_at: Option<String>,
    }

    impl VecSource {
        fn new(rows: Vec<(&str, &str, i64)>) -> Self {
            Self {
                rows: rows
                    .into_iter()
                    .map(|(item, column, value)| Row {
                        item_id: item.to_string(),
                        column: column.to_string(),
                        value: Value::Int(value),
                    })
                    .collect(),
                pulled: 0,
                truncated_at: None,
            }
        }

        fn cut_at(mut self, item: &str) -> Self {
            self.truncated_at = Some(item.to_string());
            self
        }

        /// Items each holding `rows_per_item` rows named c0, c1, ...
        fn uniform(items: usize, rows_per_item: usize) -> Self {
            let mut source = Self::new(Vec::new());
            for i in 0..items {
                for c in 0..rows_per_item {
                    source.rows.push_back(Row {
                        item_id: format!("item{:03}", i),
                        column: format!("c{}", c),
                        value: Value::Int(c as i64),
                    });
                }
            }
            source
        }
    }

    #[async_trait]
    impl RowSource for VecSource {
        async fn next_row(&mut self) -> Result<Option<Row>> {
            let row = self.rows.pop_front();
            if row.is_some() {
                self.pulled += 1;
            }
            Ok(row)
        }

        fn truncated_at(&self) -> Option<&str> {
            if self.rows.is_empty() {
                self.truncated_at.as_deref()
            } else {
                None
            }
        }
    }

    async fn collect<S: RowSource>(grouper: &mut RowGrouper<S>) -> Result<Vec<ScanEntry>> {
        let mut entries = Vec::new();
        while let Some(entry) = grouper.next().await? {
            entries.push(entry);
        }
        Ok(entries)
    }

    #[tokio::test]
    async fn should_group_consecutive_rows_by_item() {
        // given
        let source = VecSource::new(vec![("a", "x", 1), ("a", "y/z", 2), ("b", "x", 3)]);
        let mut grouper = RowGrouper::new(source, 10);

        // when
        let entries = collect(&mut grouper).await.unwrap();

        // then
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].item_id, "a");
        assert_eq!(entries[0].document, Value::from(json!({"x": 1, "y": {"z": 2}})));
        assert_eq!(entries[1].item_id, "b");
        assert_eq!(entries[1].document, Value::from(json!({"x": 3})));
    }

    #[tokio::test]
    async fn should_yield_nothing_for_empty_source() {
        // given
        let mut grouper = RowGrouper::new(VecSource::new(Vec::new()), 5);

        // when
        let entries = collect(&mut grouper).await.unwrap();

        // then
        assert!(entries.is_empty());
    }

    #[rstest]
    #[case(1, 5, 3)]
    #[case(2, 5, 3)]
    #[case(3, 4, 1)]
    #[tokio::test]
    async fn should_stop_pulling_rows_after_limit(
        #[case] limit: usize,
        #[case] items: usize,
        #[case] rows_per_item: usize,
    ) {
        // given
        let mut grouper = RowGrouper::new(VecSource::uniform(items, rows_per_item), limit);

        // when
        let entries = collect(&mut grouper).await.unwrap();

        // then
        assert_eq!(entries.len(), limit);
        assert_eq!(grouper.source.pulled, limit * rows_per_item + 1);
    }

    #[tokio::test]
    async fn should_flush_last_item_at_end_of_stream() {
        // given
        let mut grouper = RowGrouper::new(VecSource::uniform(2, 2), 2);

        // when
        let entries = collect(&mut grouper).await.unwrap();

        // then
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].item_id, "item001");
        assert_eq!(grouper.source.pulled, 4);
    }

    #[tokio::test]
    async fn should_drop_item_cut_by_truncation() {
        // given
        let source = VecSource::new(vec![("a", "x", 1), ("b", "x", 2)]).cut_at("b");
        let mut grouper = RowGrouper::new(source, 10);

        // when
        let entries = collect(&mut grouper).await.unwrap();

        // then
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item_id, "a");
        assert!(grouper.truncated());
    }

    #[tokio::test]
    async fn should_keep_complete_item_when_truncated_at_boundary() {
        // given
        let source = VecSource::new(vec![("a", "x", 1), ("b", "x", 2)]).cut_at("c");
        let mut grouper = RowGrouper::new(source, 10);

        // when
        let entries = collect(&mut grouper).await.unwrap();

        // then
        assert_eq!(entries.len(), 2);
        assert!(grouper.truncated());
    }

    #[tokio::test]
    async fn should_fail_when_first_item_exceeds_row_budget() {
        // given
        let source = VecSource::new(vec![("a", "x", 1), ("a", "y", 2)]).cut_at("a");
        let mut grouper = RowGrouper::new(source, 1);

        // when
        let result = grouper.next().await;

        // then
        match result {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("rows_per_item")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }
}
