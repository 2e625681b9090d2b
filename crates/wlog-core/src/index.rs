//! Time-ordered lookup over one record family.
//!
//! All queries are binary searches over a sorted `Vec`, so the index is cheap
//! to share across the reconciliation, metrics and replay passes.

/// A single timestamped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T> {
    pub ts: i64,
    pub value: T,
}

/// Sorted entries with nearest-neighbor queries.
#[derive(Debug, Clone)]
pub struct SnapshotIndex<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for SnapshotIndex<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> SnapshotIndex<T> {
    /// Builds an index, sorting entries by timestamp.
    pub fn new(mut entries: Vec<Entry<T>>) -> Self {
        entries.sort_by_key(|e| e.ts);
        Self { entries }
    }

    /// Builds an index from raw `(ts, payload)` records, parsing each payload.
    ///
    /// Returns the index and the number of records the parser rejected.
    pub fn parse<'a, I, F>(records: I, mut parse: F) -> (Self, usize)
    where
        I: IntoIterator<Item = (&'a i64, &'a String)>,
        F: FnMut(&str) -> Option<T>,
    {
        let mut skipped = 0;
        let mut entries = Vec::new();
        for (&ts, payload) in records {
            match parse(payload) {
                Some(value) => entries.push(Entry { ts, value }),
                None => {
                    tracing::debug!(ts, payload = %payload, "skipping unparseable record");
                    skipped += 1;
                }
            }
        }
        (Self::new(entries), skipped)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    pub fn first(&self) -> Option<&Entry<T>> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&Entry<T>> {
        self.entries.last()
    }

    /// Latest entry with `entry.ts <= ts`.
    pub fn at_or_before(&self, ts: i64) -> Option<&Entry<T>> {
        let idx = self.entries.partition_point(|e| e.ts <= ts);
        idx.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Latest entry with `entry.ts < ts`.
    pub fn strictly_before(&self, ts: i64) -> Option<&Entry<T>> {
        let idx = self.entries.partition_point(|e| e.ts < ts);
        idx.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Earliest entry with `entry.ts >= ts`.
    pub fn at_or_after(&self, ts: i64) -> Option<&Entry<T>> {
        let idx = self.entries.partition_point(|e| e.ts < ts);
        self.entries.get(idx)
    }

    /// Earliest entry with `entry.ts > ts`.
    pub fn strictly_after(&self, ts: i64) -> Option<&Entry<T>> {
        let idx = self.entries.partition_point(|e| e.ts <= ts);
        self.entries.get(idx)
    }

    /// All entries with `entry.ts >= ts`, in order.
    pub fn since(&self, ts: i64) -> &[Entry<T>] {
        let idx = self.entries.partition_point(|e| e.ts < ts);
        &self.entries[idx..]
    }

    /// Whether any entry lies within `[ts - window, ts + window]`.
    pub fn any_within(&self, ts: i64, window: i64) -> bool {
        self.at_or_after(ts.saturating_sub(window))
            .is_some_and(|e| e.ts <= ts.saturating_add(window))
    }
}

impl<T: Clone + Default> SnapshotIndex<T> {
    pub fn value_at_or_before(&self, ts: i64) -> T {
        self.at_or_before(ts)
            .map(|e| e.value.clone())
            .unwrap_or_default()
    }

    pub fn value_strictly_before(&self, ts: i64) -> T {
        self.strictly_before(ts)
            .map(|e| e.value.clone())
            .unwrap_or_default()
    }

    pub fn value_at_or_after(&self, ts: i64) -> T {
        self.at_or_after(ts)
            .map(|e| e.value.clone())
            .unwrap_or_default()
    }

    pub fn value_strictly_after(&self, ts: i64) -> T {
        self.strictly_after(ts)
            .map(|e| e.value.clone())
            .unwrap_or_default()
    }
}

impl SnapshotIndex<String> {
    /// Borrowing variant of [`Self::value_at_or_before`] for text.
    pub fn text_at_or_before(&self, ts: i64) -> &str {
        self.at_or_before(ts).map_or("", |e| e.value.as_str())
    }

    /// Borrowing variant of [`Self::value_strictly_before`] for text.
    pub fn text_strictly_before(&self, ts: i64) -> &str {
        self.strictly_before(ts).map_or("", |e| e.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts() -> SnapshotIndex<String> {
        SnapshotIndex::new(vec![
            Entry {
                ts: 300,
                value: "abc".to_string(),
            },
            Entry {
                ts: 100,
                value: "a".to_string(),
            },
            Entry {
                ts: 200,
                value: "ab".to_string(),
            },
        ])
    }

    #[test]
    fn test_sorts_on_construction() {
        let index = texts();
        let times: Vec<i64> = index.entries().iter().map(|e| e.ts).collect();
        assert_eq!(times, vec![100, 200, 300]);
        assert_eq!(index.first().map(|e| e.ts), Some(100));
        assert_eq!(index.last().map(|e| e.ts), Some(300));
    }

    #[test]
    fn test_boundary_queries() {
        let index = texts();
        assert_eq!(index.at_or_before(200).map(|e| e.ts), Some(200));
        assert_eq!(index.strictly_before(200).map(|e| e.ts), Some(100));
        assert_eq!(index.at_or_after(200).map(|e| e.ts), Some(200));
        assert_eq!(index.strictly_after(200).map(|e| e.ts), Some(300));

        assert_eq!(index.at_or_before(150).map(|e| e.ts), Some(100));
        assert_eq!(index.at_or_after(150).map(|e| e.ts), Some(200));
    }

    #[test]
    fn test_out_of_range_queries() {
        let index = texts();
        assert!(index.at_or_before(99).is_none());
        assert!(index.strictly_before(100).is_none());
        assert!(index.at_or_after(301).is_none());
        assert!(index.strictly_after(300).is_none());
        assert_eq!(index.value_at_or_before(0), "");
        assert_eq!(index.text_strictly_before(100), "");
        assert_eq!(index.value_at_or_after(1000), "");
    }

    #[test]
    fn test_value_and_text_variants_agree() {
        let index = texts();
        assert_eq!(index.value_at_or_before(250), "ab");
        assert_eq!(index.text_at_or_before(250), "ab");
        assert_eq!(index.value_strictly_before(300), "ab");
        assert_eq!(index.text_strictly_before(300), "ab");
        assert_eq!(index.value_strictly_after(100), "ab");
    }

    #[test]
    fn test_tail_from_timestamp() {
        let index = texts();
        let tail: Vec<i64> = index.since(200).iter().map(|e| e.ts).collect();
        assert_eq!(tail, vec![200, 300]);
        assert!(index.since(301).is_empty());
    }

    #[test]
    fn test_window_membership() {
        let index = SnapshotIndex::new(vec![Entry { ts: 1000, value: () }]);
        assert!(index.any_within(1030, 30));
        assert!(index.any_within(970, 30));
        assert!(!index.any_within(1031, 30));
        assert!(!index.any_within(969, 30));
    }

    #[test]
    fn test_parse_counts_rejections() {
        let records: std::collections::BTreeMap<i64, String> = [
            (1, "5".to_string()),
            (2, "x".to_string()),
            (3, "7".to_string()),
        ]
        .into_iter()
        .collect();
        let (index, skipped) = SnapshotIndex::parse(&records, |p| p.parse::<u32>().ok());
        assert_eq!(index.len(), 2);
        assert_eq!(skipped, 1);
        assert_eq!(index.value_at_or_before(2), 5);
    }
}
