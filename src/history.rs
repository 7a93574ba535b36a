use std::collections::VecDeque;

use crate::types::HistoryItem;

/// Log of completed requests, most recent first.
///
/// Recording prepends in O(1). There is no deduplication and no cap; entries
/// recorded later always come before earlier ones, even with equal times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStore {
    items: VecDeque<HistoryItem>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a snapshot that is already ordered most-recent-first.
    pub fn from_recent(items: Vec<HistoryItem>) -> Self {
        Self {
            items: items.into(),
        }
    }

    pub fn record(&mut self, item: HistoryItem) {
        self.items.push_front(item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Remove the entry at `index`; out-of-range indices are ignored.
    pub fn remove_at(&mut self, index: usize) -> Option<HistoryItem> {
        self.items.remove(index)
    }

    pub fn get(&self, index: usize) -> Option<&HistoryItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HttpMethod;
    use pretty_assertions::assert_eq;

    fn item(url: &str, time: u64) -> HistoryItem {
        HistoryItem {
            method: HttpMethod::GET,
            url: url.to_string(),
            time,
            status: 200,
            status_text: "OK".to_string(),
        }
    }

    fn urls(store: &HistoryStore) -> Vec<&str> {
        store.iter().map(|i| i.url.as_str()).collect()
    }

    #[test]
    fn test_record_is_most_recent_first() {
        let mut store = HistoryStore::new();
        store.record(item("a", 1));
        store.record(item("b", 1));
        store.record(item("c", 1));
        assert_eq!(urls(&store), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut store = HistoryStore::new();
        store.record(item("a", 5));
        store.record(item("a", 5));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_at() {
        let mut store = HistoryStore::from_recent(vec![item("c", 1), item("b", 1), item("a", 1)]);
        assert_eq!(store.remove_at(1).map(|i| i.url), Some("b".to_string()));
        assert_eq!(urls(&store), vec!["c", "a"]);
        assert_eq!(store.remove_at(9), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut store = HistoryStore::from_recent(vec![item("a", 1)]);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.get(0), None);
    }
}
