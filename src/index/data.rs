//! Headword → entries multimap with exact and predictive lookup.

use fst::automaton::{Automaton, Str};
use fst::{IntoStreamer, Map, MapBuilder, Streamer};
use std::collections::BTreeMap;

use super::IndexEntry;
use crate::{Error, Result};

/// Mutable index under construction.
///
/// Keeps every `.idx` key in insertion order so that `.syn` records can
/// refer to them by position. Synonyms are added to the map only, never
/// to the positional key list.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    entries: BTreeMap<String, Vec<IndexEntry>>,
    keys: Vec<String>,
}

impl IndexBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an `.idx` record.
    ///
    /// Entries are appended under `key` in insertion order; nothing is ever
    /// overwritten or deduplicated.
    pub fn insert(&mut self, key: impl Into<String>, entry: IndexEntry) {
        let key = key.into();
        self.keys.push(key.clone());
        self.entries.entry(key).or_default().push(entry);
    }

    /// Insert an alias for the `.idx` key at position `index`.
    ///
    /// Only the first entry of the referenced key is propagated.
    pub fn add_synonym(&mut self, alias: impl Into<String>, index: i64) -> Result<()> {
        let alias = alias.into();
        let entry = usize::try_from(index)
            .ok()
            .and_then(|i| self.keys.get(i))
            .and_then(|key| self.first_entry(key));

        match entry {
            Some(entry) => {
                self.entries.entry(alias).or_default().push(entry);
                Ok(())
            }
            None => Err(Error::SynonymOutOfRange {
                alias,
                index,
                len: self.keys.len(),
            }),
        }
    }

    /// First entry stored under `key`.
    pub fn first_entry(&self, key: &str) -> Option<IndexEntry> {
        self.entries.get(key).and_then(|v| v.first()).copied()
    }

    /// Number of distinct keys, synonyms included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no key has been inserted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of positional `.idx` keys.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Freeze into an immutable, prefix-searchable index.
    pub fn build(self) -> Result<DictionaryIndex> {
        let mut builder = MapBuilder::memory();
        let mut slots = Vec::with_capacity(self.entries.len());

        // BTreeMap yields keys in byte order, as the FST requires
        for (key, entries) in self.entries {
            builder.insert(key.as_bytes(), slots.len() as u64)?;
            slots.push(entries);
        }

        Ok(DictionaryIndex {
            map: builder.into_map(),
            slots,
        })
    }
}

/// Immutable headword index.
///
/// Keys are stored in an FST whose values address per-key entry lists.
/// Lookups are case-sensitive and perform no normalization.
pub struct DictionaryIndex {
    map: Map<Vec<u8>>,
    slots: Vec<Vec<IndexEntry>>,
}

impl DictionaryIndex {
    /// All entries stored under exactly `word`, in insertion order.
    pub fn lookup_exact(&self, word: &str) -> Vec<(String, IndexEntry)> {
        match self.map.get(word) {
            Some(slot) => self.slots[slot as usize]
                .iter()
                .map(|entry| (word.to_string(), *entry))
                .collect(),
            None => Vec::new(),
        }
    }

    /// All entries of every key starting with `prefix`.
    ///
    /// Keys are visited in lexicographic order, entries within a key in
    /// insertion order. An empty prefix returns the whole index.
    pub fn lookup_predictive(&self, prefix: &str) -> Vec<(String, IndexEntry)> {
        let mut result = Vec::new();
        let mut stream = self
            .map
            .search(Str::new(prefix).starts_with())
            .into_stream();

        while let Some((key, slot)) = stream.next() {
            let key = String::from_utf8_lossy(key);
            for entry in &self.slots[slot as usize] {
                result.push((key.to_string(), *entry));
            }
        }

        result
    }

    /// Check whether `word` is a stored key.
    pub fn contains(&self, word: &str) -> bool {
        self.map.contains_key(word)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the index has no keys.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Total number of entries across all keys.
    pub fn entry_count(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }
}

impl std::fmt::Debug for DictionaryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictionaryIndex")
            .field("keys", &self.len())
            .field("entries", &self.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntryType;

    fn entry(offset: u64, length: u32) -> IndexEntry {
        IndexEntry::new(offset, length, EntryType::Mean)
    }

    fn sample_index() -> DictionaryIndex {
        let mut builder = IndexBuilder::new();
        builder.insert("ab", entry(0, 5));
        builder.insert("ac", entry(5, 4));
        builder.insert("b", entry(9, 3));
        builder.build().unwrap()
    }

    fn keys(results: &[(String, IndexEntry)]) -> Vec<&str> {
        results.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_exact_lookup() {
        let index = sample_index();
        assert_eq!(index.len(), 3);

        let found = index.lookup_exact("ab");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "ab");
        assert_eq!(found[0].1.offset, 0);
        assert_eq!(found[0].1.length, 5);
        assert_eq!(found[0].1.entry_type, EntryType::Mean);

        assert!(index.lookup_exact("a").is_empty());
        assert!(index.lookup_exact("abc").is_empty());
    }

    #[test]
    fn test_exact_lookup_is_case_sensitive() {
        let index = sample_index();
        assert!(index.lookup_exact("AB").is_empty());
        assert!(index.contains("ab"));
        assert!(!index.contains("Ab"));
    }

    #[test]
    fn test_predictive_lookup() {
        let index = sample_index();

        assert_eq!(keys(&index.lookup_predictive("a")), vec!["ab", "ac"]);
        assert_eq!(keys(&index.lookup_predictive("ab")), vec!["ab"]);
        assert!(index.lookup_predictive("c").is_empty());
        assert!(index.lookup_predictive("abc").is_empty());
        assert_eq!(keys(&index.lookup_predictive("")), vec!["ab", "ac", "b"]);
    }

    #[test]
    fn test_predictive_is_superset_of_exact() {
        let mut builder = IndexBuilder::new();
        builder.insert("term", entry(0, 1));
        builder.insert("term", entry(1, 1));
        builder.insert("terminal", entry(2, 1));
        builder.insert("terminology", entry(3, 1));
        builder.insert("tea", entry(4, 1));
        let index = builder.build().unwrap();

        let exact = index.lookup_exact("term");
        let predictive = index.lookup_predictive("term");
        for hit in &exact {
            assert!(predictive.contains(hit));
        }
        assert_eq!(
            keys(&predictive),
            vec!["term", "term", "terminal", "terminology"]
        );
    }

    #[test]
    fn test_duplicate_keys_preserve_order_and_repeats() {
        let mut builder = IndexBuilder::new();
        builder.insert("bank", entry(0, 10));
        builder.insert("bank", entry(10, 20));
        builder.insert("bank", entry(0, 10));
        let index = builder.build().unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.entry_count(), 3);

        let found = index.lookup_exact("bank");
        let offsets: Vec<u64> = found.iter().map(|(_, e)| e.offset).collect();
        assert_eq!(offsets, vec![0, 10, 0]);
    }

    #[test]
    fn test_synonym_takes_first_entry_only() {
        let mut builder = IndexBuilder::new();
        builder.insert("abandon", IndexEntry::new(0, 10, EntryType::Html));
        builder.insert("abandon", entry(10, 10));
        builder.add_synonym("abandoned", 1).unwrap();
        assert_eq!(builder.key_count(), 2);

        let index = builder.build().unwrap();
        let found = index.lookup_exact("abandoned");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1, entry(0, 10));
        assert_eq!(found[0].1.entry_type, EntryType::Html);
    }

    #[test]
    fn test_synonym_does_not_extend_positions() {
        let mut builder = IndexBuilder::new();
        builder.insert("a", entry(0, 1));
        builder.add_synonym("alpha", 0).unwrap();
        assert_eq!(builder.key_count(), 1);
        assert_eq!(builder.len(), 2);

        // position 1 would be "alpha" if synonyms were logged
        assert!(builder.add_synonym("aleph", 1).is_err());
    }

    #[test]
    fn test_synonym_on_existing_key_appends() {
        let mut builder = IndexBuilder::new();
        builder.insert("colour", entry(0, 3));
        builder.insert("color", entry(3, 3));
        builder.add_synonym("color", 0).unwrap();
        let index = builder.build().unwrap();

        let found = index.lookup_exact("color");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].1, entry(3, 3));
        assert_eq!(found[1].1, entry(0, 3));
    }

    #[test]
    fn test_unicode_prefix() {
        let mut builder = IndexBuilder::new();
        builder.insert("日本", entry(0, 1));
        builder.insert("日本語", entry(1, 1));
        builder.insert("中国", entry(2, 1));
        let index = builder.build().unwrap();

        assert_eq!(keys(&index.lookup_predictive("日")), vec!["日本", "日本語"]);
        assert_eq!(index.lookup_exact("中国").len(), 1);
    }

    #[test]
    fn test_empty_index() {
        let index = IndexBuilder::new().build().unwrap();
        assert!(index.is_empty());
        assert!(index.lookup_exact("x").is_empty());
        assert!(index.lookup_predictive("").is_empty());
    }
}
