//! Generic keyed store with stable integer indices.

use std::collections::HashMap;

/// Maps string keys to values while assigning each key a stable integer
/// index at first insertion. Re-putting a key replaces its value but
/// keeps its index; indices are never reused for the lifetime of the
/// process.
#[derive(Debug, Clone)]
pub struct IndexedAssetMap<V> {
    values: HashMap<String, (u32, V)>,
    keys_by_index: Vec<String>,
}

impl<V> Default for IndexedAssetMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IndexedAssetMap<V> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            keys_by_index: Vec::new(),
        }
    }

    /// Insert or replace. Returns the key's index.
    pub fn put(&mut self, key: impl Into<String>, value: V) -> u32 {
        let key = key.into();
        if let Some((index, slot)) = self.values.get_mut(&key) {
            *slot = value;
            return *index;
        }
        let index = self.keys_by_index.len() as u32;
        self.keys_by_index.push(key.clone());
        self.values.insert(key, (index, value));
        index
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.values.get(key).map(|(_, value)| value)
    }

    pub fn index_of(&self, key: &str) -> Option<u32> {
        self.values.get(key).map(|(index, _)| *index)
    }

    pub fn key_of(&self, index: u32) -> Option<&str> {
        self.keys_by_index.get(index as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// One past the highest assigned index.
    pub fn max_id(&self) -> u32 {
        self.keys_by_index.len() as u32
    }

    /// Entries in index order.
    pub fn iter_indexed(&self) -> impl Iterator<Item = (u32, &str, &V)> {
        self.keys_by_index.iter().map(|key| {
            let (index, value) = &self.values[key];
            (*index, key.as_str(), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_call_order() {
        let mut map = IndexedAssetMap::new();
        assert_eq!(map.put("foo", 1), 0);
        assert_eq!(map.put("bar", 2), 1);
        assert_eq!(map.put("baz", 3), 2);
        assert_eq!(map.index_of("foo"), Some(0));
        assert_eq!(map.index_of("baz"), Some(2));
    }

    #[test]
    fn reput_preserves_index_and_count() {
        let mut map = IndexedAssetMap::new();
        map.put("foo", 1);
        map.put("bar", 2);
        map.put("baz", 3);
        assert_eq!(map.put("foo", 42), 0);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("foo"), Some(&42));
    }

    #[test]
    fn max_id_is_next_unassigned() {
        let mut map = IndexedAssetMap::new();
        assert_eq!(map.max_id(), 0);
        map.put("a", ());
        map.put("b", ());
        assert_eq!(map.max_id(), 2);
        map.put("a", ());
        assert_eq!(map.max_id(), 2);
    }

    #[test]
    fn reverse_lookup() {
        let mut map = IndexedAssetMap::new();
        map.put("first", 'x');
        map.put("second", 'y');
        assert_eq!(map.key_of(0), Some("first"));
        assert_eq!(map.key_of(1), Some("second"));
        assert_eq!(map.key_of(2), None);
    }

    #[test]
    fn iteration_is_index_ordered() {
        let mut map = IndexedAssetMap::new();
        map.put("zebra", 0);
        map.put("apple", 1);
        map.put("mango", 2);
        let order: Vec<_> = map.iter_indexed().map(|(i, k, _)| (i, k.to_owned())).collect();
        assert_eq!(
            order,
            vec![(0, "zebra".into()), (1, "apple".into()), (2, "mango".into())]
        );
    }
}
