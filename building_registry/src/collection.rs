/// Building Registry v1: Ordered Keyed Collection
///
/// A `BTreeMap` behind a create-once API. Iteration order is key order,
/// which keeps hashing and replay deterministic.
///
/// Serde form is a list of `{"key": .., "record": ..}` entries so that
/// structured keys survive JSON. Duplicate keys are rejected on decode.

use std::borrow::Borrow;
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::ops::RangeBounds;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection<K: Ord, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Ord, V> Default for Collection<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V> Collection<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.get_mut(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Insert only if the key is absent. Returns `false` (and drops
    /// `value`) when the key is already present.
    pub fn insert_new(&mut self, key: K, value: V) -> bool {
        match self.entries.entry(key) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, K, V> {
        self.entries.keys()
    }

    pub fn range<R>(&self, range: R) -> btree_map::Range<'_, K, V>
    where
        R: RangeBounds<K>,
    {
        self.entries.range(range)
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a Collection<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = btree_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Serialize)]
struct EntryRef<'a, K, V> {
    key: &'a K,
    record: &'a V,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Entry<K, V> {
    key: K,
    record: V,
}

impl<K, V> Serialize for Collection<K, V>
where
    K: Ord + Serialize,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.entries
                .iter()
                .map(|(key, record)| EntryRef { key, record }),
        )
    }
}

impl<'de, K, V> Deserialize<'de> for Collection<K, V>
where
    K: Ord + fmt::Display + Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<Entry<K, V>>::deserialize(deserializer)?;
        let mut collection = Collection::new();
        for Entry { key, record } in raw {
            if collection.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key {}", key)));
            }
            collection.insert_new(key, record);
        }
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_new_refuses_existing_key() {
        let mut c: Collection<String, u64> = Collection::new();
        assert!(c.insert_new("a".to_string(), 1));
        assert!(!c.insert_new("a".to_string(), 2));
        assert_eq!(c.get("a"), Some(&1));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn serde_form_is_an_entry_list() {
        let mut c: Collection<String, u64> = Collection::new();
        c.insert_new("b".to_string(), 2);
        c.insert_new("a".to_string(), 1);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"[{"key":"a","record":1},{"key":"b","record":2}]"#);
        let back: Collection<String, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn duplicate_keys_fail_to_decode() {
        let json = r#"[{"key":"a","record":1},{"key":"a","record":2}]"#;
        let err = serde_json::from_str::<Collection<String, u64>>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate key a"));
    }
}
