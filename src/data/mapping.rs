//! Ordered tag → value mapping.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// Flat association of tag name to string value.
///
/// Keeps document order of first appearance so that sampling for the
/// generator and JSON serialization are deterministic. Re-inserting an
/// existing tag replaces its value in place (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataMapping {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl DataMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value.
    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        let tag = tag.into();
        let value = value.into();
        match self.index.get(&tag) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(tag.clone(), self.entries.len());
                self.entries.push((tag, value));
            }
        }
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.index.get(tag).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.index.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The first `limit` entries in document order.
    pub fn sample(&self, limit: usize) -> DataMapping {
        self.iter().take(limit).collect()
    }

    /// Compact JSON object, as fed to rule artifacts on stdin.
    pub fn to_json(&self) -> String {
        // Serializing string pairs into a String cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Indented JSON object, as embedded in generation prompts.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DataMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = DataMapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl Serialize for DataMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
