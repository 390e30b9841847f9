//! PDF dictionary object.

use indexmap::IndexMap;

use crate::objects::{Name, Object};

/// Name-keyed mapping. Lookup is order-insensitive, but insertion order is
/// preserved so serialization is stable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    entries: IndexMap<Name, Object>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<Name>, value: impl Into<Object>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Object)> {
        self.entries.iter()
    }

    /// Convenience for the `/Type` entry.
    pub fn type_name(&self) -> Option<&str> {
        self.get("Type").and_then(Object::as_name).map(Name::as_str)
    }
}

impl FromIterator<(Name, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (Name, Object)>>(iter: T) -> Self {
        Dictionary {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::name("Page"));
        dict.set("Count", 3i64);
        assert_eq!(dict.get("Count").and_then(Object::as_integer), Some(3));
        assert_eq!(dict.type_name(), Some("Page"));
        assert!(dict.get("Missing").is_none());
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut a = Dictionary::new();
        a.set("A", 1i64);
        a.set("B", 2i64);
        let mut b = Dictionary::new();
        b.set("B", 2i64);
        b.set("A", 1i64);
        assert_eq!(a, b);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut dict = Dictionary::new();
        dict.set("Z", 1i64);
        dict.set("A", 2i64);
        let keys: Vec<&str> = dict.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Z", "A"]);
    }

    #[test]
    fn test_remove() {
        let mut dict = Dictionary::new();
        dict.set("First", 1i64);
        assert!(dict.remove("First").is_some());
        assert!(dict.is_empty());
    }
}
