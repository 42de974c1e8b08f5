//! Name to action lookup.

use std::collections::HashMap;

use crate::ActionId;

/// Registered clips in registration order, addressable by name.
#[derive(Debug, Default, Clone)]
pub struct ClipRegistry {
    entries: Vec<(String, ActionId)>,
    by_name: HashMap<String, usize>,
}

impl ClipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`. Returns `false`, leaving the registry untouched, if
    /// the name is already taken.
    pub fn insert(&mut self, name: impl Into<String>, action: ActionId) -> bool {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return false;
        }
        self.by_name.insert(name.clone(), self.entries.len());
        self.entries.push((name, action));
        true
    }

    pub fn get(&self, name: &str) -> Option<ActionId> {
        self.by_name.get(name).map(|&i| self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Reverse lookup.
    pub fn name_of(&self, action: ActionId) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, id)| *id == action)
            .map(|(name, _)| name.as_str())
    }

    /// Name registered at position `index`.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(name, _)| name.as_str())
    }

    pub fn first_name(&self) -> Option<&str> {
        self.name_at(0)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_name.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut registry = ClipRegistry::new();
        assert!(registry.insert("idle", ActionId(0)));
        assert!(registry.insert("wave", ActionId(1)));

        assert_eq!(registry.get("wave"), Some(ActionId(1)));
        assert_eq!(registry.name_of(ActionId(0)), Some("idle"));
        assert_eq!(registry.first_name(), Some("idle"));
        assert_eq!(registry.names().collect::<Vec<_>>(), ["idle", "wave"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ClipRegistry::new();
        assert!(registry.insert("idle", ActionId(0)));
        assert!(!registry.insert("idle", ActionId(1)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("idle"), Some(ActionId(0)));
    }

    #[test]
    fn test_clear() {
        let mut registry = ClipRegistry::new();
        registry.insert("idle", ActionId(0));
        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.contains("idle"));
        assert_eq!(registry.name_at(0), None);
    }
}
