//! Arena storage for visual entities.

use super::edge::{EdgeKey, VisualEdge};
use super::node::{NodeKey, VisualNode};
use slotmap::{Key, SlotMap};
use std::collections::HashMap;

/// Entities addressable by a string id.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for VisualNode {
    fn id(&self) -> &str {
        VisualNode::id(self)
    }
}

impl Identified for VisualEdge {
    fn id(&self) -> &str {
        VisualEdge::id(self)
    }
}

/// Owning table of entities with an id index and a draw order.
///
/// Structural changes (insert/remove) are reserved to the reconciler; other
/// code gets `get_mut` access, which cannot change an entity's id.
#[derive(Debug, Clone)]
pub struct EntityTable<K: Key, T> {
    slots: SlotMap<K, T>,
    index: HashMap<String, K>,
    /// Draw order, back to front.
    order: Vec<K>,
}

pub type NodeTable = EntityTable<NodeKey, VisualNode>;
pub type EdgeTable = EntityTable<EdgeKey, VisualEdge>;

impl<K: Key, T: Identified> Default for EntityTable<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, T: Identified> EntityTable<K, T> {
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            index: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, key: K) -> Option<&T> {
        self.slots.get(key)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.slots.get_mut(key)
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.slots.contains_key(key)
    }

    /// Key of the entity with the given id.
    pub fn key_of(&self, id: &str) -> Option<K> {
        self.index.get(id).copied()
    }

    pub fn by_id(&self, id: &str) -> Option<&T> {
        self.key_of(id).and_then(|key| self.slots.get(key))
    }

    pub fn by_id_mut(&mut self, id: &str) -> Option<&mut T> {
        let key = self.key_of(id)?;
        self.slots.get_mut(key)
    }

    /// Entities in draw order (back to front).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (K, &T)> + '_ {
        self.order
            .iter()
            .filter_map(move |&key| self.slots.get(key).map(|value| (key, value)))
    }

    /// Mutable access to every entity, in no particular order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> + '_ {
        self.slots.iter_mut()
    }

    pub(crate) fn insert(&mut self, value: T) -> K {
        let id = value.id().to_string();
        let key = self.slots.insert(value);
        if let Some(previous) = self.index.insert(id, key) {
            // Ids are validated before insertion; keep the table consistent anyway.
            self.slots.remove(previous);
            self.order.retain(|&k| k != previous);
        }
        self.order.push(key);
        key
    }

    pub(crate) fn remove(&mut self, key: K) -> Option<T> {
        let value = self.slots.remove(key)?;
        self.index.remove(value.id());
        self.order.retain(|&k| k != key);
        Some(value)
    }

    /// Remove every entity for which `keep` returns false.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(K, &T) -> bool) -> Vec<T> {
        let doomed: Vec<K> = self
            .order
            .iter()
            .copied()
            .filter(|&key| self.slots.get(key).is_some_and(|value| !keep(key, value)))
            .collect();
        doomed.into_iter().filter_map(|key| self.remove(key)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeDef;
    use kurbo::Point;
    use std::sync::Arc;

    fn node(id: &str) -> VisualNode {
        VisualNode::new(Arc::new(NodeDef::new(id)), 10.0, Point::ZERO)
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = NodeTable::new();
        let a = table.insert(node("a"));
        let b = table.insert(node("b"));

        assert_eq!(table.len(), 2);
        assert_eq!(table.key_of("a"), Some(a));
        assert_eq!(table.by_id("b").map(|n| n.id()), Some("b"));
        let order: Vec<_> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_remove_invalidates_key() {
        let mut table = NodeTable::new();
        let a = table.insert(node("a"));
        assert!(table.remove(a).is_some());
        assert!(!table.contains_key(a));
        assert!(table.key_of("a").is_none());

        // A new entity with the same id gets a fresh key.
        let a2 = table.insert(node("a"));
        assert_ne!(a, a2);
    }

    #[test]
    fn test_retain() {
        let mut table = NodeTable::new();
        table.insert(node("a"));
        table.insert(node("b"));
        table.insert(node("c"));

        let removed = table.retain(|_, n| n.id() != "b");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id(), "b");
        let ids: Vec<_> = table.iter().map(|(_, n)| n.id().to_string()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
