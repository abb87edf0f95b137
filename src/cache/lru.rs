//! Recency List Module
//!
//! Keeps entries in least to most recently used order for cache eviction.

use crate::cache::arena::{Arena, EntryId};
use crate::cache::list::{Iter, Role, RoleList};

// == Recency List ==
/// Tracks access order for LRU eviction strategy.
///
/// Entries are threaded through the arena where:
/// - Head = Least recently used
/// - Tail = Most recently used
#[derive(Debug)]
pub struct RecencyList {
    list: RoleList,
}

impl RecencyList {
    // == Constructor ==
    /// Creates a new empty recency list.
    pub fn new() -> Self {
        Self {
            list: RoleList::new(Role::Recency),
        }
    }

    // == Insert ==
    /// Records a new entry as the most recently used.
    pub fn insert<K, V>(&mut self, arena: &mut Arena<K, V>, id: EntryId) {
        self.list.push_back(arena, id);
    }

    // == Touch ==
    /// Marks a linked entry as recently used (moves to tail).
    pub fn touch<K, V>(&mut self, arena: &mut Arena<K, V>, id: EntryId) {
        if self.list.peek_last() == Some(id) {
            return;
        }
        self.list.remove(arena, id);
        self.list.push_back(arena, id);
    }

    // == Remove ==
    /// Removes an entry from the tracker.
    pub fn remove<K, V>(&mut self, arena: &mut Arena<K, V>, id: EntryId) {
        self.list.remove(arena, id);
    }

    // == Evict Oldest ==
    /// Detaches and returns the least recently used entry.
    ///
    /// Returns None if the list is empty.
    pub fn evict_oldest<K, V>(&mut self, arena: &mut Arena<K, V>) -> Option<EntryId> {
        self.list.remove_first(arena)
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Entries from least to most recently used.
    pub fn iter<'a, K, V>(&'a self, arena: &'a Arena<K, V>) -> Iter<'a, K, V> {
        self.list.iter(arena)
    }
}

impl Default for RecencyList {
    fn default() -> Self {
        Self::new()
    }
}
