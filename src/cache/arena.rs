//! Entry Arena Module
//!
//! Owns every cache entry in a slot vector. Entries are addressed by stable
//! [`EntryId`] handles, and each entry carries one link pair per [`Role`] so
//! that the recency and expiration lists can thread through the same storage.

use std::ops::{Index, IndexMut};
use std::time::Instant;

use crate::cache::list::{Role, ROLE_COUNT};

// == Entry Handle ==
/// Stable index of an entry inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

// == Links ==
/// Previous/next handles for one role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    pub prev: Option<EntryId>,
    pub next: Option<EntryId>,
}

// == Cache Entry ==
/// A single cached value with its expiration instant and per-role links.
#[derive(Debug)]
pub struct Entry<K, V> {
    /// Key this entry is stored under
    pub key: K,
    /// The stored value
    pub value: V,
    /// Instant at which the entry stops being served
    pub expires_at: Instant,
    links: [Links; ROLE_COUNT],
}

impl<K, V> Entry<K, V> {
    /// Creates a detached entry.
    pub fn new(key: K, value: V, expires_at: Instant) -> Self {
        Self {
            key,
            value,
            expires_at,
            links: [Links::default(); ROLE_COUNT],
        }
    }

    /// Boundary condition: an entry is expired once `now` reaches `expires_at`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiration, zero once expired.
    pub fn ttl_remaining(&self, now: Instant) -> std::time::Duration {
        self.expires_at.saturating_duration_since(now)
    }

    pub fn links(&self, role: Role) -> &Links {
        &self.links[role.index()]
    }

    pub fn links_mut(&mut self, role: Role) -> &mut Links {
        &mut self.links[role.index()]
    }
}

// == Arena ==
/// Slot storage for entries with a free list for slot reuse.
#[derive(Debug)]
pub struct Arena<K, V> {
    slots: Vec<Option<Entry<K, V>>>,
    free: Vec<usize>,
    len: usize,
}

impl<K, V> Arena<K, V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Stores an entry and returns its handle.
    pub fn insert(&mut self, entry: Entry<K, V>) -> EntryId {
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                EntryId(slot)
            }
            None => {
                self.slots.push(Some(entry));
                EntryId(self.slots.len() - 1)
            }
        }
    }

    /// Takes an entry out of the arena, freeing its slot.
    ///
    /// The entry must already be unlinked from every list.
    pub fn remove(&mut self, id: EntryId) -> Entry<K, V> {
        match self.slots.get_mut(id.0).and_then(Option::take) {
            Some(entry) => {
                self.len -= 1;
                self.free.push(id.0);
                entry
            }
            None => panic!("arena: remove of vacant slot {}", id.0),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Drops every entry. Outstanding handles become invalid.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
    }
}

impl<K, V> Index<EntryId> for Arena<K, V> {
    type Output = Entry<K, V>;

    fn index(&self, id: EntryId) -> &Self::Output {
        match self.slots.get(id.0) {
            Some(Some(entry)) => entry,
            _ => panic!("arena: dangling entry handle {}", id.0),
        }
    }
}

impl<K, V> IndexMut<EntryId> for Arena<K, V> {
    fn index_mut(&mut self, id: EntryId) -> &mut Self::Output {
        match self.slots.get_mut(id.0) {
            Some(Some(entry)) => entry,
            _ => panic!("arena: dangling entry handle {}", id.0),
        }
    }
}
