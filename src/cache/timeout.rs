//! Expiration List Module
//!
//! Keeps entries ordered by expiration instant so that expired entries are
//! always found at the head.

use std::time::Instant;

use crate::cache::arena::{Arena, EntryId};
use crate::cache::list::{Role, RoleList};

// == Expiration List ==
/// Entries ordered ascending by `expires_at`.
///
/// Insertion scans backward from the tail. TTLs usually arrive in
/// non-decreasing order, which makes the common case O(1); an entry that
/// expires before everything already queued costs O(n).
#[derive(Debug)]
pub struct ExpirationList {
    list: RoleList,
}

impl ExpirationList {
    pub fn new() -> Self {
        Self {
            list: RoleList::new(Role::Expiration),
        }
    }

    // == Insert ==
    /// Links a detached entry at its sorted position.
    ///
    /// Entries sharing an expiration instant keep their arrival order.
    pub fn insert<K, V>(&mut self, arena: &mut Arena<K, V>, id: EntryId) {
        let expires_at = arena[id].expires_at;
        let mut anchor = self.list.peek_last();
        while let Some(current) = anchor {
            if arena[current].expires_at <= expires_at {
                break;
            }
            anchor = self.list.prev(arena, current);
        }
        self.list.insert_after(arena, anchor, id);
    }

    pub fn remove<K, V>(&mut self, arena: &mut Arena<K, V>, id: EntryId) {
        self.list.remove(arena, id);
    }

    /// Re-sorts an entry whose `expires_at` changed in place.
    pub fn reposition<K, V>(&mut self, arena: &mut Arena<K, V>, id: EntryId) {
        self.list.remove(arena, id);
        self.insert(arena, id);
    }

    /// Detaches the head if it has expired by `now`.
    pub fn pop_expired<K, V>(&mut self, arena: &mut Arena<K, V>, now: Instant) -> Option<EntryId> {
        let head = self.list.peek_first()?;
        if !arena[head].is_expired(now) {
            return None;
        }
        self.list.remove_first(arena)
    }

    /// Instant at which the head expires.
    pub fn next_deadline<K, V>(&self, arena: &Arena<K, V>) -> Option<Instant> {
        self.list.peek_first().map(|id| arena[id].expires_at)
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Entries from soonest to latest expiration.
    #[cfg(test)]
    pub fn iter<'a, K, V>(&'a self, arena: &'a Arena<K, V>) -> crate::cache::list::Iter<'a, K, V> {
        self.list.iter(arena)
    }
}

impl Default for ExpirationList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::arena::Entry;
    use std::time::Duration;

    struct Fixture {
        base: Instant,
        arena: Arena<&'static str, ()>,
        list: ExpirationList,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                arena: Arena::with_capacity(8),
                list: ExpirationList::new(),
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.base + Duration::from_millis(ms)
        }

        fn add(&mut self, key: &'static str, ms: u64) -> EntryId {
            let id = self.arena.insert(Entry::new(key, (), self.at(ms)));
            self.list.insert(&mut self.arena, id);
            id
        }

        fn order(&self) -> Vec<&'static str> {
            self.list.iter(&self.arena).map(|id| self.arena[id].key).collect()
        }
    }

    #[test]
    fn test_insert_in_arrival_order() {
        let mut f = Fixture::new();
        f.add("a", 10);
        f.add("b", 20);
        f.add("c", 30);
        assert_eq!(f.order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_out_of_order_sorts() {
        let mut f = Fixture::new();
        f.add("late", 30);
        f.add("early", 10);
        f.add("middle", 20);
        f.add("latest", 40);
        assert_eq!(f.order(), vec!["early", "middle", "late", "latest"]);
        assert_eq!(f.list.len(), 4);
    }

    #[test]
    fn test_equal_deadlines_keep_arrival_order() {
        let mut f = Fixture::new();
        f.add("first", 10);
        f.add("second", 10);
        f.add("before", 5);
        f.add("third", 10);
        assert_eq!(f.order(), vec!["before", "first", "second", "third"]);
    }

    #[test]
    fn test_reposition_after_deadline_change() {
        let mut f = Fixture::new();
        let a = f.add("a", 10);
        f.add("b", 20);
        f.add("c", 30);

        let later = f.at(25);
        f.arena[a].expires_at = later;
        f.list.reposition(&mut f.arena, a);

        assert_eq!(f.order(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_pop_expired_stops_at_live_head() {
        let mut f = Fixture::new();
        let a = f.add("a", 10);
        f.add("b", 20);

        let now = f.at(15);
        assert_eq!(f.list.pop_expired(&mut f.arena, now), Some(a));
        assert_eq!(f.list.pop_expired(&mut f.arena, now), None);
        assert_eq!(f.order(), vec!["b"]);
    }

    #[test]
    fn test_pop_expired_at_exact_deadline() {
        let mut f = Fixture::new();
        let a = f.add("a", 10);
        let now = f.at(10);
        assert_eq!(f.list.pop_expired(&mut f.arena, now), Some(a));
    }

    #[test]
    fn test_next_deadline() {
        let mut f = Fixture::new();
        assert_eq!(f.list.next_deadline(&f.arena), None);

        f.add("b", 20);
        f.add("a", 10);
        assert_eq!(f.list.next_deadline(&f.arena), Some(f.at(10)));
        assert_eq!(f.order()[0], "a");
    }
}
