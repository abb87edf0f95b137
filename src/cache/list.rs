//! Role List Module
//!
//! A doubly-linked list threaded through arena entries. Each list manipulates
//! only the link pair belonging to its [`Role`], so one entry can sit in the
//! recency list and the expiration list at the same time without being copied.
//! The list never owns entries; the arena does.

use crate::cache::arena::{Arena, EntryId};

/// Number of orderings an entry participates in.
pub const ROLE_COUNT: usize = 2;

// == Role ==
/// Which ordering a link pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Least recently used at the head, most recently used at the tail
    Recency,
    /// Soonest expiration at the head, latest at the tail
    Expiration,
}

impl Role {
    pub fn index(self) -> usize {
        match self {
            Role::Recency => 0,
            Role::Expiration => 1,
        }
    }
}

// == Role List ==
/// Intrusive list over arena entries for one role.
#[derive(Debug)]
pub struct RoleList {
    role: Role,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    len: usize,
}

impl RoleList {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn peek_first(&self) -> Option<EntryId> {
        self.head
    }

    pub fn peek_last(&self) -> Option<EntryId> {
        self.tail
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Handle preceding `id` in this role's ordering.
    pub fn prev<K, V>(&self, arena: &Arena<K, V>, id: EntryId) -> Option<EntryId> {
        arena[id].links(self.role).prev
    }

    /// Handle following `id` in this role's ordering.
    pub fn next<K, V>(&self, arena: &Arena<K, V>, id: EntryId) -> Option<EntryId> {
        arena[id].links(self.role).next
    }

    // == Insert After ==
    /// Splices a detached entry in after `anchor`, or at the head when
    /// `anchor` is `None`.
    pub fn insert_after<K, V>(
        &mut self,
        arena: &mut Arena<K, V>,
        anchor: Option<EntryId>,
        id: EntryId,
    ) {
        let role = self.role;
        debug_assert_eq!(
            *arena[id].links(role),
            Default::default(),
            "entry already linked for {:?}",
            role
        );

        let next = match anchor {
            Some(anchor) => arena[anchor].links(role).next,
            None => self.head,
        };

        {
            let links = arena[id].links_mut(role);
            links.prev = anchor;
            links.next = next;
        }

        match anchor {
            Some(anchor) => arena[anchor].links_mut(role).next = Some(id),
            None => self.head = Some(id),
        }
        match next {
            Some(next) => arena[next].links_mut(role).prev = Some(id),
            None => self.tail = Some(id),
        }

        self.len += 1;
    }

    /// Appends a detached entry at the tail.
    pub fn push_back<K, V>(&mut self, arena: &mut Arena<K, V>, id: EntryId) {
        let tail = self.tail;
        self.insert_after(arena, tail, id);
    }

    // == Remove ==
    /// Unsplices an entry and clears its links for this role.
    ///
    /// The entry must currently be linked into this list; membership is
    /// tracked by the owner's lookup table.
    pub fn remove<K, V>(&mut self, arena: &mut Arena<K, V>, id: EntryId) {
        let role = self.role;
        let links = std::mem::take(arena[id].links_mut(role));
        debug_assert!(
            links.prev.is_some() || self.head == Some(id),
            "entry not linked for {:?}",
            role
        );

        match links.prev {
            Some(prev) => arena[prev].links_mut(role).next = links.next,
            None => self.head = links.next,
        }
        match links.next {
            Some(next) => arena[next].links_mut(role).prev = links.prev,
            None => self.tail = links.prev,
        }

        self.len -= 1;
    }

    /// Detaches and returns the head entry.
    pub fn remove_first<K, V>(&mut self, arena: &mut Arena<K, V>) -> Option<EntryId> {
        let head = self.head?;
        self.remove(arena, head);
        Some(head)
    }

    /// Forgets every entry without walking them.
    ///
    /// Only valid when the arena is cleared at the same time.
    pub fn clear(&mut self) {
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Handles from head to tail.
    pub fn iter<'a, K, V>(&'a self, arena: &'a Arena<K, V>) -> Iter<'a, K, V> {
        Iter {
            list: self,
            arena,
            cursor: self.head,
        }
    }
}

// == Iterator ==
/// Head-to-tail traversal of a role list.
pub struct Iter<'a, K, V> {
    list: &'a RoleList,
    arena: &'a Arena<K, V>,
    cursor: Option<EntryId>,
}

impl<K, V> Iterator for Iter<'_, K, V> {
    type Item = EntryId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        self.cursor = self.list.next(self.arena, current);
        Some(current)
    }
}
