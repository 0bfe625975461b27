//! Backing sequence: every entry of the map lives in one doubly-linked list
//! whose nodes are stored in a generational arena.
//!
//! The list knows nothing about buckets. Callers link a node before a known
//! position (or at the tail) and unlink nodes by position; both are O(1).

use core::ops::{Index, IndexMut};
use slotmap::{DefaultKey, SlotMap};

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    pub(crate) prev: Option<DefaultKey>,
    pub(crate) next: Option<DefaultKey>,
}

#[derive(Debug)]
pub(crate) struct Sequence<K, V> {
    slots: SlotMap<DefaultKey, Node<K, V>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<K, V> Sequence<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn head(&self) -> Option<DefaultKey> {
        self.head
    }

    pub(crate) fn get(&self, pos: DefaultKey) -> Option<&Node<K, V>> {
        self.slots.get(pos)
    }

    pub(crate) fn get_mut(&mut self, pos: DefaultKey) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(pos)
    }

    pub(crate) fn contains(&self, pos: DefaultKey) -> bool {
        self.slots.contains_key(pos)
    }

    /// Link a new node immediately before `before`, or at the tail when
    /// `before` is `None`. Returns the new node's position.
    pub(crate) fn insert_before(
        &mut self,
        before: Option<DefaultKey>,
        key: K,
        value: V,
        hash: u64,
    ) -> DefaultKey {
        let prev = match before {
            Some(b) => {
                debug_assert!(self.slots.contains_key(b), "stale insertion point");
                self.slots.get(b).and_then(|n| n.prev)
            }
            None => self.tail,
        };
        let pos = self.slots.insert(Node {
            key,
            value,
            hash,
            prev,
            next: before,
        });

        match prev.and_then(|p| self.slots.get_mut(p)) {
            Some(p) => p.next = Some(pos),
            None => self.head = Some(pos),
        }
        match before.and_then(|b| self.slots.get_mut(b)) {
            Some(b) => b.prev = Some(pos),
            None => self.tail = Some(pos),
        }
        pos
    }

    /// Unlink the node at `pos` and hand it back. Its `next` field still
    /// names the position that followed it.
    pub(crate) fn remove(&mut self, pos: DefaultKey) -> Option<Node<K, V>> {
        let node = self.slots.remove(pos)?;
        match node.prev.and_then(|p| self.slots.get_mut(p)) {
            Some(p) => p.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|n| self.slots.get_mut(n)) {
            Some(n) => n.prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node)
    }

    pub(crate) fn pop_front(&mut self) -> Option<Node<K, V>> {
        let head = self.head?;
        self.remove(head)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    /// All nodes in arena order (not sequence order).
    pub(crate) fn nodes_mut(
        &mut self,
    ) -> slotmap::basic::IterMut<'_, DefaultKey, Node<K, V>> {
        self.slots.iter_mut()
    }

    /// Consume the sequence, yielding nodes front to back.
    pub(crate) fn into_nodes(self) -> IntoNodes<K, V> {
        IntoNodes { seq: self }
    }

    /// Walks both directions and panics on any broken link.
    #[cfg(test)]
    pub(crate) fn check_links(&self) {
        let mut prev = None;
        let mut cur = self.head;
        let mut seen = 0usize;
        while let Some(pos) = cur {
            let node = self.slots.get(pos).expect("forward link to a live node");
            assert_eq!(node.prev, prev, "back link mismatch");
            seen += 1;
            assert!(seen <= self.slots.len(), "cycle in sequence");
            prev = Some(pos);
            cur = node.next;
        }
        assert_eq!(prev, self.tail, "tail mismatch");
        assert_eq!(seen, self.slots.len(), "unreachable nodes in arena");
    }
}

impl<K, V> Index<DefaultKey> for Sequence<K, V> {
    type Output = Node<K, V>;

    fn index(&self, pos: DefaultKey) -> &Node<K, V> {
        &self.slots[pos]
    }
}

impl<K, V> IndexMut<DefaultKey> for Sequence<K, V> {
    fn index_mut(&mut self, pos: DefaultKey) -> &mut Node<K, V> {
        &mut self.slots[pos]
    }
}

pub(crate) struct IntoNodes<K, V> {
    seq: Sequence<K, V>,
}

impl<K, V> IntoNodes<K, V> {
    pub(crate) fn len(&self) -> usize {
        self.seq.len()
    }
}

impl<K, V> Iterator for IntoNodes<K, V> {
    type Item = Node<K, V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.seq.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.seq.len(), Some(self.seq.len()))
    }
}
