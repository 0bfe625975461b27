//! Iterators over `ChainedHashMap`.
//!
//! All of them walk the backing sequence from head to tail, so entries of
//! one bucket come out next to each other. Nothing orders buckets relative
//! to each other.

use crate::sequence::{IntoNodes, Node, Sequence};
use core::iter::FusedIterator;
use slotmap::{DefaultKey, SecondaryMap};

/// Iterator over shared entries.
pub struct Iter<'a, K, V> {
    seq: &'a Sequence<K, V>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(seq: &'a Sequence<K, V>) -> Self {
        Self {
            seq,
            cur: seq.head(),
            remaining: seq.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq,
            cur: self.cur,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.seq.get(self.cur?)?;
        self.cur = node.next;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over entries with mutable values.
///
/// The arena hands out disjoint `&mut` borrows for every node up front; the
/// iterator then claims them in sequence order.
pub struct IterMut<'a, K, V> {
    nodes: SecondaryMap<DefaultKey, &'a mut Node<K, V>>,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(seq: &'a mut Sequence<K, V>) -> Self {
        let cur = seq.head();
        // One slot per live node: building this is O(n) and allocates.
        let mut nodes = SecondaryMap::with_capacity(seq.len());
        for (pos, node) in seq.nodes_mut() {
            nodes.insert(pos, node);
        }
        Self { nodes, cur }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let Node {
            key, value, next, ..
        } = self.nodes.remove(self.cur?)?;
        self.cur = *next;
        Some((&*key, value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.nodes.len(), Some(self.nodes.len()))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator; drains the map front to back.
pub struct IntoIter<K, V> {
    nodes: IntoNodes<K, V>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(seq: Sequence<K, V>) -> Self {
        Self {
            nodes: seq.into_nodes(),
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next().map(|n| (n.key, n.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.nodes.len(), Some(self.nodes.len()))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// Iterator over keys.
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over values.
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Iterator over mutable values.
pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}
