//! Bucket index: one `(anchor, count)` slot per bucket.
//!
//! A bucket owns `count` consecutive nodes of the backing sequence starting
//! at `anchor`. An empty bucket has no anchor.

use slotmap::DefaultKey;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Bucket {
    pub(crate) anchor: Option<DefaultKey>,
    pub(crate) count: usize,
}

impl Bucket {
    /// Record a node linked directly in front of the current anchor.
    #[inline]
    pub(crate) fn push_front(&mut self, pos: DefaultKey) {
        self.anchor = Some(pos);
        self.count += 1;
    }

    /// Record the removal of the node `offset` places into the run; `next`
    /// is the sequence position that followed it.
    #[inline]
    pub(crate) fn unlink(&mut self, offset: usize, next: Option<DefaultKey>) {
        debug_assert!(offset < self.count);
        if offset == 0 {
            self.anchor = next;
        }
        self.count -= 1;
        if self.count == 0 {
            self.anchor = None;
        }
    }
}

#[derive(Debug)]
pub(crate) struct BucketIndex {
    slots: Vec<Bucket>,
}

impl BucketIndex {
    /// Capacity is clamped to at least one bucket.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Bucket::default(); capacity.max(1)],
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn index_of(&self, hash: u64) -> usize {
        (hash % self.slots.len() as u64) as usize
    }

    #[inline]
    pub(crate) fn get(&self, bucket: usize) -> Bucket {
        self.slots[bucket]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, bucket: usize) -> &mut Bucket {
        &mut self.slots[bucket]
    }

    pub(crate) fn reset(&mut self, bucket: usize) {
        self.slots[bucket] = Bucket::default();
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &Bucket)> {
        self.slots.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn capacity_is_never_zero() {
        assert_eq!(BucketIndex::new(0).capacity(), 1);
        assert_eq!(BucketIndex::new(8).capacity(), 8);
    }

    #[test]
    fn index_wraps_modulo_capacity() {
        let idx = BucketIndex::new(4);
        assert_eq!(idx.index_of(0), 0);
        assert_eq!(idx.index_of(5), 1);
        assert_eq!(idx.index_of(u64::MAX), 3);
    }

    /// Invariant: removing the anchor advances it; removing an interior node
    /// leaves it; emptying the run clears it.
    #[test]
    fn unlink_moves_anchor_only_from_front() {
        let mut arena: SlotMap<DefaultKey, ()> = SlotMap::new();
        let (a, b, c) = (arena.insert(()), arena.insert(()), arena.insert(()));

        let mut bucket = Bucket::default();
        bucket.push_front(c);
        bucket.push_front(b);
        bucket.push_front(a);
        assert_eq!(
            bucket,
            Bucket {
                anchor: Some(a),
                count: 3
            }
        );

        bucket.unlink(1, Some(c));
        assert_eq!(
            bucket,
            Bucket {
                anchor: Some(a),
                count: 2
            }
        );

        bucket.unlink(0, Some(c));
        assert_eq!(
            bucket,
            Bucket {
                anchor: Some(c),
                count: 1
            }
        );

        bucket.unlink(0, None);
        assert_eq!(bucket, Bucket::default());
    }

    /// Invariant: a run ending mid-sequence still clears its anchor at zero.
    #[test]
    fn last_unlink_clears_anchor_even_with_successor() {
        let mut arena: SlotMap<DefaultKey, ()> = SlotMap::new();
        let (a, other) = (arena.insert(()), arena.insert(()));
        let mut idx = BucketIndex::new(2);
        idx.get_mut(1).push_front(a);
        idx.get_mut(1).unlink(0, Some(other));
        assert_eq!(idx.get(1), Bucket::default());
        idx.get_mut(0).push_front(other);
        idx.reset(0);
        assert_eq!(idx.get(0), Bucket::default());
    }
}
