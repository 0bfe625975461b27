//! ChainedHashMap: separate chaining over one shared linked sequence.

use crate::bucket::BucketIndex;
use crate::error::KeyNotFound;
use crate::iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::sequence::Sequence;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::DefaultKey;
use tracing::trace;

/// Capacity multiplier applied on every rehash.
pub const GROWTH_FACTOR: usize = 2;

/// Position of an entry in the map's backing sequence.
///
/// Handles are plain data. A handle stops resolving once its entry is
/// removed, or once the map is rehashed or cleared. Using a handle with a
/// map other than the one that issued it gives an unspecified result.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle {
    pos: DefaultKey,
    epoch: u64,
}

impl Handle {
    pub fn key<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<&'a K>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        map.handle_entry(*self).map(|(k, _)| k)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<&'a V>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        map.handle_entry(*self).map(|(_, v)| v)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut ChainedHashMap<K, V, S>) -> Option<&'a mut V>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        map.handle_value_mut(*self)
    }

    pub fn entry<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<(&'a K, &'a V)>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        map.handle_entry(*self)
    }

    /// The following position in the sequence, or `None` at the end (or if
    /// this handle no longer resolves).
    pub fn next<K, V, S>(&self, map: &ChainedHashMap<K, V, S>) -> Option<Handle> {
        map.handle_next(*self)
    }
}

/// Where a key was found: its bucket, its offset inside the bucket's run,
/// and its sequence position.
#[derive(Copy, Clone, Debug)]
struct Located {
    bucket: usize,
    offset: usize,
    pos: DefaultKey,
}

pub struct ChainedHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    seq: Sequence<K, V>,
    buckets: BucketIndex,
    // Bumped whenever every position is invalidated at once.
    epoch: u64,
}

impl<K, V> ChainedHashMap<K, V, DefaultHashBuilder> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, V, S: Default> Default for ChainedHashMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    /// Empty map with a single bucket.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(1, hasher)
    }

    /// Empty map with `capacity` buckets (at least one).
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let buckets = BucketIndex::new(capacity);
        Self {
            hasher,
            seq: Sequence::with_capacity(buckets.capacity()),
            buckets,
            epoch: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.len() == 0
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Handle to the first entry of the sequence; `None` when empty.
    pub fn first(&self) -> Option<Handle> {
        self.seq.head().map(|pos| self.handle(pos))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.seq)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.seq)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Drop every entry, keeping the bucket count. Only buckets that held
    /// entries are touched.
    pub fn clear(&mut self) {
        let dropped = self.seq.len();
        let mut cur = self.seq.head();
        while let Some(node) = cur.and_then(|pos| self.seq.get(pos)) {
            let bucket = self.buckets.index_of(node.hash);
            self.buckets.reset(bucket);
            cur = node.next;
        }
        self.seq.clear();
        self.epoch = self.epoch.wrapping_add(1);
        trace!(dropped, capacity = self.capacity(), "cleared map");
    }

    #[inline]
    fn handle(&self, pos: DefaultKey) -> Handle {
        Handle {
            pos,
            epoch: self.epoch,
        }
    }

    fn resolve(&self, h: Handle) -> Option<DefaultKey> {
        (h.epoch == self.epoch && self.seq.contains(h.pos)).then_some(h.pos)
    }

    pub(crate) fn handle_entry(&self, h: Handle) -> Option<(&K, &V)> {
        let node = self.seq.get(self.resolve(h)?)?;
        Some((&node.key, &node.value))
    }

    pub(crate) fn handle_value_mut(&mut self, h: Handle) -> Option<&mut V> {
        let pos = self.resolve(h)?;
        self.seq.get_mut(pos).map(|n| &mut n.value)
    }

    pub(crate) fn handle_next(&self, h: Handle) -> Option<Handle> {
        let next = self.seq.get(self.resolve(h)?)?.next;
        next.map(|pos| self.handle(pos))
    }

    /// Link a key known to be absent at the front of its bucket's run, or at
    /// the tail of the sequence when the bucket is empty.
    fn link_new(&mut self, key: K, value: V, hash: u64) -> DefaultKey {
        let bucket = self.buckets.index_of(hash);
        let anchor = self.buckets.get(bucket).anchor;
        let pos = self.seq.insert_before(anchor, key, value, hash);
        self.buckets.get_mut(bucket).push_front(pos);
        pos
    }

    /// Grow once the map holds as many entries as it has buckets.
    ///
    /// Every node moves into a fresh arena in its current sequence order and
    /// is relinked from its cached hash. All handles are invalidated.
    fn grow_if_needed(&mut self) {
        let old_capacity = self.capacity();
        if self.len() < old_capacity {
            return;
        }
        let new_capacity = old_capacity.saturating_mul(GROWTH_FACTOR);
        trace!(old_capacity, new_capacity, len = self.len(), "rehashing");

        let old = mem::replace(&mut self.seq, Sequence::with_capacity(new_capacity));
        self.buckets = BucketIndex::new(new_capacity);
        self.epoch = self.epoch.wrapping_add(1);
        for node in old.into_nodes() {
            self.link_new(node.key, node.value, node.hash);
        }
    }

    /// Scan the run of the bucket `hash` falls into.
    fn locate<Q>(&self, hash: u64, q: &Q) -> Option<Located>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let bucket = self.buckets.index_of(hash);
        let run = self.buckets.get(bucket);
        let mut cur = run.anchor;
        for offset in 0..run.count {
            let pos = cur?;
            let node = self.seq.get(pos)?;
            if node.hash == hash && node.key.borrow() == q {
                return Some(Located {
                    bucket,
                    offset,
                    pos,
                });
            }
            cur = node.next;
        }
        None
    }

    /// Panics if the bucket index and the sequence disagree.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        use std::collections::HashSet;

        self.seq.check_links();

        // Consecutive runs of equal bucket ids along the sequence.
        let mut runs: Vec<(usize, DefaultKey, usize)> = Vec::new();
        let mut cur = self.seq.head();
        while let Some(pos) = cur {
            let node = &self.seq[pos];
            let b = self.buckets.index_of(node.hash);
            match runs.last_mut() {
                Some((last, _, n)) if *last == b => *n += 1,
                _ => runs.push((b, pos, 1)),
            }
            cur = node.next;
        }

        let mut seen = HashSet::new();
        for &(b, start, n) in &runs {
            assert!(seen.insert(b), "bucket {b} is not contiguous");
            let slot = self.buckets.get(b);
            assert_eq!(slot.anchor, Some(start), "bucket {b} anchor");
            assert_eq!(slot.count, n, "bucket {b} count");
        }

        let mut total = 0;
        for (b, slot) in self.buckets.iter() {
            total += slot.count;
            if slot.count == 0 {
                assert!(slot.anchor.is_none(), "empty bucket {b} keeps an anchor");
            }
        }
        assert_eq!(total, self.len(), "bucket counts must sum to len");
        assert!(self.capacity() >= 1);
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let found = self.locate(self.make_hash(q), q)?;
        Some(self.handle(found.pos))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.locate(self.make_hash(q), q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let found = self.locate(self.make_hash(q), q)?;
        Some(&self.seq[found.pos].value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let found = self.locate(self.make_hash(q), q)?;
        Some(&mut self.seq[found.pos].value)
    }

    /// Like [`get`](Self::get), but an absent key is an error.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(KeyNotFound)
    }

    /// Insert `key -> value` unless `key` is already present, in which case
    /// the stored value is kept and `value` is dropped. Returns whether an
    /// entry was added.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.insert_full(key, value).1
    }

    /// [`insert`](Self::insert), also returning a handle to the entry that
    /// holds `key` afterwards.
    pub fn insert_full(&mut self, key: K, value: V) -> (Handle, bool) {
        self.grow_if_needed();
        let hash = self.make_hash(&key);
        if let Some(found) = self.locate(hash, &key) {
            return (self.handle(found.pos), false);
        }
        let pos = self.link_new(key, value, hash);
        (self.handle(pos), true)
    }

    /// Store `value` under `key`, overwriting and returning any previous
    /// value.
    pub fn insert_or_replace(&mut self, key: K, value: V) -> Option<V> {
        self.grow_if_needed();
        let hash = self.make_hash(&key);
        match self.locate(hash, &key) {
            Some(found) => Some(mem::replace(&mut self.seq[found.pos].value, value)),
            None => {
                self.link_new(key, value, hash);
                None
            }
        }
    }

    /// Mutable access to the value under `key`, inserting `default()` first
    /// if the key is absent. `default` only runs on insertion.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        self.grow_if_needed();
        let hash = self.make_hash(&key);
        let pos = match self.locate(hash, &key) {
            Some(found) => found.pos,
            None => self.link_new(key, default(), hash),
        };
        &mut self.seq[pos].value
    }

    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Remove `q`, returning its value. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.grow_if_needed();
        let found = self.locate(self.make_hash(q), q)?;
        let node = self.seq.remove(found.pos)?;
        self.buckets
            .get_mut(found.bucket)
            .unlink(found.offset, node.next);
        Some((node.key, node.value))
    }
}

impl<K, V, S> Clone for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Deep copy through the normal insertion path, starting from one
    /// bucket.
    fn clone(&self) -> Self {
        let mut out = Self::with_hasher(self.hasher.clone());
        for (k, v) in self.iter() {
            out.insert(k.clone(), v.clone());
        }
        out
    }

    /// Clears `self` (keeping its bucket count) and copies `source` in.
    fn clone_from(&mut self, source: &Self) {
        self.clear();
        self.hasher = source.hasher.clone();
        for (k, v) in source.iter() {
            self.insert(k.clone(), v.clone());
        }
    }
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S> Eq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if the key is absent.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found in ChainedHashMap")
    }
}

/// Later pairs overwrite earlier ones with the same key.
impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert_or_replace(k, v);
        }
    }
}

impl<'a, K, V, S> Extend<(&'a K, &'a V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + Copy,
    V: Copy,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(&k, &v)| (k, v)));
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ChainedHashMap<K, V, DefaultHashBuilder>
where
    K: Eq + Hash,
{
    fn from(arr: [(K, V); N]) -> Self {
        Self::from_iter(arr)
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for ChainedHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.seq)
    }
}
