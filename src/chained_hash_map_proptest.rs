#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can check
// the bucket/sequence invariants directly.

use crate::chained_hash_map::{ChainedHashMap, Handle};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Assign(usize, i32),
    Subscript(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Assign(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Subscript(i, d)),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Drives one scenario against a `std::collections::HashMap` model.
///
/// Handles are tracked per key. A rehash (seen as a capacity change) or a
/// clear moves every tracked handle to the stale set; removal moves one.
fn run_scenario<S: BuildHasher>(
    mut sut: ChainedHashMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut live: HashMap<Key, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        let cap_before = sut.capacity();
        let len_before = sut.len();
        let mut fresh: Option<(Key, Handle)> = None;
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let (h, inserted) = sut.insert_full(k.clone(), v);
                prop_assert_eq!(inserted, !already, "insert adds only new keys");
                model.entry(k.clone()).or_insert(v);
                prop_assert_eq!(h.value(&sut), model.get(&k));
                fresh = Some((k, h));
            }
            OpI::Assign(i, v) => {
                let k = key_from(pool, i);
                let prev = sut.insert_or_replace(k.clone(), v);
                prop_assert_eq!(prev, model.insert(k, v));
            }
            OpI::Subscript(i, d) => {
                let k = key_from(pool, i);
                let slot = sut.get_or_insert_default(k.clone());
                *slot = slot.wrapping_add(d);
                let m = model.entry(k).or_default();
                *m = m.wrapping_add(d);
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let removed = sut.remove_entry(&k);
                let expected = model.remove(&k);
                prop_assert_eq!(removed.as_ref().map(|(_, v)| v), expected.as_ref());
                if let Some((kk, _)) = removed {
                    prop_assert!(kk == k);
                }
                prop_assert!(sut.find(&k).is_none());
                if let Some(h) = live.remove(&k) {
                    stale.push(h);
                }
                let expected_len = len_before - usize::from(expected.is_some());
                prop_assert_eq!(sut.len(), expected_len);
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let s = sut.find(&k);
                prop_assert_eq!(s.is_some(), model.contains_key(&k));
                if let Some(h) = s {
                    prop_assert_eq!(h.key(&sut), Some(&k));
                    if let Some(&lh) = live.get(&k) {
                        prop_assert_eq!(h, lh, "find must agree with a still-valid handle");
                    }
                    fresh = Some((k, h));
                }
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(&h) = live.get(&k) {
                    if let Some(vr) = h.value_mut(&mut sut) {
                        *vr = vr.saturating_add(d);
                        if let Some(mv) = model.get_mut(&k) {
                            *mv = mv.saturating_add(d);
                        }
                    } else {
                        prop_assert!(false, "live handle should resolve");
                    }
                }
            }
            OpI::Iterate => {
                let s_keys: Vec<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                prop_assert_eq!(s_keys.len(), sut.len());
                let unique: BTreeSet<_> = s_keys.iter().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(unique, m_keys);
                for (k, v) in sut.iter() {
                    prop_assert_eq!(model.get(k), Some(v));
                }
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap_before, "clear keeps capacity");
                stale.extend(live.drain().map(|(_, h)| h));
            }
        }

        // Growth from any entry point invalidates every tracked handle.
        if sut.capacity() != cap_before {
            prop_assert_eq!(sut.capacity(), cap_before * 2);
            prop_assert_eq!(len_before, cap_before, "growth only at load factor one");
            stale.extend(live.drain().map(|(_, h)| h));
        }
        // Handles minted by this op postdate any growth it caused.
        if let Some((k, h)) = fresh {
            live.insert(k, h);
        }

        // Post-conditions after each op
        sut.assert_invariants();
        for &h in &stale {
            prop_assert!(h.value(&sut).is_none());
        }
        for (k, &h) in &live {
            prop_assert_eq!(h.value(&sut), model.get(k));
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Duplicate insert keeps the stored value; assignment and subscript overwrite.
// - `find`/`contains_key` parity with the model; handles resolve to model values.
// - Removal returns the owned pair and shrinks `len` by exactly one.
// - `iter` yields each live entry exactly once.
// - Buckets stay contiguous, counts sum to `len`, growth doubles at load 1.0.
// - Stale handles (removed, rehashed, cleared) never resolve.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(ChainedHashMap::new(), &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants with every key in one bucket, so the whole
// sequence is a single run.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(ChainedHashMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

// Property: a larger starting bucket count behaves the same; growth still
// only fires once `len` reaches it.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_presized(cap in 1usize..16, (pool, ops) in arb_scenario()) {
        let sut = ChainedHashMap::with_capacity(cap);
        prop_assert_eq!(sut.capacity(), cap);
        run_scenario(sut, &pool, ops)?;
    }
}
