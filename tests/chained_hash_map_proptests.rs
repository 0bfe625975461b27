// ChainedHashMap property tests (public API only).
//
// Property 1: copy independence.
//  - Model: two std HashMaps, one per side.
//  - Operations: a random batch applied to the clone, another to the source.
//  - Invariant: each side equals its own model; neither sees the other's ops.
//
// Property 2: traversal covers every entry once, in handle order.
//  - Invariant: iter(), keys(), and the handle walk from first() agree; each
//    key appears once and is reachable via find().
//
// Property 3: rehash transparency.
//  - Invariant: every value read before a batch of inserts that grows the
//    table reads the same afterwards.
use chained_hashmap::ChainedHashMap;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug)]
enum Op {
    Insert(u8, u16),
    Assign(u8, u16),
    Remove(u8),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<u8>(), any::<u16>()).prop_map(|(k, v)| Op::Insert(k, v)),
        (any::<u8>(), any::<u16>()).prop_map(|(k, v)| Op::Assign(k, v)),
        any::<u8>().prop_map(Op::Remove),
    ]
}

fn apply(m: &mut ChainedHashMap<u8, u16>, model: &mut HashMap<u8, u16>, op: &Op) {
    match *op {
        Op::Insert(k, v) => {
            m.insert(k, v);
            model.entry(k).or_insert(v);
        }
        Op::Assign(k, v) => {
            *m.get_or_insert_default(k) = v;
            model.insert(k, v);
        }
        Op::Remove(k) => {
            m.remove(&k);
            model.remove(&k);
        }
    }
}

fn same_content(m: &ChainedHashMap<u8, u16>, model: &HashMap<u8, u16>) -> bool {
    m.len() == model.len() && model.iter().all(|(k, v)| m.at(k) == Ok(v))
}

proptest! {
    #[test]
    fn prop_clone_independence(
        seed in proptest::collection::vec(arb_op(), 0..64),
        left in proptest::collection::vec(arb_op(), 0..64),
        right in proptest::collection::vec(arb_op(), 0..64),
    ) {
        let mut source = ChainedHashMap::new();
        let mut source_model = HashMap::new();
        for op in &seed {
            apply(&mut source, &mut source_model, op);
        }

        let mut copy = source.clone();
        let mut copy_model = source_model.clone();
        prop_assert!(copy == source);

        for op in &left {
            apply(&mut copy, &mut copy_model, op);
        }
        for op in &right {
            apply(&mut source, &mut source_model, op);
        }
        prop_assert!(same_content(&copy, &copy_model));
        prop_assert!(same_content(&source, &source_model));

        let mut assigned: ChainedHashMap<u8, u16> = ChainedHashMap::new();
        assigned.insert(0, 0);
        assigned.clone_from(&source);
        prop_assert!(same_content(&assigned, &source_model));
    }

    #[test]
    fn prop_traversal_covers_each_entry_once(ops in proptest::collection::vec(arb_op(), 0..200)) {
        let mut m = ChainedHashMap::new();
        let mut model = HashMap::new();
        for op in &ops {
            apply(&mut m, &mut model, op);
        }

        let via_iter: Vec<u8> = m.iter().map(|(k, _)| *k).collect();
        let via_keys: Vec<u8> = m.keys().copied().collect();
        let mut via_handles = Vec::new();
        let mut cur = m.first();
        while let Some(h) = cur {
            via_handles.push(*h.key(&m).unwrap());
            cur = h.next(&m);
        }
        prop_assert_eq!(&via_iter, &via_keys);
        prop_assert_eq!(&via_iter, &via_handles);
        prop_assert_eq!(via_iter.len(), m.len());

        let unique: HashSet<u8> = via_iter.iter().copied().collect();
        prop_assert_eq!(unique.len(), m.len());
        for k in &via_iter {
            prop_assert!(m.find(k).is_some());
        }
    }

    #[test]
    fn prop_rehash_transparency(
        first in proptest::collection::hash_map(any::<u32>(), any::<u32>(), 1..50),
        extra in 50u64..200,
    ) {
        let mut m: ChainedHashMap<u64, u32> =
            first.iter().map(|(&k, &v)| (u64::from(k), v)).collect();
        let cap_before = m.capacity();
        // Keys above u32::MAX never collide with `first`.
        for i in 0..extra {
            m.insert((1u64 << 32) + i, 0);
        }
        prop_assert!(m.capacity() > cap_before);
        for (&k, v) in &first {
            prop_assert_eq!(m.at(&u64::from(k)), Ok(v));
        }
    }
}
