//! chained-hashmap: a single-threaded hash map that chains collisions
//! through one shared linked sequence instead of per-bucket lists.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1) bucket-local insertion and removal while keeping a single,
//!   flat iteration order over the whole map.
//! - Layers:
//!   - `Sequence<K, V>`: a doubly-linked list of entries stored in a
//!     generational arena (`slotmap`). It owns every key and value.
//!   - `BucketIndex`: one `(anchor, count)` slot per bucket. A bucket is the
//!     run of `count` consecutive sequence nodes starting at `anchor`.
//!   - `ChainedHashMap<K, V, S>`: public API; keeps both layers in step.
//!
//! Constraints
//! - Single-threaded; no interior mutability and no locking.
//! - Entries of one bucket are always contiguous in the sequence. New keys
//!   are linked in front of their bucket's anchor, or at the tail of the
//!   sequence when the bucket is empty.
//! - Bucket counts sum to `len()`; empty buckets carry no anchor.
//!
//! Growth
//! - The table grows when an insert-path call (`insert`, `insert_full`,
//!   `insert_or_replace`, `get_or_insert_*`, `remove`) finds
//!   `len() == capacity()`: load factor exactly 1.0. Capacity doubles.
//! - Rehash is stop-the-world: the old arena is drained in sequence order
//!   into a fresh one and every node is relinked.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its precomputed `u64` hash and indexing always uses
//!   the stored hash; `K: Hash` is never invoked after insertion, so
//!   rehashing never calls into user code.
//!
//! Handles and invalidation
//! - `Handle` is a copyable position (arena key plus map epoch). It stops
//!   resolving when its entry is removed (generational key) or when the map
//!   is rehashed or cleared (epoch bump). Inserting without growth leaves
//!   existing handles valid.
//! - Borrowing iterators (`iter`, `iter_mut`, ...) walk the sequence head to
//!   tail; there is no ordering between buckets.
//!
//! Insert semantics
//! - `insert` never overwrites: a duplicate key keeps its stored value.
//! - `insert_or_replace` and `get_or_insert_*` are the overwriting paths.
//! - `FromIterator`/`Extend` overwrite, so later pairs win.
//!
//! Notes and non-goals
//! - Not `Send`-aware beyond what `K`, `V`, and `S` provide; no concurrent
//!   access is supported without external synchronization.
//! - No open addressing, no shrinking, no custom allocators.
//! - Rehash and clear emit `tracing` events at trace level.

mod bucket;
pub mod chained_hash_map;
mod chained_hash_map_proptest;
mod error;
pub mod iter;
mod sequence;

// Public surface
pub use chained_hash_map::{ChainedHashMap, Handle};
pub use error::KeyNotFound;
