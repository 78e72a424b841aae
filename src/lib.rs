//! ordered-bucket-map: a single-threaded hash map that iterates in
//! insertion order and hands out stable locators to its entries.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1) average insert/lookup/remove with deterministic,
//!   insertion-ordered iteration and a predictable resize schedule.
//! - Layers:
//!   - OrderedStore<K, V>: sole owner of entries. A generational slot
//!     arena whose nodes are doubly linked in insertion order; removal
//!     unlinks one node and never moves the others.
//!   - BucketIndex: separate-chaining index of `(hash, Locator)` pairs.
//!     Derived state; can always be rebuilt from the store.
//!   - ResizePolicy: integer load-factor thresholds deciding when the
//!     index doubles or halves.
//!   - OrderedHashMap<K, V, S>: public API tying the three together.
//!
//! Constraints
//! - Single-threaded: no internal synchronization. Callers sharing a map
//!   across threads wrap the whole thing in one lock.
//! - First write wins: inserting a present key keeps the stored value.
//! - Stable locators: a `Locator` survives inserts, removals of other
//!   entries and index rebuilds; a removed entry's locator stays stale.
//! - No unsafe code.
//!
//! Hasher and rehashing invariants
//! - Each entry caches its `u64` hash at insertion. Rebuilds re-bucket
//!   from the cached hash, so `K: Hash` never runs after insertion.
//! - A key lives in bucket `hash % bucket_count`.
//!
//! Resize schedule
//! - After an insert: expand when `len * fullness_coef > buckets`.
//! - After an erase: shrink when `buckets > base` and
//!   `len * fullness_coef <= buckets / resize_coef` (truncating).
//! - At most one resize per operation. `clear()` returns to the base.
//!
//! Notes and non-goals
//! - No serialization, no key ordering, no compaction of the arena
//!   beyond what `SlotMap` does on its own.
//! - References returned by `get_mut`, `get_or_insert_default` and the
//!   iterators borrow the map, so they cannot outlive the next insert,
//!   erase or clear.

mod bucket_index;
pub mod error;
mod map;
mod map_proptest;
mod ordered_store;
pub mod resize;

// Public surface
pub use error::Error;
pub use map::{IntoIter, Iter, IterMut, Keys, OrderedHashMap, Values, ValuesMut};
pub use ordered_store::Locator;
pub use resize::ResizePolicy;
