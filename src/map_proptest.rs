#![cfg(test)]

// Property tests for OrderedHashMap kept inside the crate so they can
// inspect the bucket index directly.

use crate::map::OrderedHashMap;
use crate::ordered_store::Locator;
use crate::resize::ResizePolicy;
use proptest::prelude::*;
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
    Erase(usize),
    EraseAt(usize),
    Find(usize),
    Contains(String),
    Subscript(usize, i32),
    At(usize),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=40).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            3 => idx.clone().prop_map(OpI::Erase),
            1 => idx.clone().prop_map(OpI::EraseAt),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Subscript(i, d)),
            1 => idx.clone().prop_map(OpI::At),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Reference model: a plain vector in insertion order plus a replay of
/// the resize arithmetic.
struct Model {
    entries: Vec<(Key, i32, Locator)>,
    buckets: usize,
    policy: ResizePolicy,
}

impl Model {
    fn new(policy: ResizePolicy) -> Self {
        Self {
            entries: Vec::new(),
            buckets: policy.base_buckets(),
            policy,
        }
    }

    fn position(&self, k: &Key) -> Option<usize> {
        self.entries.iter().position(|(mk, _, _)| mk == k)
    }

    fn inserted(&mut self, k: Key, v: i32, loc: Locator) {
        self.entries.push((k, v, loc));
        let n = self.buckets;
        if self.entries.len() * self.policy.fullness_coef() > n {
            self.buckets = n * self.policy.resize_coef();
        }
    }

    fn erased(&mut self, i: usize) -> (Key, i32, Locator) {
        let e = self.entries.remove(i);
        let n = self.buckets;
        if n > self.policy.base_buckets()
            && self.entries.len() * self.policy.fullness_coef() <= n / self.policy.resize_coef()
        {
            self.buckets = n / self.policy.resize_coef();
        }
        e
    }
}

fn run_state_machine<S: BuildHasher>(
    mut sut: OrderedHashMap<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model = Model::new(sut.policy());
    let mut stale: Vec<Locator> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let existing = model.position(&k);
                let (loc, fresh) = sut.insert(k.clone(), v);
                match existing {
                    Some(p) => {
                        prop_assert!(!fresh, "duplicate insert must report false");
                        prop_assert_eq!(loc, model.entries[p].2);
                        prop_assert_eq!(loc.value(&sut), Some(&model.entries[p].1));
                    }
                    None => {
                        prop_assert!(fresh);
                        model.inserted(k, v, loc);
                    }
                }
            }
            OpI::Erase(i) => {
                let k = key_from(&pool, i);
                let before = sut.len();
                let n = sut.erase(&k);
                match model.position(&k) {
                    Some(p) => {
                        prop_assert_eq!(n, 1);
                        prop_assert_eq!(sut.len(), before - 1);
                        let (_, _, loc) = model.erased(p);
                        stale.push(loc);
                    }
                    None => {
                        prop_assert_eq!(n, 0);
                        prop_assert_eq!(sut.len(), before);
                    }
                }
                prop_assert!(sut.find(&k).is_none());
            }
            OpI::EraseAt(i) => {
                let k = key_from(&pool, i);
                if let Some(p) = model.position(&k) {
                    let loc = model.entries[p].2;
                    let (kk, vv) = sut.remove_at(loc).expect("live locator removes");
                    let (mk, mv, _) = model.erased(p);
                    prop_assert_eq!(kk, mk);
                    prop_assert_eq!(vv, mv);
                    stale.push(loc);
                }
            }
            OpI::Find(i) => {
                let k = key_from(&pool, i);
                let found = sut.find(&k);
                match model.position(&k) {
                    Some(p) => {
                        prop_assert_eq!(found, Some(model.entries[p].2));
                        prop_assert_eq!(sut.get(&k), Some(&model.entries[p].1));
                    }
                    None => prop_assert!(found.is_none()),
                }
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.entries.iter().any(|(k, _, _)| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Subscript(i, d) => {
                let k = key_from(&pool, i);
                let v = sut.get_or_insert_default(k.clone());
                *v = v.wrapping_add(d);
                let now = *v;
                match model.position(&k) {
                    Some(p) => {
                        let mv = &mut model.entries[p].1;
                        *mv = mv.wrapping_add(d);
                        prop_assert_eq!(now, *mv);
                    }
                    None => {
                        prop_assert_eq!(now, d);
                        let loc = sut.find(&k).expect("subscript inserted the key");
                        model.inserted(k, d, loc);
                    }
                }
            }
            OpI::At(i) => {
                let k = key_from(&pool, i);
                let before = sut.len();
                match model.position(&k) {
                    Some(p) => prop_assert_eq!(sut.at(&k), Ok(&model.entries[p].1)),
                    None => prop_assert_eq!(sut.at(&k), Err(crate::Error::KeyNotFound)),
                }
                prop_assert_eq!(sut.len(), before);
            }
            OpI::Iterate => {
                let forward: Vec<_> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let expected: Vec<_> = model.entries.iter().map(|(k, v, _)| (k.clone(), *v)).collect();
                prop_assert_eq!(forward, expected);
                let backward: Vec<_> = sut.keys().rev().cloned().collect();
                let expected: Vec<_> = model.entries.iter().rev().map(|(k, _, _)| k.clone()).collect();
                prop_assert_eq!(backward, expected);
            }
            OpI::Clear => {
                sut.clear();
                stale.extend(model.entries.drain(..).map(|(_, _, l)| l));
                model.buckets = model.policy.base_buckets();
            }
        }

        // Post-conditions after each op
        // 1) Stale locators never resolve
        for &l in &stale {
            prop_assert!(l.value(&sut).is_none());
        }
        // 2) Size parity and insertion order
        prop_assert_eq!(sut.len(), model.entries.len());
        prop_assert_eq!(sut.is_empty(), model.entries.is_empty());
        let order: Vec<_> = sut.keys().collect();
        let m_order: Vec<_> = model.entries.iter().map(|(k, _, _)| k).collect();
        prop_assert_eq!(order, m_order);
        // 3) Bucket count follows the resize formulas exactly, never under the base
        prop_assert_eq!(sut.bucket_count(), model.buckets);
        prop_assert!(sut.bucket_count() >= sut.policy().base_buckets());
        // 4) Index and store agree
        prop_assert_eq!(sut.index().pair_count(), sut.len());
        prop_assert!(sut.index().is_well_placed());
    }
    Ok(())
}

// Property: state-machine equivalence against an ordered Vec model.
// Invariants exercised across random operation sequences:
// - First write wins; duplicate inserts return the existing locator.
// - `erase` returns 0/1 and `find` agrees with the model afterwards.
// - Iteration order equals insertion order with removed keys dropped.
// - Bucket count equals a replay of the expand/shrink arithmetic.
// - Stale locators never resolve; `len`/`is_empty` parity after each op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(OrderedHashMap::new(), pool, ops)?;
    }

    #[test]
    fn prop_state_machine_custom_policy((pool, ops) in arb_scenario()) {
        let policy = ResizePolicy::new(3, 1, 3).unwrap();
        run_state_machine(OrderedHashMap::with_policy(policy), pool, ops)?;
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

// Property: same invariants under worst-case collisions; every key
// shares bucket 0, so erase's swap-remove is exercised constantly.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(OrderedHashMap::with_hasher(ConstBuildHasher), pool, ops)?;
    }
}

// Property: clone_from yields an independent deep copy in source order.
proptest! {
    #[test]
    fn prop_clone_independence(
        a_items in proptest::collection::vec((0u16..64, any::<i32>()), 0..80),
        b_items in proptest::collection::vec((0u16..64, any::<i32>()), 0..80),
        extra in 64u16..128,
    ) {
        let a: OrderedHashMap<u16, i32> = a_items.iter().copied().collect();
        let mut b: OrderedHashMap<u16, i32> = b_items.iter().copied().collect();
        b.clone_from(&a);

        let snapshot: Vec<_> = a.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(b.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(), snapshot.clone());

        b.insert(extra, 0);
        if let Some(&(k, _)) = snapshot.first() {
            b.erase(&k);
            *b.get_or_insert_default(k) += 1;
        }
        prop_assert_eq!(a.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(), snapshot);
        prop_assert!(!a.contains_key(&extra));
    }
}
