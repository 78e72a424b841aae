//! OrderedHashMap: insertion-ordered map over an ordered store and a bucket index.

use crate::bucket_index::{BucketIndex, Position};
use crate::error::{Error, KeyNotFoundSnafu};
use crate::ordered_store::{self, Locator, OrderedStore};
use crate::resize::ResizePolicy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;
use snafu::OptionExt;

impl Locator {
    pub fn key<'a, K, V, S>(&self, map: &'a OrderedHashMap<K, V, S>) -> Option<&'a K> {
        map.store.get(*self).map(|e| &e.key)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a OrderedHashMap<K, V, S>) -> Option<&'a V> {
        map.store.get(*self).map(|e| &e.value)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut OrderedHashMap<K, V, S>) -> Option<&'a mut V> {
        map.store.get_mut(*self).map(|e| &mut e.value)
    }
}

/// A hash map that iterates in insertion order.
///
/// Inserting an existing key keeps the stored value (first write wins).
/// Removal never reorders the surviving entries. The bucket index grows
/// and shrinks according to a [`ResizePolicy`]; resizing never moves
/// entries, so [`Locator`]s survive it.
pub struct OrderedHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    store: OrderedStore<K, V>,
    index: BucketIndex,
    policy: ResizePolicy,
}

impl<K, V> OrderedHashMap<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_policy(policy: ResizePolicy) -> Self {
        Self::with_hasher_and_policy(Default::default(), policy)
    }
}

impl<K, V, S: Default> Default for OrderedHashMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> OrderedHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_policy(hasher, ResizePolicy::default())
    }

    pub fn with_hasher_and_policy(hasher: S, policy: ResizePolicy) -> Self {
        Self {
            hasher,
            store: OrderedStore::new(),
            index: BucketIndex::with_buckets(policy.base_buckets()),
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }
    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// The hash capability the map was built with.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn policy(&self) -> ResizePolicy {
        self.policy
    }

    /// Current number of buckets in the index.
    pub fn bucket_count(&self) -> usize {
        self.index.bucket_count()
    }

    /// Remove everything and return the index to its base size.
    pub fn clear(&mut self) {
        log::trace!(
            "clear: dropping {} entries, buckets {} -> {}",
            self.store.len(),
            self.index.bucket_count(),
            self.policy.base_buckets()
        );
        self.store.clear();
        self.index.reset(self.policy.base_buckets());
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.store.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.store.iter_mut(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { it: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { it: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            it: self.iter_mut(),
        }
    }

    #[cfg(test)]
    pub(crate) fn index(&self) -> &BucketIndex {
        &self.index
    }

    /// Rebuild the index at `bucket_count` from the store's cached hashes.
    fn rebuild(&mut self, bucket_count: usize) {
        log::trace!(
            "rebuild bucket index: len {}, buckets {} -> {}",
            self.store.len(),
            self.index.bucket_count(),
            bucket_count
        );
        self.index
            .rebuild(bucket_count, self.store.iter().map(|(loc, e)| (e.hash, loc)));
    }

    fn expand_if_needed(&mut self) {
        let buckets = self.index.bucket_count();
        if self.policy.should_expand(self.len(), buckets) {
            self.rebuild(self.policy.expanded(buckets));
        }
    }

    fn shrink_if_needed(&mut self) {
        let buckets = self.index.bucket_count();
        if self.policy.should_shrink(self.len(), buckets) {
            self.rebuild(self.policy.shrunk(buckets));
        }
    }
}

impl<K, V, S> OrderedHashMap<K, V, S>
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

    fn locate<Q>(&self, q: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let store = &self.store;
        self.index.find(hash, |loc| {
            store
                .get(loc)
                .map(|e| e.key.borrow() == q)
                .unwrap_or(false)
        })
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Locator>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.locate(q).map(|p| p.locator)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.locate(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let loc = self.find(q)?;
        self.store.get(loc).map(|e| &e.value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let loc = self.find(q)?;
        self.store.get(loc).map(|e| (&e.key, &e.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let loc = self.find(q)?;
        self.store.get_mut(loc).map(|e| &mut e.value)
    }

    /// Read-only keyed access that reports a missing key as an error.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).context(KeyNotFoundSnafu)
    }

    /// Insert `key -> value` unless the key is already present.
    ///
    /// Returns the entry's locator and whether it was newly inserted. An
    /// existing value is left untouched and `value` is dropped.
    pub fn insert(&mut self, key: K, value: V) -> (Locator, bool) {
        self.insert_with(key, || value)
    }

    /// Like `insert`, but only builds the value when the key is absent.
    pub fn insert_with<F>(&mut self, key: K, default: F) -> (Locator, bool)
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        let store = &self.store;
        if let Some(pos) = self.index.find(hash, |loc| {
            store.get(loc).map(|e| e.key == key).unwrap_or(false)
        }) {
            return (pos.locator, false);
        }

        let locator = self.store.push_back(key, default(), hash);
        self.index.insert(hash, locator);
        self.expand_if_needed();
        (locator, true)
    }

    /// Mutable access that inserts `default()` for a missing key.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let (locator, _) = self.insert_with(key, default);
        &mut self.store[locator].value
    }

    /// Mutable access that inserts `V::default()` for a missing key.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Remove `q` if present; returns how many entries were removed (0 or 1).
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.remove_entry(q) {
            Some(_) => 1,
            None => 0,
        }
    }

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
        let pos = self.locate(q)?;
        let locator = self.index.remove(pos);
        let entry = self.store.remove(locator)?;
        self.shrink_if_needed();
        Some((entry.key, entry.value))
    }

    /// Remove by locator; `None` if the locator is stale.
    pub fn remove_at(&mut self, locator: Locator) -> Option<(K, V)> {
        let hash = self.store.get(locator)?.hash;
        // Index pair goes first; the store entry is dropped last.
        let pos = self.index.find_locator(hash, locator)?;
        self.index.remove(pos);
        let entry = self.store.remove(locator)?;
        self.shrink_if_needed();
        Some((entry.key, entry.value))
    }
}

impl<K, Q, V, S> Index<&Q> for OrderedHashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if the key is not present; use `at` or `get` to handle that case.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("no such key"),
        }
    }
}

impl<K, V, S> Clone for OrderedHashMap<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone,
    S: Clone + BuildHasher,
{
    fn clone(&self) -> Self {
        let mut m = Self::with_hasher_and_policy(self.hasher.clone(), self.policy);
        m.extend(self.iter().map(|(k, v)| (k.clone(), v.clone())));
        m
    }

    /// Clears `self`, then re-inserts every pair of `source` in its order.
    fn clone_from(&mut self, source: &Self) {
        self.hasher = source.hasher.clone();
        self.policy = source.policy;
        self.clear();
        self.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

impl<K, V, S> fmt::Debug for OrderedHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for OrderedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrderedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::with_hasher(S::default());
        m.extend(iter);
        m
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for OrderedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

/// Iterator over `(&K, &V)` in insertion order.
pub struct Iter<'a, K, V> {
    it: ordered_store::Iter<'a, K, V>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&e.key, &e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(_, e)| (&e.key, &e.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in insertion order.
pub struct IterMut<'a, K, V> {
    it: ordered_store::IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&e.key, &mut e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(_, e)| (&e.key, &mut e.value))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    it: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, _)| k)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    it: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    it: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// Owning iterator; drains the store front to back.
pub struct IntoIter<K, V> {
    store: OrderedStore<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.store.pop_front().map(|e| (e.key, e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.store.len(), Some(self.store.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.store.pop_back().map(|e| (e.key, e.value))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for OrderedHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter { store: self.store }
    }
}

impl<'a, K, V, S> IntoIterator for &'a OrderedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut OrderedHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
