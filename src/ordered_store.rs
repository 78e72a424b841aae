//! OrderedStore: owns every entry and keeps them in insertion order.
//!
//! Entries live in a generational `SlotMap`; each node carries links to
//! its neighbours so that removal is O(1) and never moves other entries.
//! A `Locator` is the slot key, stable until its own entry is removed.

use core::ops::{Index, IndexMut};
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

/// Opaque, stable handle to one entry of a map.
///
/// A locator stays valid until its own entry is removed. Inserting or
/// removing other entries and resizing the bucket index never invalidate
/// it, and a stale locator never resolves to a later entry that happens
/// to reuse the slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Locator(DefaultKey);

impl Locator {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Locator(k)
    }
    pub(crate) fn raw(&self) -> DefaultKey {
        self.0
    }
}

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub key: K,
    pub value: V,
    pub hash: u64,
}

#[derive(Debug)]
struct Node<K, V> {
    entry: Entry<K, V>,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

#[derive(Debug)]
pub(crate) struct OrderedStore<K, V> {
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<K, V> OrderedStore<K, V> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Append at the logical end.
    pub fn push_back(&mut self, key: K, value: V, hash: u64) -> Locator {
        let prev = self.tail;
        let k = self.nodes.insert(Node {
            entry: Entry { key, value, hash },
            prev,
            next: None,
        });
        match prev {
            Some(p) => self.nodes[p].next = Some(k),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
        Locator::new(k)
    }

    /// Unlink and take the entry; `None` for a stale locator.
    pub fn remove(&mut self, loc: Locator) -> Option<Entry<K, V>> {
        let node = self.nodes.remove(loc.raw())?;
        match node.prev {
            Some(p) => self.nodes[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.nodes[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node.entry)
    }

    pub fn pop_front(&mut self) -> Option<Entry<K, V>> {
        let head = self.head?;
        self.remove(Locator::new(head))
    }

    pub fn pop_back(&mut self) -> Option<Entry<K, V>> {
        let tail = self.tail?;
        self.remove(Locator::new(tail))
    }

    pub fn get(&self, loc: Locator) -> Option<&Entry<K, V>> {
        self.nodes.get(loc.raw()).map(|n| &n.entry)
    }

    pub fn get_mut(&mut self, loc: Locator) -> Option<&mut Entry<K, V>> {
        self.nodes.get_mut(loc.raw()).map(|n| &mut n.entry)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            front: self.head,
            back: self.tail,
            remaining: self.nodes.len(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.nodes.len();
        let mut nodes = SecondaryMap::with_capacity(remaining);
        for (k, n) in self.nodes.iter_mut() {
            nodes.insert(k, n);
        }
        IterMut {
            nodes,
            front: self.head,
            back: self.tail,
            remaining,
        }
    }
}

impl<K, V> Index<Locator> for OrderedStore<K, V> {
    type Output = Entry<K, V>;

    fn index(&self, loc: Locator) -> &Entry<K, V> {
        &self.nodes[loc.raw()].entry
    }
}

impl<K, V> IndexMut<Locator> for OrderedStore<K, V> {
    fn index_mut(&mut self, loc: Locator) -> &mut Entry<K, V> {
        &mut self.nodes[loc.raw()].entry
    }
}

/// Insertion-order iterator over `(Locator, &Entry)`.
pub(crate) struct Iter<'a, K, V> {
    nodes: &'a SlotMap<DefaultKey, Node<K, V>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Locator, &'a Entry<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.front?;
        let node = self.nodes.get(k)?;
        self.front = node.next;
        self.remaining -= 1;
        Some((Locator::new(k), &node.entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.back?;
        let node = self.nodes.get(k)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some((Locator::new(k), &node.entry))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Insertion-order iterator over `(Locator, &mut Entry)`.
///
/// The slot map hands out disjoint `&mut` nodes in slot order; they are
/// parked in a `SecondaryMap` and taken out again following the links,
/// so each node is yielded at most once.
pub(crate) struct IterMut<'a, K, V> {
    nodes: SecondaryMap<DefaultKey, &'a mut Node<K, V>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Locator, &'a mut Entry<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.front?;
        let node = self.nodes.remove(k)?;
        self.front = node.next;
        self.remaining -= 1;
        Some((Locator::new(k), &mut node.entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.back?;
        let node = self.nodes.remove(k)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some((Locator::new(k), &mut node.entry))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(s: &OrderedStore<&'static str, i32>) -> Vec<&'static str> {
        s.iter().map(|(_, e)| e.key).collect()
    }

    fn filled(items: &[&'static str]) -> (OrderedStore<&'static str, i32>, Vec<Locator>) {
        let mut s = OrderedStore::new();
        let locs = items
            .iter()
            .enumerate()
            .map(|(i, k)| s.push_back(*k, i as i32, i as u64))
            .collect();
        (s, locs)
    }

    /// Invariant: appends land at the logical end.
    #[test]
    fn push_back_preserves_order() {
        let (s, _) = filled(&["a", "b", "c"]);
        assert_eq!(keys(&s), ["a", "b", "c"]);
        assert_eq!(s.len(), 3);
    }

    /// Invariant: removal of head, middle or tail relinks neighbours and
    /// leaves the rest in their original relative order.
    #[test]
    fn remove_relinks_neighbours() {
        let (mut s, locs) = filled(&["a", "b", "c", "d"]);
        assert_eq!(s.remove(locs[1]).map(|e| e.key), Some("b"));
        assert_eq!(keys(&s), ["a", "c", "d"]);
        assert_eq!(s.remove(locs[0]).map(|e| e.key), Some("a"));
        assert_eq!(keys(&s), ["c", "d"]);
        assert_eq!(s.remove(locs[3]).map(|e| e.key), Some("d"));
        assert_eq!(keys(&s), ["c"]);
        assert_eq!(s.remove(locs[2]).map(|e| e.key), Some("c"));
        assert!(keys(&s).is_empty());

        // Appending after draining starts a fresh chain.
        s.push_back("e", 9, 9);
        assert_eq!(keys(&s), ["e"]);
    }

    /// Invariant: a removed locator is stale forever, even if its slot is reused.
    #[test]
    fn stale_locator_does_not_resolve() {
        let (mut s, locs) = filled(&["a"]);
        s.remove(locs[0]).unwrap();
        let fresh = s.push_back("b", 1, 1);
        assert_ne!(locs[0], fresh);
        assert!(s.get(locs[0]).is_none());
        assert!(s.remove(locs[0]).is_none());
        assert_eq!(s.get(fresh).map(|e| e.key), Some("b"));
    }

    /// Invariant: both directions agree and the count is exact even when
    /// the two ends meet in the middle.
    #[test]
    fn double_ended_iteration() {
        let (s, _) = filled(&["a", "b", "c"]);
        let rev: Vec<_> = s.iter().rev().map(|(_, e)| e.key).collect();
        assert_eq!(rev, ["c", "b", "a"]);

        let mut it = s.iter();
        assert_eq!(it.len(), 3);
        assert_eq!(it.next().map(|(_, e)| e.key), Some("a"));
        assert_eq!(it.next_back().map(|(_, e)| e.key), Some("c"));
        assert_eq!(it.next().map(|(_, e)| e.key), Some("b"));
        assert!(it.next().is_none());
        assert!(it.next_back().is_none());
    }

    #[test]
    fn iter_mut_follows_insertion_order() {
        let (mut s, locs) = filled(&["x", "y", "z"]);
        s.remove(locs[0]);
        s.push_back("x", 10, 10);
        let order: Vec<_> = s
            .iter_mut()
            .map(|(_, e)| {
                e.value += 100;
                e.key
            })
            .collect();
        assert_eq!(order, ["y", "z", "x"]);
        let values: Vec<_> = s.iter().map(|(_, e)| e.value).collect();
        assert_eq!(values, [101, 102, 110]);

        let mut it = s.iter_mut();
        assert_eq!(it.next_back().map(|(_, e)| e.key), Some("x"));
        assert_eq!(it.len(), 2);
    }

    #[test]
    fn pop_both_ends_and_clear() {
        let (mut s, _) = filled(&["a", "b", "c"]);
        assert_eq!(s.pop_front().map(|e| e.key), Some("a"));
        assert_eq!(s.pop_back().map(|e| e.key), Some("c"));
        assert_eq!(keys(&s), ["b"]);
        s.clear();
        assert_eq!(s.len(), 0);
        assert!(s.pop_front().is_none());
        assert!(s.iter().next().is_none());
    }
}
