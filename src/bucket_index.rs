//! BucketIndex: separate-chaining index from key hashes to locators.
//!
//! Derived state only. Every live entry has exactly one `(hash, Locator)`
//! pair, stored in bucket `hash % bucket_count`. The index never owns or
//! compares keys itself; callers pass an equality probe that resolves a
//! locator through the ordered store.

use crate::ordered_store::Locator;

#[derive(Copy, Clone, Debug)]
struct Slot {
    hash: u64,
    locator: Locator,
}

/// Where a key was found: bucket number and offset inside the bucket.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Position {
    bucket: usize,
    offset: usize,
    pub locator: Locator,
}

#[derive(Clone, Debug)]
pub(crate) struct BucketIndex {
    buckets: Vec<Vec<Slot>>,
}

impl BucketIndex {
    pub fn with_buckets(n: usize) -> Self {
        debug_assert!(n > 0);
        Self {
            buckets: vec![Vec::new(); n],
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Scan the key's bucket; `eq` is only called on hash matches.
    pub fn find<F>(&self, hash: u64, mut eq: F) -> Option<Position>
    where
        F: FnMut(Locator) -> bool,
    {
        let bucket = self.bucket_of(hash);
        self.buckets[bucket]
            .iter()
            .position(|s| s.hash == hash && eq(s.locator))
            .map(|offset| Position {
                bucket,
                offset,
                locator: self.buckets[bucket][offset].locator,
            })
    }

    /// Locate the pair belonging to a specific locator.
    pub fn find_locator(&self, hash: u64, locator: Locator) -> Option<Position> {
        self.find(hash, |l| l == locator)
    }

    pub fn insert(&mut self, hash: u64, locator: Locator) {
        let bucket = self.bucket_of(hash);
        self.buckets[bucket].push(Slot { hash, locator });
    }

    /// Swap-with-last-and-pop; order within a bucket is not meaningful.
    pub fn remove(&mut self, pos: Position) -> Locator {
        let slot = self.buckets[pos.bucket].swap_remove(pos.offset);
        debug_assert_eq!(slot.locator, pos.locator);
        slot.locator
    }

    /// Throw away all pairs and refill at a new bucket count.
    pub fn rebuild<I>(&mut self, bucket_count: usize, entries: I)
    where
        I: IntoIterator<Item = (u64, Locator)>,
    {
        debug_assert!(bucket_count > 0);
        let shrinking = bucket_count < self.buckets.len();
        for b in &mut self.buckets {
            b.clear();
        }
        self.buckets.resize_with(bucket_count, Vec::new);
        if shrinking {
            self.buckets.shrink_to_fit();
        }
        for (hash, locator) in entries {
            self.insert(hash, locator);
        }
    }

    /// Drop every pair and return to `bucket_count` empty buckets.
    pub fn reset(&mut self, bucket_count: usize) {
        self.rebuild(bucket_count, core::iter::empty());
    }

    /// Total number of pairs across all buckets.
    #[cfg(test)]
    pub fn pair_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Check that every pair sits in the bucket its hash selects.
    #[cfg(test)]
    pub fn is_well_placed(&self) -> bool {
        self.buckets
            .iter()
            .enumerate()
            .all(|(i, b)| b.iter().all(|s| self.bucket_of(s.hash) == i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordered_store::OrderedStore;

    fn locators(n: usize) -> Vec<Locator> {
        let mut store = OrderedStore::new();
        (0..n).map(|i| store.push_back(i, (), i as u64)).collect()
    }

    #[test]
    fn insert_and_find_by_hash() {
        let locs = locators(3);
        let mut idx = BucketIndex::with_buckets(10);
        idx.insert(3, locs[0]);
        idx.insert(13, locs[1]);
        idx.insert(4, locs[2]);

        assert_eq!(idx.find(13, |_| true).map(|p| p.locator), Some(locs[1]));
        assert_eq!(idx.find(3, |l| l == locs[0]).map(|p| p.locator), Some(locs[0]));
        assert!(idx.find(23, |_| true).is_none(), "same bucket, different hash");
        assert!(idx.find(4, |_| false).is_none(), "probe rejects");
        assert_eq!(idx.pair_count(), 3);
    }

    /// Invariant: removal swaps the last pair into the hole; every other
    /// pair in the bucket stays findable.
    #[test]
    fn swap_remove_keeps_bucket_mates() {
        let locs = locators(3);
        let mut idx = BucketIndex::with_buckets(1);
        for (i, &l) in locs.iter().enumerate() {
            idx.insert(i as u64, l);
        }
        let pos = idx.find_locator(0, locs[0]).unwrap();
        assert_eq!(idx.remove(pos), locs[0]);
        assert!(idx.find_locator(0, locs[0]).is_none());
        assert!(idx.find_locator(1, locs[1]).is_some());
        assert!(idx.find_locator(2, locs[2]).is_some());
        assert_eq!(idx.pair_count(), 2);
    }

    #[test]
    fn rebuild_redistributes_by_new_modulus() {
        let locs = locators(4);
        let mut idx = BucketIndex::with_buckets(2);
        let pairs: Vec<_> = locs.iter().enumerate().map(|(i, &l)| (i as u64 * 7, l)).collect();
        for &(h, l) in &pairs {
            idx.insert(h, l);
        }
        idx.rebuild(8, pairs.iter().copied());
        assert_eq!(idx.bucket_count(), 8);
        assert_eq!(idx.pair_count(), 4);
        assert!(idx.is_well_placed());
        for &(h, l) in &pairs {
            assert!(idx.find_locator(h, l).is_some());
        }

        idx.rebuild(4, pairs.iter().copied());
        assert_eq!(idx.bucket_count(), 4);
        assert!(idx.is_well_placed());

        idx.reset(10);
        assert_eq!(idx.bucket_count(), 10);
        assert_eq!(idx.pair_count(), 0);
    }
}
