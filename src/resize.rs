//! Load-factor policy deciding when the bucket index grows or shrinks.
//!
//! The arithmetic is deliberately plain integer math: the shrink check
//! divides the bucket count by `resize_coef` with truncation, and each
//! insert or erase evaluates its trigger exactly once.

use crate::error::{
    Error, ResizeCoefTooSmallSnafu, ZeroBaseBucketsSnafu, ZeroFullnessSnafu,
};
use snafu::ensure;

pub const DEFAULT_BASE_BUCKETS: usize = 10;
pub const DEFAULT_FULLNESS_COEF: usize = 2;
pub const DEFAULT_RESIZE_COEF: usize = 2;

/// Thresholds for the bucket index.
///
/// - `base_buckets`: bucket count of a fresh or cleared map, and the floor
///   for shrinking.
/// - `fullness_coef`: the index expands once `len * fullness_coef`
///   exceeds the bucket count.
/// - `resize_coef`: factor applied to the bucket count on expand/shrink.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ResizePolicy {
    base_buckets: usize,
    fullness_coef: usize,
    resize_coef: usize,
}

impl ResizePolicy {
    pub fn new(base_buckets: usize, fullness_coef: usize, resize_coef: usize) -> Result<Self, Error> {
        ensure!(base_buckets > 0, ZeroBaseBucketsSnafu);
        ensure!(fullness_coef > 0, ZeroFullnessSnafu);
        ensure!(resize_coef >= 2, ResizeCoefTooSmallSnafu { resize_coef });
        Ok(Self {
            base_buckets,
            fullness_coef,
            resize_coef,
        })
    }

    pub fn base_buckets(&self) -> usize {
        self.base_buckets
    }
    pub fn fullness_coef(&self) -> usize {
        self.fullness_coef
    }
    pub fn resize_coef(&self) -> usize {
        self.resize_coef
    }

    /// Checked after an insert brought the map to `len` entries.
    #[inline]
    pub fn should_expand(&self, len: usize, buckets: usize) -> bool {
        len.saturating_mul(self.fullness_coef) > buckets
    }

    /// Checked after an erase brought the map to `len` entries.
    #[inline]
    pub fn should_shrink(&self, len: usize, buckets: usize) -> bool {
        buckets > self.base_buckets
            && len.saturating_mul(self.fullness_coef) <= buckets / self.resize_coef
    }

    #[inline]
    pub fn expanded(&self, buckets: usize) -> usize {
        buckets.saturating_mul(self.resize_coef)
    }

    /// Bucket counts only ever move by `resize_coef` from the base, so the
    /// division is exact; the floor keeps the base honored regardless.
    #[inline]
    pub fn shrunk(&self, buckets: usize) -> usize {
        (buckets / self.resize_coef).max(self.base_buckets)
    }
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self {
            base_buckets: DEFAULT_BASE_BUCKETS,
            fullness_coef: DEFAULT_FULLNESS_COEF,
            resize_coef: DEFAULT_RESIZE_COEF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_coefficients() {
        let p = ResizePolicy::default();
        assert_eq!(p.base_buckets(), 10);
        assert_eq!(p.fullness_coef(), 2);
        assert_eq!(p.resize_coef(), 2);
        assert_eq!(ResizePolicy::new(10, 2, 2), Ok(p));
    }

    #[test]
    fn invalid_coefficients_rejected() {
        assert_eq!(ResizePolicy::new(0, 2, 2), Err(Error::ZeroBaseBuckets));
        assert_eq!(ResizePolicy::new(10, 0, 2), Err(Error::ZeroFullness));
        assert_eq!(
            ResizePolicy::new(10, 2, 1),
            Err(Error::ResizeCoefTooSmall { resize_coef: 1 })
        );
    }

    /// Expand fires on the sixth entry with ten buckets (6 * 2 > 10).
    #[test]
    fn expand_threshold() {
        let p = ResizePolicy::default();
        assert!(!p.should_expand(5, 10));
        assert!(p.should_expand(6, 10));
        assert_eq!(p.expanded(10), 20);
    }

    /// Shrink uses truncating division and never goes below the base.
    #[test]
    fn shrink_threshold() {
        let p = ResizePolicy::default();
        assert!(!p.should_shrink(0, 10), "never shrink at the base");
        assert!(p.should_shrink(5, 20));
        assert!(!p.should_shrink(6, 20));
        assert_eq!(p.shrunk(20), 10);

        let odd = ResizePolicy::new(5, 2, 2).unwrap();
        // 10 / 2 = 5: two entries (2 * 2 = 4) qualify, three do not.
        assert!(odd.should_shrink(2, 10));
        assert!(!odd.should_shrink(3, 10));
        assert_eq!(odd.shrunk(10), 5);
    }
}
