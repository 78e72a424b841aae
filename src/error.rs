//! Error type shared by keyed reads and policy validation.

use snafu::Snafu;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// `at` was asked for a key that is not in the map.
    #[snafu(display("No such key"))]
    KeyNotFound,

    #[snafu(display("Base number of buckets must be non-zero"))]
    ZeroBaseBuckets,

    #[snafu(display("Fullness coefficient must be non-zero"))]
    ZeroFullness,

    #[snafu(display("Resize coefficient must be at least 2, got {}", resize_coef))]
    ResizeCoefTooSmall { resize_coef: usize },
}
