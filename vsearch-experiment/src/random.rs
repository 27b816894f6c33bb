//! Shuffling and integer sampling shared by the generators.

use rand::Rng;
use rand::seq::SliceRandom;

/// Uniform in-place permutation (Fisher–Yates).
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Uniform integer in `min..=max`; reversed bounds are swapped.
pub fn int_in_range<R: Rng + ?Sized>(rng: &mut R, min: u64, max: u64) -> u64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    rng.random_range(lo..=hi)
}
