#![crate_name = "sagg_util"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Utilities for the sagg.rs library.

use num_traits::{PrimInt, Unsigned};
use rand::{CryptoRng, RngCore};

/// Returns `ceil(log2(x))` for a positive integer `x`.
///
/// `ceil_log2(1) == 0`, `ceil_log2(2) == 1`, `ceil_log2(5) == 3`.
///
/// # Panics
/// Panics if `x` is zero.
pub fn ceil_log2<T: PrimInt + Unsigned>(x: T) -> u32 {
    assert!(x > T::zero(), "ceil_log2 is undefined for zero");
    let bits = (std::mem::size_of::<T>() * 8) as u32;
    if x == T::one() {
        0
    } else {
        bits - (x - T::one()).leading_zeros()
    }
}

/// Returns `floor(log2(x))` for a positive integer `x`.
///
/// # Panics
/// Panics if `x` is zero.
pub fn floor_log2<T: PrimInt + Unsigned>(x: T) -> u32 {
    assert!(x > T::zero(), "floor_log2 is undefined for zero");
    let bits = (std::mem::size_of::<T>() * 8) as u32;
    bits - 1 - x.leading_zeros()
}

/// Population count of a 0/1-valued byte slice.
///
/// Slots must hold 0 or 1; anything else has already corrupted the share
/// vector, so the count would be meaningless.
pub fn hamming_weight(bits: &[u8]) -> u64 {
    debug_assert!(bits.iter().all(|&b| b <= 1));
    bits.iter().map(|&b| u64::from(b)).sum()
}

/// Samples a vector of `len` uniformly random bits, one per byte slot.
pub fn sample_bits<R: RngCore + CryptoRng>(len: usize, rng: &mut R) -> Vec<u8> {
    let mut bits = vec![0u8; len];
    rng.fill_bytes(&mut bits);
    bits.iter_mut().for_each(|b| *b &= 1);
    bits
}
