//! Rings of integers modulo `2^b` for `b` up to 64.

use crate::{Error, Result};
use rand::{CryptoRng, RngCore};
use sagg_util::ceil_log2;

/// A ring of integers modulo `2^b`, `1 <= b <= 64`.
///
/// Values are carried in `u64` slots; every operation reduces its result by
/// the ring mask before returning it. Local arithmetic on shares must go
/// through these operations: an unreduced intermediate silently corrupts
/// every stage downstream, since wraparound is defined ring behaviour and
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingDomain {
    width: u32,
    mask: u64,
}

impl RingDomain {
    /// Create the ring of integers modulo `2^width`.
    pub fn new(width: u32) -> Result<Self> {
        if width == 0 || width > 64 {
            return Err(Error::InvalidWidth(width));
        }
        // `1 << 64` is not a valid u64 shift; the all-ones mask is spelled
        // out for the full-width ring.
        let mask = if width == 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        Ok(Self { width, mask })
    }

    /// Size a ring for population counts in `0..=max_count`, with one extra
    /// guard bit so that counts shifted by a plaintext offset of at most
    /// `max_count` stay inside the signed range.
    pub fn for_count(max_count: u64) -> Result<Self> {
        let bound = max_count.checked_add(1).ok_or(Error::WidthOverflow(65))?;
        let width = ceil_log2(bound) + 1;
        if width > 64 {
            return Err(Error::WidthOverflow(width));
        }
        Self::new(width)
    }

    /// Widen this ring so a sum of up to `terms` values, each reduced in
    /// `self`, cannot wrap.
    pub fn extended(&self, terms: u64) -> Result<Self> {
        if terms == 0 {
            return Err(Error::ZeroCount);
        }
        let width = self.width + ceil_log2(terms);
        if width > 64 {
            return Err(Error::WidthOverflow(width));
        }
        Self::new(width)
    }

    /// The bit-width `b`.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The reduction mask `2^b - 1`.
    pub const fn mask(&self) -> u64 {
        self.mask
    }

    /// Reduce a value into the ring.
    pub const fn reduce(&self, v: u64) -> u64 {
        v & self.mask
    }

    /// Reduce a vector of values in place.
    pub fn reduce_vec(&self, v: &mut [u64]) {
        v.iter_mut().for_each(|vi| *vi &= self.mask);
    }

    /// Addition in the ring.
    pub const fn add(&self, a: u64, b: u64) -> u64 {
        a.wrapping_add(b) & self.mask
    }

    /// Subtraction in the ring.
    pub const fn sub(&self, a: u64, b: u64) -> u64 {
        a.wrapping_sub(b) & self.mask
    }

    /// Multiplication in the ring.
    pub const fn mul(&self, a: u64, b: u64) -> u64 {
        a.wrapping_mul(b) & self.mask
    }

    /// Additive inverse in the ring.
    pub const fn neg(&self, a: u64) -> u64 {
        a.wrapping_neg() & self.mask
    }

    /// Elementwise ring addition of two equal-length vectors.
    pub fn add_vec(&self, a: &[u64], b: &[u64]) -> Result<Vec<u64>> {
        if a.len() != b.len() {
            return Err(Error::LengthMismatch(a.len(), b.len()));
        }
        Ok(a.iter().zip(b).map(|(&x, &y)| self.add(x, y)).collect())
    }

    /// Whether `v` is negative under the signed (two's complement)
    /// interpretation of the ring: the top bit of the `b`-bit value is set.
    pub const fn is_negative(&self, v: u64) -> bool {
        (v >> (self.width - 1)) & 1 == 1
    }

    /// Zero-clamped value of `v` under the signed interpretation:
    /// `max(0, v)`.
    pub const fn rectify(&self, v: u64) -> u64 {
        if self.is_negative(v) {
            0
        } else {
            v & self.mask
        }
    }

    /// Sample `len` uniformly random ring elements.
    pub fn random_vec<R: RngCore + CryptoRng>(&self, len: usize, rng: &mut R) -> Vec<u64> {
        (0..len).map(|_| rng.next_u64() & self.mask).collect()
    }
}
