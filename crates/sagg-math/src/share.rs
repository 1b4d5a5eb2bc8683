//! Secret-share containers.
//!
//! A [`BitShare`] is one party's XOR-share of a boolean vector, one logical
//! bit per byte slot. A [`RingShare`] is one party's additive share of a
//! vector of ring values modulo `2^b`. XOR-ing (resp. adding in the ring)
//! the two parties' shares slot by slot reconstructs the plaintext; a single
//! share is uniformly random and reveals nothing.

use crate::{Error, Result, RingDomain};
use itertools::izip;
use ndarray::ArrayView2;
use rand::{CryptoRng, RngCore};
use sagg_traits::{Deserialize, DeserializeWithDomain, Reconstruct, Sample, Serialize};
use zeroize::Zeroize;

/// One party's XOR-share of a boolean vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitShare {
    bits: Vec<u8>,
}

impl BitShare {
    /// Wrap a vector of bit slots, normalizing every slot to its low bit.
    pub fn new(mut bits: Vec<u8>) -> Self {
        bits.iter_mut().for_each(|b| *b &= 1);
        Self { bits }
    }

    /// The all-zero share of `len` bits.
    pub fn zero(len: usize) -> Self {
        Self { bits: vec![0; len] }
    }

    /// Number of bit slots.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the share is empty.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The bit slots.
    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }

    /// Consume the share, returning its bit slots.
    pub fn into_inner(self) -> Vec<u8> {
        self.bits
    }

    /// View the share as a `(rows, cols)` matrix, e.g. `(num_user,
    /// dim_grad)` for a user-major client share.
    pub fn as_matrix(&self, rows: usize, cols: usize) -> Result<ArrayView2<'_, u8>> {
        ArrayView2::from_shape((rows, cols), &self.bits)
            .map_err(|_| Error::LengthMismatch(rows * cols, self.bits.len()))
    }
}

impl Sample for BitShare {
    type Context = ();

    fn sample<R: RngCore + CryptoRng>(_ctx: &(), len: usize, rng: &mut R) -> Self {
        let mut bits = vec![0u8; len];
        rng.fill_bytes(&mut bits);
        Self::new(bits)
    }
}

impl Reconstruct for BitShare {
    type Plain = Vec<u8>;
    type Error = Error;

    fn reconstruct(&self, other: &Self) -> Result<Vec<u8>> {
        if self.len() != other.len() {
            return Err(Error::LengthMismatch(self.len(), other.len()));
        }
        Ok(izip!(&self.bits, &other.bits).map(|(a, b)| a ^ b).collect())
    }
}

impl Serialize for BitShare {
    fn to_bytes(&self) -> Vec<u8> {
        self.bits.clone()
    }
}

impl Deserialize for BitShare {
    type Error = Error;

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if let Some(bad) = bytes.iter().find(|&&b| b > 1) {
            return Err(Error::Serialization(format!(
                "bit slot holds {bad}, expected 0 or 1"
            )));
        }
        Ok(Self {
            bits: bytes.to_vec(),
        })
    }
}

impl Zeroize for BitShare {
    fn zeroize(&mut self) {
        self.bits.zeroize();
    }
}

/// One party's additive share of a vector of values modulo `2^b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingShare {
    values: Vec<u64>,
    domain: RingDomain,
}

impl RingShare {
    /// Wrap a vector of values, reducing every slot into the domain.
    pub fn new(mut values: Vec<u64>, domain: RingDomain) -> Self {
        domain.reduce_vec(&mut values);
        Self { values, domain }
    }

    /// The all-zero share of `len` values.
    pub fn zero(len: usize, domain: RingDomain) -> Self {
        Self {
            values: vec![0; len],
            domain,
        }
    }

    /// Number of value slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the share is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The ring the values live in.
    pub fn domain(&self) -> RingDomain {
        self.domain
    }

    /// The value slots.
    pub fn as_slice(&self) -> &[u64] {
        &self.values
    }

    /// Consume the share, returning its value slots.
    pub fn into_values(self) -> Vec<u64> {
        self.values
    }
}

impl Sample for RingShare {
    type Context = RingDomain;

    fn sample<R: RngCore + CryptoRng>(domain: &RingDomain, len: usize, rng: &mut R) -> Self {
        Self {
            values: domain.random_vec(len, rng),
            domain: *domain,
        }
    }
}

impl Reconstruct for RingShare {
    type Plain = Vec<u64>;
    type Error = Error;

    fn reconstruct(&self, other: &Self) -> Result<Vec<u64>> {
        if self.domain != other.domain {
            return Err(Error::DomainMismatch(
                self.domain.width(),
                other.domain.width(),
            ));
        }
        self.domain.add_vec(&self.values, &other.values)
    }
}

impl Serialize for RingShare {
    fn to_bytes(&self) -> Vec<u8> {
        self.values
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }
}

impl DeserializeWithDomain for RingShare {
    type Domain = RingDomain;
    type Error = Error;

    fn from_bytes(bytes: &[u8], domain: &RingDomain) -> Result<Self> {
        if bytes.len() % 8 != 0 {
            return Err(Error::Serialization(format!(
                "ring share encoding of {} bytes is not word-aligned",
                bytes.len()
            )));
        }
        let values = bytes
            .chunks_exact(8)
            .map(|c| {
                let v = u64::from_le_bytes(c.try_into().expect("chunk of 8 bytes"));
                if v != domain.reduce(v) {
                    Err(Error::Serialization(format!(
                        "value {v} exceeds the {}-bit ring mask",
                        domain.width()
                    )))
                } else {
                    Ok(v)
                }
            })
            .collect::<Result<Vec<u64>>>()?;
        Ok(Self {
            values,
            domain: *domain,
        })
    }
}

impl Zeroize for RingShare {
    fn zeroize(&mut self) {
        self.values.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn bit_share_normalizes_slots() {
        let share = BitShare::new(vec![0, 1, 2, 255]);
        assert_eq!(share.as_slice(), &[0, 1, 0, 1]);
    }

    #[test]
    fn bit_share_reconstructs_by_xor() {
        let a = BitShare::new(vec![1, 0, 1, 1]);
        let b = BitShare::new(vec![1, 1, 0, 1]);
        assert_eq!(a.reconstruct(&b).unwrap(), vec![0, 1, 1, 0]);
    }

    #[test]
    fn bit_share_length_mismatch_is_an_error() {
        let a = BitShare::zero(3);
        let b = BitShare::zero(4);
        assert_eq!(a.reconstruct(&b), Err(Error::LengthMismatch(3, 4)));
    }

    #[test]
    fn bit_share_matrix_view() {
        let share = BitShare::new(vec![1, 0, 0, 1, 1, 1]);
        let m = share.as_matrix(2, 3).unwrap();
        assert_eq!(m[[0, 0]], 1);
        assert_eq!(m[[1, 2]], 1);
        assert!(share.as_matrix(4, 2).is_err());
    }

    #[test]
    fn bit_share_serialization_round_trip() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let share = BitShare::sample(&(), 64, &mut rng);
        let bytes = share.to_bytes();
        assert_eq!(BitShare::from_bytes(&bytes).unwrap(), share);
        assert!(BitShare::from_bytes(&[0, 1, 7]).is_err());
    }

    #[test]
    fn ring_share_reduces_on_construction() {
        let domain = RingDomain::new(4).unwrap();
        let share = RingShare::new(vec![15, 16, 17], domain);
        assert_eq!(share.as_slice(), &[15, 0, 1]);
    }

    #[test]
    fn ring_share_reconstructs_modulo_2_pow_b() {
        let domain = RingDomain::new(4).unwrap();
        let a = RingShare::new(vec![9, 3], domain);
        let b = RingShare::new(vec![9, 2], domain);
        assert_eq!(a.reconstruct(&b).unwrap(), vec![2, 5]);
    }

    #[test]
    fn ring_share_domain_mismatch_is_an_error() {
        let a = RingShare::zero(2, RingDomain::new(4).unwrap());
        let b = RingShare::zero(2, RingDomain::new(5).unwrap());
        assert_eq!(a.reconstruct(&b), Err(Error::DomainMismatch(4, 5)));
    }

    #[test]
    fn ring_share_serialization_round_trip() {
        let domain = RingDomain::new(14).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let share = RingShare::sample(&domain, 16, &mut rng);
        let bytes = share.to_bytes();
        assert_eq!(bytes.len(), 16 * 8);
        assert_eq!(RingShare::from_bytes(&bytes, &domain).unwrap(), share);
    }

    #[test]
    fn ring_share_deserialization_rejects_unreduced_values() {
        let domain = RingDomain::new(4).unwrap();
        let bytes = 16u64.to_le_bytes().to_vec();
        assert!(RingShare::from_bytes(&bytes, &domain).is_err());
        assert!(RingShare::from_bytes(&bytes[..5], &domain).is_err());
    }

    #[test]
    fn shares_zeroize() {
        let mut bits = BitShare::new(vec![1, 1, 0]);
        bits.zeroize();
        assert!(bits.as_slice().iter().all(|&b| b == 0));

        let mut ring = RingShare::new(vec![3, 5], RingDomain::new(4).unwrap());
        ring.zeroize();
        assert!(ring.as_slice().iter().all(|&v| v == 0));
    }
}
