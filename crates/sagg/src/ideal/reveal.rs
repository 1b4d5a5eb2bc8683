//! Reconstruction of shares across a link.
//!
//! Opening a share reveals the plaintext to both parties; the online
//! protocol never does this. The verification tests and the demo use it to
//! check stage outputs against their plaintext references.

use crate::{Error, Result};
use sagg_math::{BitShare, RingShare};
use sagg_traits::{Deserialize, DeserializeWithDomain, Exchange, Reconstruct, Serialize};

/// Exchange boolean shares with the peer and reconstruct the plaintext
/// bits.
pub fn reveal_bits<T: Exchange>(share: &BitShare, link: &mut T) -> Result<Vec<u8>> {
    let theirs = link
        .exchange(&share.to_bytes())
        .map_err(|e| Error::transport(e.to_string()))?;
    let peer = BitShare::from_bytes(&theirs)?;
    Ok(share.reconstruct(&peer)?)
}

/// Exchange ring shares with the peer and reconstruct the plaintext
/// values.
///
/// When `bound` is given, every reconstructed value must lie in
/// `0..=bound`; anything larger means the bit-width discipline or a
/// collaborator is broken and is surfaced as a protocol invariant
/// violation.
pub fn reveal_ring<T: Exchange>(
    share: &RingShare,
    link: &mut T,
    bound: Option<u64>,
) -> Result<Vec<u64>> {
    let theirs = link
        .exchange(&share.to_bytes())
        .map_err(|e| Error::transport(e.to_string()))?;
    let peer = RingShare::from_bytes(&theirs, &share.domain())?;
    let plain = share.reconstruct(&peer)?;
    if let Some(bound) = bound {
        for (i, &v) in plain.iter().enumerate() {
            if v > bound {
                return Err(Error::invariant_violation("reveal", i, v, bound));
            }
        }
    }
    Ok(plain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ideal::LocalLink;
    use sagg_math::RingDomain;
    use std::thread;

    #[test]
    fn reveal_bits_opens_the_xor() {
        let (mut link_a, mut link_b) = LocalLink::pair();
        let a = BitShare::new(vec![1, 0, 1, 0]);
        let b = BitShare::new(vec![0, 0, 1, 1]);

        let b2 = b.clone();
        let handle = thread::spawn(move || reveal_bits(&b2, &mut link_b).unwrap());
        let from_a = reveal_bits(&a, &mut link_a).unwrap();
        let from_b = handle.join().unwrap();

        assert_eq!(from_a, vec![1, 0, 0, 1]);
        assert_eq!(from_b, from_a);
    }

    #[test]
    fn reveal_ring_checks_the_bound() {
        let domain = RingDomain::new(6).unwrap();
        let a = RingShare::new(vec![10, 50], domain);
        let b = RingShare::new(vec![5, 10], domain);

        let (mut link_a, mut link_b) = LocalLink::pair();
        let b2 = b.clone();
        let handle = thread::spawn(move || reveal_ring(&b2, &mut link_b, None).unwrap());
        let opened = reveal_ring(&a, &mut link_a, Some(20)).unwrap_err();
        // Reconstructed second slot is 60, past the bound of 20.
        assert!(opened.to_string().contains("60"));
        assert_eq!(handle.join().unwrap(), vec![15, 60]);
    }
}
