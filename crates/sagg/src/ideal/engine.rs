//! The ideal-functionality reference engine.

use crate::{Error, Result, Role, SecureCompute};
use itertools::izip;
use ndarray::ArrayView2;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use sagg_math::{BitShare, RingDomain, RingShare};
use sagg_traits::{Deserialize, DeserializeWithDomain, Exchange, Reconstruct, Sample, Serialize};
use sagg_util::hamming_weight;
use zeroize::Zeroizing;

/// An insecure reference implementation of [`SecureCompute`].
///
/// The coordinator endpoint plays the ideal functionality: per primitive,
/// the data party ships its input shares over (round one), the coordinator
/// reconstructs the plaintext, evaluates the primitive, keeps a fresh
/// uniform share for itself and returns the complement to the data party
/// (round two). Reconstructed plaintexts live only inside zeroized buffers.
///
/// Each primitive therefore costs exactly two blocking rounds, mirroring
/// the call-per-round shape of a real oblivious-transfer engine, and the
/// output shares have the exact semantics the pipeline relies on, which is
/// all a correctness test needs. There is no security here: the coordinator
/// sees every input in the clear.
pub struct IdealCompute<T> {
    role: Role,
    link: T,
    rng: ChaCha20Rng,
}

impl<T: Exchange> IdealCompute<T> {
    /// Create one party's endpoint of the ideal engine.
    ///
    /// `seed` drives the share dealing on the coordinator side; the data
    /// party's endpoint never uses it.
    pub fn new(role: Role, link: T, seed: u64) -> Self {
        Self {
            role,
            link,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// This endpoint's role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Borrow the underlying link, e.g. to reveal shares after a run.
    pub fn link_mut(&mut self) -> &mut T {
        &mut self.link
    }

    /// Consume the endpoint, returning the underlying link.
    pub fn into_link(self) -> T {
        self.link
    }

    fn round(&mut self, outgoing: &[u8]) -> Result<Vec<u8>> {
        self.link
            .exchange(outgoing)
            .map_err(|e| Error::transport(e.to_string()))
    }
}

impl<T: Exchange> SecureCompute for IdealCompute<T> {
    fn secure_agreement(
        &mut self,
        n: usize,
        reference: &[u8],
        client: &[u8],
    ) -> Result<BitShare> {
        if reference.len() != n {
            return Err(Error::share_length("reference", n, reference.len()));
        }
        if client.len() != n {
            return Err(Error::share_length("client", n, client.len()));
        }

        match self.role {
            Role::Data => {
                let mut payload = Vec::with_capacity(2 * n);
                payload.extend_from_slice(reference);
                payload.extend_from_slice(client);
                self.round(&payload)?;
                let share = self.round(&[])?;
                if share.len() != n {
                    return Err(Error::malformed_message(
                        "agreement",
                        format!("{} share slots, expected {n}", share.len()),
                    ));
                }
                Ok(BitShare::from_bytes(&share)?)
            }
            Role::Coordinator => {
                let incoming = self.round(&[])?;
                if incoming.len() != 2 * n {
                    return Err(Error::malformed_message(
                        "agreement",
                        format!("{} input bytes, expected {}", incoming.len(), 2 * n),
                    ));
                }
                let peer_reference = BitShare::from_bytes(&incoming[..n])?;
                let peer_client = BitShare::from_bytes(&incoming[n..])?;

                let reference =
                    Zeroizing::new(BitShare::new(reference.to_vec()).reconstruct(&peer_reference)?);
                let client =
                    Zeroizing::new(BitShare::new(client.to_vec()).reconstruct(&peer_client)?);
                // XNOR: 1 exactly where the client sign matches the
                // reference sign.
                let agreement = Zeroizing::new(
                    izip!(reference.iter(), client.iter())
                        .map(|(r, c)| r ^ c ^ 1)
                        .collect::<Vec<u8>>(),
                );

                let ours = BitShare::sample(&(), n, &mut self.rng);
                let theirs: Vec<u8> = izip!(agreement.iter(), ours.as_slice())
                    .map(|(a, o)| a ^ o)
                    .collect();
                self.round(&theirs)?;
                Ok(ours)
            }
        }
    }

    fn select_split(&self, dim: usize) -> usize {
        // Block size for the two-level count reduction: the largest power
        // of two not above `dim`. Deterministic, local, and without effect
        // on the reduction's value, only on its round/depth trade-off.
        if dim <= 1 {
            1
        } else {
            1 << sagg_util::floor_log2(dim)
        }
    }

    fn secure_trust_score(
        &mut self,
        num_users: usize,
        dim: usize,
        agreement: &BitShare,
        split: usize,
        domain: RingDomain,
    ) -> Result<RingShare> {
        if agreement.len() != num_users * dim {
            return Err(Error::share_length(
                "agreement",
                num_users * dim,
                agreement.len(),
            ));
        }
        if split == 0 || split > dim {
            return Err(Error::invalid_split(split, dim));
        }

        match self.role {
            Role::Data => {
                self.round(&agreement.to_bytes())?;
                let share = self.round(&[])?;
                let scores = RingShare::from_bytes(&share, &domain)?;
                if scores.len() != num_users {
                    return Err(Error::malformed_message(
                        "trust score",
                        format!("{} share slots, expected {num_users}", scores.len()),
                    ));
                }
                Ok(scores)
            }
            Role::Coordinator => {
                let incoming = self.round(&[])?;
                let peer = BitShare::from_bytes(&incoming)?;
                let plain = Zeroizing::new(agreement.reconstruct(&peer)?);

                // Count per user, summing `split`-sized blocks first; the
                // total is the same for every valid split.
                let counts: Vec<u64> = plain
                    .par_chunks(dim)
                    .map(|row| row.chunks(split).map(hamming_weight).sum())
                    .collect();

                let ours = domain.random_vec(num_users, &mut self.rng);
                let theirs: Vec<u64> = izip!(&counts, &ours)
                    .map(|(&c, &o)| domain.sub(c, o))
                    .collect();
                self.round(&RingShare::new(theirs, domain).to_bytes())?;
                Ok(RingShare::new(ours, domain))
            }
        }
    }

    fn secure_rectify(
        &mut self,
        values: &RingShare,
        with_comparison: bool,
    ) -> Result<(RingShare, Option<BitShare>)> {
        let n = values.len();
        let domain = values.domain();

        match self.role {
            Role::Data => {
                self.round(&values.to_bytes())?;
                let reply = self.round(&[])?;
                let expected = if with_comparison { n * 8 + n } else { n * 8 };
                if reply.len() != expected {
                    return Err(Error::malformed_message(
                        "rectifier",
                        format!("{} reply bytes, expected {expected}", reply.len()),
                    ));
                }
                let rectified = RingShare::from_bytes(&reply[..n * 8], &domain)?;
                let comparison = if with_comparison {
                    Some(BitShare::from_bytes(&reply[n * 8..])?)
                } else {
                    None
                };
                Ok((rectified, comparison))
            }
            Role::Coordinator => {
                let incoming = self.round(&[])?;
                let peer = RingShare::from_bytes(&incoming, &domain)?;
                let plain = Zeroizing::new(values.reconstruct(&peer)?);

                let rectified: Vec<u64> = plain.iter().map(|&x| domain.rectify(x)).collect();
                let positive: Vec<u8> = plain
                    .iter()
                    .map(|&x| u8::from(!domain.is_negative(x)))
                    .collect();

                let ours = domain.random_vec(n, &mut self.rng);
                let mut reply: Vec<u8> = izip!(&rectified, &ours)
                    .map(|(&y, &o)| domain.sub(y, o))
                    .collect::<Vec<u64>>()
                    .iter()
                    .flat_map(|v| v.to_le_bytes())
                    .collect();

                let our_bits = if with_comparison {
                    let bits = BitShare::sample(&(), n, &mut self.rng);
                    reply.extend(
                        izip!(&positive, bits.as_slice()).map(|(p, b)| p ^ b),
                    );
                    Some(bits)
                } else {
                    None
                };

                self.round(&reply)?;
                Ok((RingShare::new(ours, domain), our_bits))
            }
        }
    }

    fn secure_weighted_agg(
        &mut self,
        client_bits: &BitShare,
        weights: &RingShare,
        num_users: usize,
        dim: usize,
        out_domain: RingDomain,
    ) -> Result<RingShare> {
        if client_bits.len() != num_users * dim {
            return Err(Error::share_length(
                "client",
                num_users * dim,
                client_bits.len(),
            ));
        }
        if weights.len() != num_users {
            return Err(Error::share_length("weight", num_users, weights.len()));
        }
        let weight_domain = weights.domain();
        if out_domain.width() < weight_domain.width() {
            return Err(Error::wrong_domain(
                "aggregate",
                weight_domain.width(),
                out_domain.width(),
            ));
        }

        match self.role {
            Role::Data => {
                let mut payload = client_bits.to_bytes();
                payload.extend(weights.to_bytes());
                self.round(&payload)?;
                let share = self.round(&[])?;
                let output = RingShare::from_bytes(&share, &out_domain)?;
                if output.len() != dim {
                    return Err(Error::malformed_message(
                        "aggregate",
                        format!("{} share slots, expected {dim}", output.len()),
                    ));
                }
                Ok(output)
            }
            Role::Coordinator => {
                let incoming = self.round(&[])?;
                let split_at = num_users * dim;
                if incoming.len() != split_at + num_users * 8 {
                    return Err(Error::malformed_message(
                        "aggregate",
                        format!(
                            "{} input bytes, expected {}",
                            incoming.len(),
                            split_at + num_users * 8
                        ),
                    ));
                }
                let peer_bits = BitShare::from_bytes(&incoming[..split_at])?;
                let peer_weights =
                    RingShare::from_bytes(&incoming[split_at..], &weight_domain)?;

                let bits = Zeroizing::new(client_bits.reconstruct(&peer_bits)?);
                let plain_weights = Zeroizing::new(weights.reconstruct(&peer_weights)?);

                // Post-rectifier weights are non-negative by construction;
                // a negative reconstruction means the bit-width discipline
                // or the rectifier is broken.
                let weight_bound = (weight_domain.mask() >> 1).max(1);
                for (i, &w) in plain_weights.iter().enumerate() {
                    if weight_domain.is_negative(w) {
                        return Err(Error::invariant_violation(
                            "weight",
                            i,
                            w,
                            weight_bound,
                        ));
                    }
                }

                let matrix = ArrayView2::from_shape((num_users, dim), bits.as_slice())
                    .map_err(|_| {
                        Error::malformed_message(
                            "aggregate",
                            format!("client matrix is not {num_users}x{dim}"),
                        )
                    })?;
                let totals: Vec<u64> = (0..dim)
                    .into_par_iter()
                    .map(|j| {
                        let mut acc = 0u64;
                        for (&w, &b) in izip!(plain_weights.iter(), matrix.column(j)) {
                            acc = acc.wrapping_add(w.wrapping_mul(u64::from(b)));
                        }
                        out_domain.reduce(acc)
                    })
                    .collect();

                let ours = out_domain.random_vec(dim, &mut self.rng);
                let theirs: Vec<u64> = izip!(&totals, &ours)
                    .map(|(&t, &o)| out_domain.sub(t, o))
                    .collect();
                self.round(&RingShare::new(theirs, out_domain).to_bytes())?;
                Ok(RingShare::new(ours, out_domain))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ideal::{verify, LocalLink};
    use itertools::izip;
    use rand::rngs::OsRng;
    use sagg_util::sample_bits;
    use std::thread;

    fn engines(seed: u64) -> (IdealCompute<LocalLink>, IdealCompute<LocalLink>) {
        let (link_a, link_b) = LocalLink::pair();
        (
            IdealCompute::new(Role::Coordinator, link_a, seed),
            IdealCompute::new(Role::Data, link_b, seed),
        )
    }

    #[test]
    fn agreement_reconstructs_to_xnor() {
        let n = 256;
        let reference = sample_bits(n, &mut OsRng);
        let client = sample_bits(n, &mut OsRng);
        let (mut alice, mut bob) = engines(11);

        // Degenerate sharing: the coordinator holds the reference in the
        // clear, the data party the client bits.
        let (ref_a, cli_a) = (reference.clone(), vec![0u8; n]);
        let (ref_b, cli_b) = (vec![0u8; n], client.clone());

        let handle = thread::spawn(move || bob.secure_agreement(n, &ref_b, &cli_b).unwrap());
        let share_a = alice.secure_agreement(n, &ref_a, &cli_a).unwrap();
        let share_b = handle.join().unwrap();

        let opened = share_a.reconstruct(&share_b).unwrap();
        let expected = verify::expected_agreement(&reference, &client, 1, n);
        assert_eq!(opened, expected);
    }

    #[test]
    fn trust_score_counts_agreements_for_any_split() {
        let (num_users, dim) = (3, 50);
        let agreement = sample_bits(num_users * dim, &mut OsRng);
        let expected = verify::expected_scores(&agreement, num_users, dim);
        let domain = RingDomain::for_count(dim as u64).unwrap();

        for split in [1usize, 2, 7, 32, 50] {
            let (mut alice, mut bob) = engines(split as u64);
            let share_a = BitShare::sample(&(), num_users * dim, &mut OsRng);
            let share_b = BitShare::new(
                izip!(&agreement, share_a.as_slice())
                    .map(|(p, s)| p ^ s)
                    .collect(),
            );

            let handle = thread::spawn(move || {
                bob.secure_trust_score(num_users, dim, &share_b, split, domain)
                    .unwrap()
            });
            let out_a = alice
                .secure_trust_score(num_users, dim, &share_a, split, domain)
                .unwrap();
            let out_b = handle.join().unwrap();

            assert_eq!(out_a.reconstruct(&out_b).unwrap(), expected);
        }
    }

    #[test]
    fn split_selection_is_deterministic_and_valid() {
        let (alice, _bob) = engines(0);
        for dim in [1usize, 2, 3, 5, 64, 5000, 1 << 20] {
            let split = alice.select_split(dim);
            assert!(split >= 1 && split <= dim);
            assert_eq!(split, alice.select_split(dim));
        }
        assert_eq!(alice.select_split(5000), 4096);
    }

    #[test]
    fn rectifier_zero_clamps_negative_values() {
        let domain = RingDomain::new(6).unwrap();
        // Plaintexts: positives stay, negatives (top bit set) clamp.
        let plain: Vec<u64> = vec![0, 1, 17, 31, 32, 40, 63];
        let expected: Vec<u64> = vec![0, 1, 17, 31, 0, 0, 0];

        let (mut alice, mut bob) = engines(23);
        let share_a = RingShare::sample(&domain, plain.len(), &mut OsRng);
        let share_b = RingShare::new(
            izip!(&plain, share_a.as_slice())
                .map(|(&p, &s)| domain.sub(p, s))
                .collect(),
            domain,
        );

        let handle = thread::spawn(move || bob.secure_rectify(&share_b, true).unwrap());
        let (out_a, cmp_a) = alice.secure_rectify(&share_a, true).unwrap();
        let (out_b, cmp_b) = handle.join().unwrap();

        assert_eq!(out_a.reconstruct(&out_b).unwrap(), expected);
        let positive = cmp_a
            .unwrap()
            .reconstruct(&cmp_b.unwrap())
            .unwrap();
        assert_eq!(positive, vec![1, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn weighted_agg_matches_plaintext_inner_products() {
        let (num_users, dim) = (4, 33);
        let clients = sample_bits(num_users * dim, &mut OsRng);
        let weights: Vec<u64> = vec![0, 3, 1, 7];
        let expected = verify::expected_aggregate(&clients, &weights, num_users, dim);

        let domain = RingDomain::for_count(dim as u64).unwrap();
        let out_domain = domain.extended(num_users as u64).unwrap();

        let (mut alice, mut bob) = engines(31);
        let bits_a = BitShare::sample(&(), num_users * dim, &mut OsRng);
        let bits_b = BitShare::new(
            izip!(&clients, bits_a.as_slice())
                .map(|(p, s)| p ^ s)
                .collect(),
        );
        let w_a = RingShare::sample(&domain, num_users, &mut OsRng);
        let w_b = RingShare::new(
            izip!(&weights, w_a.as_slice())
                .map(|(&p, &s)| domain.sub(p, s))
                .collect(),
            domain,
        );

        let handle = thread::spawn(move || {
            bob.secure_weighted_agg(&bits_b, &w_b, num_users, dim, out_domain)
                .unwrap()
        });
        let out_a = alice
            .secure_weighted_agg(&bits_a, &w_a, num_users, dim, out_domain)
            .unwrap();
        let out_b = handle.join().unwrap();

        assert_eq!(out_a.reconstruct(&out_b).unwrap(), expected);
    }

    #[test]
    fn negative_weights_violate_the_protocol_invariant() {
        let (num_users, dim) = (2, 4);
        let domain = RingDomain::new(4).unwrap();
        let out_domain = domain.extended(num_users as u64).unwrap();

        // Weight 12 has the 4-bit sign bit set: impossible after a
        // rectifier, so the functionality must refuse it.
        let w_a = RingShare::new(vec![12, 1], domain);
        let w_b = RingShare::zero(num_users, domain);
        let bits_a = BitShare::zero(num_users * dim);
        let bits_b = BitShare::zero(num_users * dim);

        let (mut alice, mut bob) = engines(5);
        let handle = thread::spawn(move || {
            bob.secure_weighted_agg(&bits_b, &w_b, num_users, dim, out_domain)
        });
        let result = alice.secure_weighted_agg(&bits_a, &w_a, num_users, dim, out_domain);
        // The coordinator aborts before dealing shares; dropping its
        // endpoint unblocks the peer, which sees a transport failure.
        drop(alice);
        assert!(handle.join().unwrap().is_err());

        assert!(matches!(result, Err(Error::UnspecifiedInput(_))));
    }
}
