//! The secure-computation collaborator interface.
//!
//! The pipeline does not implement any cryptography itself: every
//! secret-shared operation is delegated to an engine behind this trait.
//! Production engines wrap an oblivious-transfer stack; [`crate::ideal`]
//! provides an insecure reference engine for tests, examples and benches.

use crate::Result;
use sagg_math::{BitShare, RingDomain, RingShare};

/// Secret-shared primitives consumed by the aggregation pipeline.
///
/// Calls are per-party, blocking and synchronous: both parties must invoke
/// the same method with matching arguments in the same order, and each call
/// performs its own network rounds before returning. The round structure is
/// part of the protocol, so callers must not overlap calls or reorder
/// stages.
pub trait SecureCompute {
    /// Batched sign agreement: given XOR-shares of a reference bit vector
    /// and a client bit vector, both of length `n`, returns XOR-shares of
    /// `reference ⊕ client ⊕ 1` per slot (1 where the two agree).
    fn secure_agreement(&mut self, n: usize, reference: &[u8], client: &[u8])
        -> Result<BitShare>;

    /// Chooses the split parameter for the trust-score reduction.
    ///
    /// Purely local, deterministic, and without influence on the numeric
    /// result; the split only trades communication rounds against circuit
    /// depth.
    fn select_split(&self, dim: usize) -> usize;

    /// Per-user population count of the agreement shares: consumes
    /// `num_users * dim` boolean shares (user-major) and returns, per user,
    /// an additive share in `domain` of the number of set agreement bits.
    fn secure_trust_score(
        &mut self,
        num_users: usize,
        dim: usize,
        agreement: &BitShare,
        split: usize,
        domain: RingDomain,
    ) -> Result<RingShare>;

    /// Zero-clamped rectifier over additive shares: returns shares of
    /// `max(0, x)` under the signed interpretation of the input ring.
    /// When `with_comparison` is set, shares of the sign bits are returned
    /// as well.
    fn secure_rectify(
        &mut self,
        values: &RingShare,
        with_comparison: bool,
    ) -> Result<(RingShare, Option<BitShare>)>;

    /// Weighted aggregation: for every gradient coordinate, the inner
    /// product of the per-user weights (additive shares) with the client
    /// bits (XOR-shares, user-major), as additive shares in `out_domain`.
    /// The engine performs the width extension from the weight ring into
    /// `out_domain`.
    fn secure_weighted_agg(
        &mut self,
        client_bits: &BitShare,
        weights: &RingShare,
        num_users: usize,
        dim: usize,
        out_domain: RingDomain,
    ) -> Result<RingShare>;
}
