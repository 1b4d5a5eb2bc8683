//! The four-stage secure aggregation pipeline.
//!
//! Stage 1 computes boolean shares of sign agreement between the reference
//! vector and every client vector; stage 2 reduces them to per-user trust
//! scores (agreement counts) in the `2^b1` ring; stage 3 shifts by the
//! plaintext threshold and rectifies, yielding per-user weights; stage 4
//! aggregates the client bits under those weights into the `2^b2` ring.
//! Each stage consumes the previous stage's share buffer by move, and every
//! secret-shared operation happens inside the [`SecureCompute`] engine; the
//! pipeline's own work is share encoding, bit-width bookkeeping and the
//! local threshold shift.

use crate::{AggParameters, Error, Result, Role, SecureCompute};
use rayon::prelude::*;
use sagg_math::{BitShare, RingShare};
use std::sync::Arc;

/// One party's side of the aggregation pipeline.
///
/// Both parties construct an `Aggregator` from identical parameters and run
/// it in lockstep; the stages are strictly ordered and each engine call
/// blocks on its own network rounds.
pub struct Aggregator<C> {
    params: Arc<AggParameters>,
    role: Role,
    engine: C,
    pool: rayon::ThreadPool,
}

impl<C: SecureCompute> Aggregator<C> {
    /// Create a pipeline for one party.
    ///
    /// Builds the bounded worker pool for local share sweeps; the pool size
    /// was validated when `params` was built.
    pub fn new(params: Arc<AggParameters>, role: Role, engine: C) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.num_threads())
            .build()
            .map_err(|e| Error::UnspecifiedInput(format!("Worker pool: {e}")))?;
        Ok(Self {
            params,
            role,
            engine,
            pool,
        })
    }

    /// The run parameters.
    pub fn params(&self) -> &Arc<AggParameters> {
        &self.params
    }

    /// This party's role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Borrow the engine, e.g. to reveal stage outputs over its link in a
    /// verification harness.
    pub fn engine_mut(&mut self) -> &mut C {
        &mut self.engine
    }

    /// Consume the pipeline, returning the engine (e.g. to reveal results
    /// over its link afterwards).
    pub fn into_engine(self) -> C {
        self.engine
    }

    /// Run all four stages.
    ///
    /// `reference` is this party's XOR-share of the length-`dim_grad`
    /// reference sign vector; `clients` its XOR-share of the user-major
    /// `num_users * dim_grad` client sign matrix. Returns this party's
    /// additive share of the aggregate gradient, one `2^b2` ring value per
    /// coordinate. Any error aborts the run; no partial result is
    /// delivered.
    pub fn run(&mut self, reference: &BitShare, clients: &BitShare) -> Result<RingShare> {
        let agreement = self.sign_agreement(reference, clients)?;
        let scores = self.trust_scores(agreement)?;
        let weights = self.filter_byzantine(scores)?;
        self.weighted_aggregate(clients, weights)
    }

    /// Stage 1: boolean shares of per-(user, coordinate) sign agreement.
    ///
    /// The reference share is replicated user-major before the batched
    /// engine call; replication is linear, so each party replicates its own
    /// share locally.
    pub fn sign_agreement(&mut self, reference: &BitShare, clients: &BitShare) -> Result<BitShare> {
        let d = self.params.dim_grad();
        let n = self.params.num_users();
        if reference.len() != d {
            return Err(Error::share_length("reference", d, reference.len()));
        }
        if clients.len() != n * d {
            return Err(Error::share_length("client", n * d, clients.len()));
        }

        let replicated = self.replicate_reference(reference);
        let agreement = self
            .engine
            .secure_agreement(n * d, replicated.as_slice(), clients.as_slice())?;
        if agreement.len() != n * d {
            return Err(Error::share_length("agreement", n * d, agreement.len()));
        }
        Ok(agreement)
    }

    /// Stage 2: additive shares of per-user trust scores in the `2^b1`
    /// ring.
    pub fn trust_scores(&mut self, agreement: BitShare) -> Result<RingShare> {
        let d = self.params.dim_grad();
        let n = self.params.num_users();
        if agreement.len() != n * d {
            return Err(Error::share_length("agreement", n * d, agreement.len()));
        }

        let domain = self.params.score_domain();
        let split = self.engine.select_split(d);
        if split == 0 || split > d {
            return Err(Error::invalid_split(split, d));
        }
        let scores = self
            .engine
            .secure_trust_score(n, d, &agreement, split, domain)?;
        if scores.len() != n {
            return Err(Error::share_length("trust score", n, scores.len()));
        }
        Ok(scores)
    }

    /// Stage 3: additive shares of post-threshold client weights.
    ///
    /// The coordinator shifts its own score shares by the plaintext
    /// threshold (reduced in the ring immediately); the data party's shares
    /// pass through unchanged. The rectifier then zero-clamps the shifted
    /// scores in shares.
    pub fn filter_byzantine(&mut self, scores: RingShare) -> Result<RingShare> {
        let n = self.params.num_users();
        let domain = self.params.score_domain();
        if scores.len() != n {
            return Err(Error::share_length("trust score", n, scores.len()));
        }
        if scores.domain() != domain {
            return Err(Error::wrong_domain(
                "trust score",
                domain.width(),
                scores.domain().width(),
            ));
        }

        let shifted = match self.role {
            Role::Coordinator => {
                let threshold = self.params.threshold();
                let mut values = scores.into_values();
                values
                    .iter_mut()
                    .for_each(|v| *v = domain.sub(*v, threshold));
                RingShare::new(values, domain)
            }
            Role::Data => scores,
        };

        let (weights, _) = self.engine.secure_rectify(&shifted, false)?;
        if weights.len() != n {
            return Err(Error::share_length("weight", n, weights.len()));
        }
        Ok(weights)
    }

    /// Stage 4: additive shares of the aggregate gradient in the `2^b2`
    /// ring.
    pub fn weighted_aggregate(&mut self, clients: &BitShare, weights: RingShare) -> Result<RingShare> {
        let d = self.params.dim_grad();
        let n = self.params.num_users();
        if clients.len() != n * d {
            return Err(Error::share_length("client", n * d, clients.len()));
        }
        if weights.len() != n {
            return Err(Error::share_length("weight", n, weights.len()));
        }
        if weights.domain() != self.params.score_domain() {
            return Err(Error::wrong_domain(
                "weight",
                self.params.score_width(),
                weights.domain().width(),
            ));
        }

        let out_domain = self.params.output_domain();
        let output = self
            .engine
            .secure_weighted_agg(clients, &weights, n, d, out_domain)?;
        if output.len() != d {
            return Err(Error::share_length("aggregate", d, output.len()));
        }
        Ok(output)
    }

    /// Replicate this party's reference share user-major to `num_users *
    /// dim_grad` slots, using the bounded worker pool; users own disjoint
    /// output slices.
    fn replicate_reference(&self, reference: &BitShare) -> BitShare {
        let d = self.params.dim_grad();
        let n = self.params.num_users();
        let mut replicated = vec![0u8; n * d];
        self.pool.install(|| {
            replicated
                .par_chunks_mut(d)
                .for_each(|row| row.copy_from_slice(reference.as_slice()));
        });
        BitShare::new(replicated)
    }
}
