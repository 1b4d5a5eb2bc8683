//! Create parameters for an aggregation run.

use crate::{Error, Result};
use sagg_math::RingDomain;
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::sync::Arc;

/// Upper bound on the worker-pool size a run may request.
pub const MAX_THREADS: usize = 4;

/// Parameters for one aggregation run.
///
/// Constructed once through [`AggParametersBuilder`], validated at build
/// time, and immutable afterwards. Both parties must build from identical
/// inputs: the derived bit-widths and the plaintext threshold are part of
/// the protocol and have to agree on both sides.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct AggParameters {
    /// Number of participating clients.
    num_users: usize,

    /// Number of gradient coordinates per client.
    dim_grad: usize,

    /// Fraction of `dim_grad` a client must agree on to keep a positive
    /// weight.
    threshold_ratio: f64,

    /// Size of the bounded worker pool used for local share sweeps.
    num_threads: usize,

    /// Plaintext robustness threshold, `floor(dim_grad * threshold_ratio)`.
    threshold: u64,

    /// Bit-width of trust-score and weight shares.
    score_width: u32,

    /// Bit-width of the aggregate-output shares.
    output_width: u32,
}

impl AggParameters {
    /// Returns the number of participating clients.
    pub const fn num_users(&self) -> usize {
        self.num_users
    }

    /// Returns the gradient dimension.
    pub const fn dim_grad(&self) -> usize {
        self.dim_grad
    }

    /// Returns the configured threshold ratio.
    pub const fn threshold_ratio(&self) -> f64 {
        self.threshold_ratio
    }

    /// Returns the worker-pool size.
    pub const fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Returns the plaintext robustness threshold.
    pub const fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Returns the bit-width of trust-score and weight shares.
    pub const fn score_width(&self) -> u32 {
        self.score_width
    }

    /// Returns the bit-width of the aggregate-output shares.
    pub const fn output_width(&self) -> u32 {
        self.output_width
    }

    /// The ring trust scores and client weights live in (modulo
    /// `2^score_width`).
    pub fn score_domain(&self) -> RingDomain {
        RingDomain::new(self.score_width).expect("validated at build time")
    }

    /// The ring the aggregate output lives in (modulo `2^output_width`).
    pub fn output_domain(&self) -> RingDomain {
        RingDomain::new(self.output_width).expect("validated at build time")
    }
}

/// Builder for [`AggParameters`].
#[derive(Debug, Clone)]
pub struct AggParametersBuilder {
    num_users: usize,
    dim_grad: usize,
    threshold_ratio: f64,
    num_threads: usize,
}

impl Default for AggParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AggParametersBuilder {
    /// Creates a builder with no dimensions set and a single worker thread.
    pub fn new() -> Self {
        Self {
            num_users: 0,
            dim_grad: 0,
            threshold_ratio: 0.5,
            num_threads: 1,
        }
    }

    /// Sets the number of participating clients.
    pub fn set_num_users(mut self, num_users: usize) -> Self {
        self.num_users = num_users;
        self
    }

    /// Sets the gradient dimension.
    pub fn set_dim_grad(mut self, dim_grad: usize) -> Self {
        self.dim_grad = dim_grad;
        self
    }

    /// Sets the threshold ratio.
    pub fn set_threshold_ratio(mut self, threshold_ratio: f64) -> Self {
        self.threshold_ratio = threshold_ratio;
        self
    }

    /// Sets the worker-pool size.
    pub fn set_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Validate the configuration and derive the run parameters.
    ///
    /// Fails before any network activity: zero dimensions, a threshold
    /// ratio outside `[0, 1]`, a worker count outside `1..=MAX_THREADS`,
    /// or problem sizes whose aggregate ring would not fit 64-bit share
    /// slots are all rejected here.
    pub fn build(&self) -> Result<AggParameters> {
        if self.num_users == 0 {
            return Err(Error::invalid_dimension("num_users", self.num_users));
        }
        if self.dim_grad == 0 {
            return Err(Error::invalid_dimension("dim_grad", self.dim_grad));
        }
        if !self.threshold_ratio.is_finite()
            || self.threshold_ratio < 0.0
            || self.threshold_ratio > 1.0
        {
            return Err(Error::invalid_ratio(self.threshold_ratio));
        }
        if self.num_threads == 0 || self.num_threads > MAX_THREADS {
            return Err(Error::invalid_thread_count(self.num_threads, MAX_THREADS));
        }

        let score_domain = RingDomain::for_count(self.dim_grad as u64)?;
        let output_domain = score_domain.extended(self.num_users as u64)?;
        let threshold = (self.dim_grad as f64 * self.threshold_ratio).floor() as u64;

        Ok(AggParameters {
            num_users: self.num_users,
            dim_grad: self.dim_grad,
            threshold_ratio: self.threshold_ratio,
            num_threads: self.num_threads,
            threshold,
            score_width: score_domain.width(),
            output_width: output_domain.width(),
        })
    }

    /// Build the parameters behind an `Arc`, the form the pipeline takes.
    pub fn build_arc(&self) -> Result<Arc<AggParameters>> {
        self.build().map(Arc::new)
    }
}
