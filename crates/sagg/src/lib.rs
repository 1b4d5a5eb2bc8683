#![crate_name = "sagg"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Two-party Byzantine-robust secure aggregation for SignSGD-style
//! federated learning updates.
//!
//! A coordinating party and a data party jointly compute, over secret
//! shares, which of the clients' gradient-sign vectors agree with a
//! reference sign vector, derive a per-client trust weight that discounts
//! outlier clients, and produce the weighted aggregate gradient, without
//! either party learning the other's inputs or any intermediate value.
//!
//! The heart of the crate is the four-stage [`Aggregator`] pipeline: sign
//! agreement (XNOR over boolean shares), trust scores (per-user population
//! counts in the `2^b1` ring), robust filtering (threshold shift plus a
//! secure rectifier) and weighted aggregation (inner products in the
//! `2^b2` ring), with the bit-widths `b1` and `b2` derived from the
//! problem dimensions so no intermediate value can wrap. The secret-shared
//! primitives themselves sit behind the [`SecureCompute`] trait;
//! [`ideal`] ships an insecure reference engine for tests, examples and
//! benchmarks.

mod errors;
mod role;

pub mod engine;
pub mod ideal;
pub mod parameters;
pub mod pipeline;

pub use engine::SecureCompute;
pub use errors::{Error, Result};
pub use parameters::{AggParameters, AggParametersBuilder, MAX_THREADS};
pub use pipeline::Aggregator;
pub use role::Role;

#[cfg(doctest)]
doc_comment::doctest!("../../../README.md");
