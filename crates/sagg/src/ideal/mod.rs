//! Insecure reference implementations for tests, examples and benchmarks.
//!
//! [`IdealCompute`] realizes the [`crate::SecureCompute`] primitives as an
//! ideal functionality: the coordinator side reconstructs both parties'
//! inputs in the clear, evaluates the primitive, and deals fresh uniform
//! shares back. This gives exactly the share semantics a cryptographic
//! engine provides, with none of its security: the data party's inputs are
//! revealed to the coordinator. Never use any of this outside a test or
//! benchmark setting.
//!
//! [`LocalLink`] is an in-memory [`Exchange`](sagg_traits::Exchange) pair
//! for running both parties inside one process, and [`reveal_bits`] /
//! [`reveal_ring`] reconstruct shares across a link, which is how the
//! verification routines (never the online protocol) open values.

mod engine;
mod link;
mod reveal;
pub mod verify;

pub use engine::IdealCompute;
pub use link::LocalLink;
pub use reveal::{reveal_bits, reveal_ring};
