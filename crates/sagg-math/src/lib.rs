#![crate_name = "sagg_math"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Share arithmetic for the sagg.rs library: rings of integers modulo
//! `2^b` with their bit-width/masking discipline, and the XOR / additive
//! share containers the protocol pipeline moves between stages.

mod ring;
mod share;

pub use ring::RingDomain;
pub use share::{BitShare, RingShare};

use thiserror::Error;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// The errors of this library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A ring bit-width outside the representable `1..=64` range.
    #[error("Invalid ring bit-width: {0} (expected 1 to 64)")]
    InvalidWidth(u32),

    /// A derived ring bit-width that no longer fits the 64-bit share slots.
    #[error("Ring bit-width {0} exceeds the 64-bit share representation")]
    WidthOverflow(u32),

    /// A ring was sized for zero values.
    #[error("Cannot size a ring for zero values")]
    ZeroCount,

    /// Two share vectors of different lengths were combined.
    #[error("Share length mismatch: expected {0}, found {1}")]
    LengthMismatch(usize, usize),

    /// Two ring shares from different domains were combined.
    #[error("Ring domain mismatch: {0}-bit share combined with {1}-bit share")]
    DomainMismatch(u32, u32),

    /// A serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
