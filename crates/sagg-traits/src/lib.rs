#![crate_name = "sagg_traits"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Traits shared across the sagg.rs crates.

use rand::{CryptoRng, RngCore};

/// Recombine two parties' shares of a secret-shared vector into its
/// plaintext.
///
/// The combination rule depends on the sharing: XOR for boolean shares,
/// addition modulo `2^b` for ring shares. Reconstruction is a test and
/// verification facility; it never happens during the online protocol.
pub trait Reconstruct {
    /// The plaintext type produced by recombining shares.
    type Plain;

    /// The error type.
    type Error;

    /// Combine this party's share with the peer's share.
    fn reconstruct(&self, other: &Self) -> Result<Self::Plain, Self::Error>;
}

/// Sample a uniformly random share vector.
pub trait Sample: Sized {
    /// Context needed to sample a value, e.g. the ring the values live in.
    type Context;

    /// Sample `len` uniformly random slots under `ctx`.
    fn sample<R: RngCore + CryptoRng>(ctx: &Self::Context, len: usize, rng: &mut R) -> Self;
}

/// Serialize a share into its wire encoding.
pub trait Serialize {
    /// Serialize `self` into a vector of bytes.
    fn to_bytes(&self) -> Vec<u8>;
}

/// Deserialize a share from its wire encoding.
pub trait Deserialize: Sized {
    /// The error type.
    type Error;

    /// Attempt to deserialize from a vector of bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

/// Deserialize a share whose encoding is only meaningful relative to a
/// domain (e.g. ring shares, which carry no modulus on the wire).
pub trait DeserializeWithDomain: Sized {
    /// The domain the deserialized value lives in.
    type Domain;

    /// The error type.
    type Error;

    /// Attempt to deserialize from a vector of bytes under `domain`.
    fn from_bytes(bytes: &[u8], domain: &Self::Domain) -> Result<Self, Self::Error>;
}

/// A blocking duplex link between the two protocol parties.
///
/// Every call is one full network round: the outgoing buffer is handed to
/// the peer and the call blocks until the peer's buffer of the same round
/// arrives. Implementations must preserve message boundaries and ordering.
/// The round-per-call signature is deliberate: callers sequence rounds,
/// they cannot pipeline across them.
pub trait Exchange {
    /// The error type raised on transport failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Perform one synchronous round: send `outgoing`, receive the peer's
    /// buffer for the same round.
    fn exchange(&mut self, outgoing: &[u8]) -> Result<Vec<u8>, Self::Error>;
}
