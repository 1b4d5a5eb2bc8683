//! Error types for the secure aggregation protocol.

use thiserror::Error;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// The errors of this library.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// An error in the underlying share arithmetic.
    #[error("{0}")]
    MathError(#[from] sagg_math::Error),

    /// Too few values were provided.
    #[error("Too few values provided: {0} is below limit {1}")]
    TooFewValues(usize, usize),

    /// Too many values were provided.
    #[error("Too many values provided: {0} exceeds limit {1}")]
    TooManyValues(usize, usize),

    /// The transport to the peer failed; the run is aborted.
    #[error("Transport failure: {0}")]
    TransportError(String),

    /// An unspecified input error.
    #[error("{0}")]
    UnspecifiedInput(String),

    /// An unspecified error.
    #[error("{0}")]
    DefaultError(String),
}

/// Helper functions to create protocol-specific errors using the general
/// error types.
impl Error {
    /// Create an invalid dimension error.
    pub fn invalid_dimension(name: &str, value: usize) -> Self {
        Self::UnspecifiedInput(format!("{name} must be positive, got {value}"))
    }

    /// Create an invalid threshold ratio error.
    pub fn invalid_ratio(value: f64) -> Self {
        Self::UnspecifiedInput(format!(
            "Threshold ratio must lie in [0, 1], got {value}"
        ))
    }

    /// Create an invalid thread count error.
    pub fn invalid_thread_count(provided: usize, maximum: usize) -> Self {
        if provided == 0 {
            Self::TooFewValues(provided, 1)
        } else {
            Self::TooManyValues(provided, maximum)
        }
    }

    /// Create a share length error.
    pub fn share_length(what: &str, expected: usize, found: usize) -> Self {
        Self::UnspecifiedInput(format!(
            "{what} share has {found} slots, expected {expected}"
        ))
    }

    /// Create a ring domain error.
    pub fn wrong_domain(what: &str, expected: u32, found: u32) -> Self {
        Self::UnspecifiedInput(format!(
            "{what} share lives in a {found}-bit ring, expected {expected} bits"
        ))
    }

    /// Create an invalid split parameter error.
    pub fn invalid_split(split: usize, dim: usize) -> Self {
        Self::UnspecifiedInput(format!(
            "Split parameter {split} outside 1..={dim}"
        ))
    }

    /// Create a transport error.
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::TransportError(msg.into())
    }

    /// Create a malformed peer message error.
    pub fn malformed_message(stage: &str, detail: String) -> Self {
        Self::TransportError(format!("malformed {stage} message: {detail}"))
    }

    /// Create a protocol invariant violation error.
    ///
    /// A reconstructed value outside its expected range means the bit-width
    /// derivation or a collaborator is broken; the violation must surface,
    /// never be masked.
    pub fn invariant_violation(stage: &str, index: usize, value: u64, bound: u64) -> Self {
        Self::UnspecifiedInput(format!(
            "Protocol invariant violated: {stage}[{index}] reconstructs to {value}, outside 0..={bound}"
        ))
    }
}
