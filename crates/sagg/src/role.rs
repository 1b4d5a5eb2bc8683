//! Party roles in the two-party protocol.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a party plays in the aggregation.
///
/// The coordinating party contributes the reference sign vector and applies
/// the plaintext threshold shift; the data party contributes the client sign
/// vectors. Both run the same pipeline in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// The coordinating party (the original protocol's first party).
    Coordinator,
    /// The data party (the original protocol's second party).
    Data,
}

impl Role {
    /// Whether this is the coordinating party.
    pub fn is_coordinator(&self) -> bool {
        matches!(self, Role::Coordinator)
    }

    /// The peer's role.
    pub fn peer(&self) -> Role {
        match self {
            Role::Coordinator => Role::Data,
            Role::Data => Role::Coordinator,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Coordinator => write!(f, "coordinator"),
            Role::Data => write!(f, "data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_each_others_peers() {
        assert_eq!(Role::Coordinator.peer(), Role::Data);
        assert_eq!(Role::Data.peer(), Role::Coordinator);
        assert!(Role::Coordinator.is_coordinator());
        assert!(!Role::Data.is_coordinator());
    }
}
