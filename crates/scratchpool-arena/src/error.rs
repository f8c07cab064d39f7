//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// An [`ArenaConfig`](crate::ArenaConfig) value is out of range.
    InvalidConfig {
        /// Which constraint was violated.
        reason: String,
    },
    /// A pointer passed to `try_free` was not handed out by this arena,
    /// or was already freed.
    ForeignPointer {
        /// Address of the rejected pointer.
        addr: usize,
    },
    /// Internal bookkeeping no longer matches the backing storage.
    InvariantViolated {
        /// Description of the inconsistency.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
            Self::ForeignPointer { addr } => {
                write!(f, "pointer {addr:#x} is not owned by this arena")
            }
            Self::InvariantViolated { reason } => {
                write!(f, "arena invariant violated: {reason}")
            }
        }
    }
}

impl Error for ArenaError {}
