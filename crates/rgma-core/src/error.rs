// crates/rgma-core/src/error.rs
// ============================================================================
// Module: R-GMA Errors
// Description: Public fault taxonomy and the internal unknown-resource signal.
// Purpose: Classify every failure as temporary or permanent for callers.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`RgmaError`] is the only error type callers see. A temporary fault means a
//! later retry may succeed; a permanent fault means it will not. Both carry the
//! number of operations a batch command completed before failing.
//!
//! [`CallError`] is the result of a single remote call before the resource
//! layer has interpreted it. Its `UnknownResource` variant is the signal that
//! drives resource recreation and never reaches callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Public Errors
// ============================================================================

/// Message used when an unknown-resource fault escapes recovery.
pub const UNKNOWN_RESOURCE_MESSAGE: &str = "Unknown resource.";

/// Errors returned by the R-GMA client API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RgmaError {
    /// The call failed but repeating it after a delay may succeed.
    #[error("{message}")]
    Temporary {
        /// Human-readable description.
        message: String,
        /// Operations that succeeded before the fault (batch commands).
        num_successful_ops: u32,
    },
    /// Repeating the call will not succeed.
    #[error("{message}")]
    Permanent {
        /// Human-readable description.
        message: String,
        /// Operations that succeeded before the fault (batch commands).
        num_successful_ops: u32,
    },
}

impl RgmaError {
    /// Builds a temporary fault.
    #[must_use]
    pub fn temporary(message: impl Into<String>) -> Self {
        Self::Temporary {
            message: message.into(),
            num_successful_ops: 0,
        }
    }

    /// Builds a permanent fault.
    #[must_use]
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent {
            message: message.into(),
            num_successful_ops: 0,
        }
    }

    /// Returns the same fault with the batch progress count replaced.
    #[must_use]
    pub fn with_successful_ops(self, count: u32) -> Self {
        match self {
            Self::Temporary {
                message, ..
            } => Self::Temporary {
                message,
                num_successful_ops: count,
            },
            Self::Permanent {
                message, ..
            } => Self::Permanent {
                message,
                num_successful_ops: count,
            },
        }
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Temporary {
                message, ..
            }
            | Self::Permanent {
                message, ..
            } => message,
        }
    }

    /// Returns the number of operations that succeeded before the fault.
    #[must_use]
    pub const fn num_successful_ops(&self) -> u32 {
        match self {
            Self::Temporary {
                num_successful_ops, ..
            }
            | Self::Permanent {
                num_successful_ops, ..
            } => *num_successful_ops,
        }
    }

    /// Returns true for faults worth retrying later.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary { .. })
    }
}

// ============================================================================
// SECTION: Call Outcome
// ============================================================================

/// Failure of a single remote call, before resource-level recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The server no longer recognises the resource id.
    #[error("unknown resource")]
    UnknownResource,
    /// Any other fault; surfaced to callers unchanged.
    #[error(transparent)]
    Fault(#[from] RgmaError),
}

impl CallError {
    /// Converts into the public taxonomy, mapping an escaped unknown-resource
    /// signal to a temporary fault.
    #[must_use]
    pub fn into_public(self) -> RgmaError {
        match self {
            Self::UnknownResource => RgmaError::temporary(UNKNOWN_RESOURCE_MESSAGE),
            Self::Fault(err) => err,
        }
    }
}
