// crates/rgma-config/src/error.rs
// ============================================================================
// Module: Configuration Errors
// Description: Failures while reading client configuration.
// Purpose: Report configuration problems with the file or variable at fault.
// Dependencies: rgma-core, thiserror
// ============================================================================

//! ## Overview
//! Configuration failures are always permanent: retrying with the same
//! environment cannot succeed. The message text is carried through unchanged
//! when converted to [`RgmaError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use rgma_core::RgmaError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A configuration file could not be read.
    #[error("{0}")]
    Io(String),
    /// A file or variable holds an unusable value.
    #[error("{0}")]
    Invalid(String),
    /// A required variable or entry is absent.
    #[error("{0}")]
    Missing(String),
}

impl From<ConfigError> for RgmaError {
    fn from(err: ConfigError) -> Self {
        Self::permanent(err.to_string())
    }
}
