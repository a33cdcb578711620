// crates/rgma-config/src/environment.rs
// ============================================================================
// Module: Environment Lookup
// Description: Process environment access with a deterministic override map.
// Purpose: Let settings resolution run against a fixed variable set in tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Settings are resolved from environment variables. [`Environment`] reads
//! the live process environment unless an override map is installed, in which
//! case only the map is consulted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;

// ============================================================================
// SECTION: Variable Names
// ============================================================================

/// Installation root holding `etc/rgma/rgma.conf`.
pub const RGMA_HOME: &str = "RGMA_HOME";
/// Proxy certificate used as both certificate and key.
pub const X509_USER_PROXY: &str = "X509_USER_PROXY";
/// Property file naming certificate, key or proxy files.
pub const TRUSTFILE: &str = "TRUSTFILE";
/// Directory of trusted CA certificates.
pub const X509_CERT_DIR: &str = "X509_CERT_DIR";

// ============================================================================
// SECTION: Environment
// ============================================================================

/// Source of environment variables.
///
/// # Invariants
/// - `overrides` take precedence over process environment reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Optional override map used for deterministic lookups.
    overrides: Option<BTreeMap<String, String>>,
}

impl Environment {
    /// Reads the live process environment.
    #[must_use]
    pub const fn process() -> Self {
        Self {
            overrides: None,
        }
    }

    /// Reads only the supplied variables.
    #[must_use]
    pub fn from_overrides<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            overrides: Some(vars.into_iter().map(|(key, value)| (key.into(), value.into())).collect()),
        }
    }

    /// Returns a variable's value; non-UTF-8 values read as unset.
    #[must_use]
    pub fn var(&self, key: &str) -> Option<String> {
        match &self.overrides {
            Some(overrides) => overrides.get(key).cloned(),
            None => env::var(key).ok(),
        }
    }
}
