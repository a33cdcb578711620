// crates/rgma-config/src/properties.rs
// ============================================================================
// Module: Property Files
// Description: Parser for `key=value` property files.
// Purpose: Read rgma.conf and TRUSTFILE contents.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Property files hold one `key=value` entry per line. Keys and values are
//! trimmed; blank lines and lines starting with `#` are skipped. The value is
//! everything after the first `=`, so values may themselves contain `=`.
//! Invariants:
//! - A non-blank, non-comment line without `=` rejects the whole file.
//! - Later entries for the same key replace earlier ones.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum property file size in bytes.
pub(crate) const MAX_PROPERTY_FILE_SIZE: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Properties
// ============================================================================

/// Parsed contents of a property file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    /// Entries keyed by trimmed property name.
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Parses property text; `origin` names the source in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a line without `=`.
    pub fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let mut entries = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Invalid(format!(
                    "Property file {origin} has a bad entry: {line}"
                )));
            };
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(Self {
            entries,
        })
    }

    /// Reads and parses a property file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be opened, and
    /// [`ConfigError::Invalid`] when it is oversized, not UTF-8 or malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let metadata = fs::metadata(path)
            .map_err(|_| ConfigError::Io(format!("Property file {origin} does not exist")))?;
        if metadata.len() > MAX_PROPERTY_FILE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "Property file {origin} exceeds {MAX_PROPERTY_FILE_SIZE} bytes"
            )));
        }
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("Property file {origin} is not readable: {err}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid(format!("Property file {origin} must be utf-8")))?;
        Self::parse(&text, &origin)
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the value for `key` when present and non-empty.
    #[must_use]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the file held no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
