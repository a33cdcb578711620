// crates/rgma-core/src/types.rs
// ============================================================================
// Module: R-GMA Value Types
// Description: Resource identities, query types and producer storage options.
// Purpose: Replace stringly-typed protocol constants with closed enumerations.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The protocol spells query types, storage kinds and supported queries as
//! short strings. Each is modelled here as an enumeration whose wire spelling
//! comes from an exhaustive match, so an unsupported combination cannot be
//! constructed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::RgmaError;
use crate::time::TimeInterval;

// ============================================================================
// SECTION: Resource Identity
// ============================================================================

/// Server-assigned identifier of a resource instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(i32);

impl ResourceId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i32> for ResourceId {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

/// Service URL plus resource id; names one remote resource instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceEndpoint {
    /// Base URL of the hosting service.
    url: String,
    /// Identifier within that service.
    resource_id: ResourceId,
}

impl ResourceEndpoint {
    /// Builds an endpoint.
    #[must_use]
    pub fn new(url: impl Into<String>, resource_id: ResourceId) -> Self {
        Self {
            url: url.into(),
            resource_id,
        }
    }

    /// Returns the service URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the resource id.
    #[must_use]
    pub const fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    /// Returns the `"<id> <url>"` form used when naming producers explicitly.
    #[must_use]
    pub fn connection_string(&self) -> String {
        format!("{} {}", self.resource_id, self.url)
    }
}

impl fmt::Display for ResourceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceEndpoint[{}:{}]", self.url, self.resource_id)
    }
}

// ============================================================================
// SECTION: Query Types
// ============================================================================

/// Query types that take no interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Tuples published from now on.
    Continuous,
    /// All retained tuples.
    History,
    /// Most recent tuple per primary key.
    Latest,
    /// One-shot query against on-demand producers.
    Static,
}

impl QueryType {
    /// Returns the wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::History => "history",
            Self::Latest => "latest",
            Self::Static => "static",
        }
    }
}

/// Query types that must be paired with a look-back interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTypeWithInterval {
    /// Continuous query starting some time in the past.
    Continuous,
    /// History query limited to a recent window.
    History,
    /// Latest query limited to a recent window.
    Latest,
}

impl QueryTypeWithInterval {
    /// Returns the wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::History => "history",
            Self::Latest => "latest",
        }
    }
}

/// Query type requested by a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerQueryType {
    /// Query without an interval.
    Plain(QueryType),
    /// Query that requires an interval.
    WithInterval(QueryTypeWithInterval),
}

impl ConsumerQueryType {
    /// Returns the wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain(query_type) => query_type.as_str(),
            Self::WithInterval(query_type) => query_type.as_str(),
        }
    }

    /// Checks that an interval is present exactly when the type needs one.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] on a mismatched pairing.
    pub fn check_interval(self, interval: Option<&TimeInterval>) -> Result<(), RgmaError> {
        match (self, interval) {
            (Self::Plain(_), Some(_)) => Err(RgmaError::permanent(
                "Only a QueryTypeWithInterval may have a queryInterval",
            )),
            (Self::WithInterval(_), None) => {
                Err(RgmaError::permanent("A QueryTypeWithInterval must have a queryInterval"))
            }
            _ => Ok(()),
        }
    }
}

impl From<QueryType> for ConsumerQueryType {
    fn from(value: QueryType) -> Self {
        Self::Plain(value)
    }
}

impl From<QueryTypeWithInterval> for ConsumerQueryType {
    fn from(value: QueryTypeWithInterval) -> Self {
        Self::WithInterval(value)
    }
}

// ============================================================================
// SECTION: Producer Options
// ============================================================================

/// Where a primary or secondary producer keeps its tuples.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Storage {
    /// Temporary in-memory storage; cannot be reused.
    Memory,
    /// Database storage, reusable across producers when named.
    Database {
        /// Logical name of a reusable tuple store.
        logical_name: Option<String>,
    },
}

impl Storage {
    /// Temporary memory storage.
    #[must_use]
    pub const fn memory() -> Self {
        Self::Memory
    }

    /// Database storage; anonymous when `logical_name` is `None`.
    #[must_use]
    pub fn database(logical_name: Option<&str>) -> Self {
        Self::Database {
            logical_name: logical_name.filter(|name| !name.is_empty()).map(str::to_string),
        }
    }

    /// Returns the wire spelling of the storage type.
    #[must_use]
    pub const fn storage_type(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Database {
                ..
            } => "database",
        }
    }

    /// Returns the logical name, if any.
    #[must_use]
    pub fn logical_name(&self) -> Option<&str> {
        match self {
            Self::Memory => None,
            Self::Database {
                logical_name,
            } => logical_name.as_deref(),
        }
    }
}

/// Query types a primary or secondary producer answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportedQueries {
    /// Continuous only.
    C,
    /// Continuous and history.
    CH,
    /// Continuous and latest.
    CL,
    /// Continuous, history and latest.
    CHL,
}

impl SupportedQueries {
    /// Returns true when continuous queries are supported.
    #[must_use]
    pub const fn is_continuous(self) -> bool {
        true
    }

    /// Returns true when history queries are supported.
    #[must_use]
    pub const fn is_history(self) -> bool {
        matches!(self, Self::CH | Self::CHL)
    }

    /// Returns true when latest queries are supported.
    #[must_use]
    pub const fn is_latest(self) -> bool {
        matches!(self, Self::CL | Self::CHL)
    }
}

impl fmt::Display for SupportedQueries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::C => "C",
            Self::CH => "CH",
            Self::CL => "CL",
            Self::CHL => "CHL",
        };
        f.write_str(label)
    }
}

/// Renders a flag as the protocol's `true`/`false` text.
#[must_use]
pub const fn wire_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
