// crates/rgma-core/src/schema.rs
// ============================================================================
// Module: R-GMA Schema Records
// Description: Typed records returned by the schema, registry and service calls.
// Purpose: Describe tables, indexes, producers and tuple stores.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Records built from rows returned by the stateless helper services. They
//! carry no behaviour beyond accessors and display formatting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::RgmaError;
use crate::time::TimeInterval;
use crate::types::ResourceEndpoint;

// ============================================================================
// SECTION: Column Types
// ============================================================================

/// SQL column types, keyed by their JDBC type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RgmaType {
    /// Fixed-width character data.
    Char,
    /// 32-bit integer.
    Integer,
    /// Single-precision float.
    Real,
    /// Double-precision float.
    Double,
    /// Variable-width character data.
    Varchar,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    Timestamp,
}

/// Every column type, in code order.
const ALL_TYPES: [RgmaType; 8] = [
    RgmaType::Char,
    RgmaType::Integer,
    RgmaType::Real,
    RgmaType::Double,
    RgmaType::Varchar,
    RgmaType::Date,
    RgmaType::Time,
    RgmaType::Timestamp,
];

impl RgmaType {
    /// Returns the JDBC type code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Char => 1,
            Self::Integer => 4,
            Self::Real => 7,
            Self::Double => 8,
            Self::Varchar => 12,
            Self::Date => 91,
            Self::Time => 92,
            Self::Timestamp => 93,
        }
    }

    /// Returns the SQL type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Char => "CHAR",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Double => "DOUBLE",
            Self::Varchar => "VARCHAR",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
        }
    }

    /// Looks up a type by JDBC code.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        ALL_TYPES.into_iter().find(|candidate| candidate.code() == code)
    }

    /// Looks up a type by SQL name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] for an unknown name.
    pub fn from_name(name: &str) -> Result<Self, RgmaError> {
        ALL_TYPES
            .into_iter()
            .find(|candidate| candidate.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| RgmaError::permanent(format!("Unknown column type '{name}'")))
    }
}

impl fmt::Display for RgmaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// SECTION: Tables
// ============================================================================

/// Definition of one column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Column type.
    pub column_type: RgmaType,
    /// Declared width, or 0 when none.
    pub size: i32,
    /// Whether the column is `NOT NULL`.
    pub not_null: bool,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

impl fmt::Display for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)?;
        if self.size > 0 {
            write!(f, "({})", self.size)?;
        }
        if self.primary_key {
            f.write_str(" PRIMARY KEY")?;
        }
        if self.not_null {
            f.write_str(" NOT NULL")?;
        }
        Ok(())
    }
}

/// Definition of a table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table or view name.
    pub table_name: String,
    /// Underlying table when this is a view.
    pub view_for: Option<String>,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Returns true when this definition describes a view.
    #[must_use]
    pub const fn is_view(&self) -> bool {
        self.view_for.is_some()
    }
}

impl fmt::Display for TableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.view_for {
            Some(base) => write!(f, "{} view for {} (", self.table_name, base)?,
            None => write!(f, "{} (", self.table_name)?,
        }
        for (position, column) in self.columns.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{column}")?;
        }
        f.write_str(")")
    }
}

/// An index on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Indexed columns in order.
    pub columns: Vec<String>,
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.columns.join(" "))
    }
}

// ============================================================================
// SECTION: Registry Records
// ============================================================================

/// A producer registered for a table, as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerTableEntry {
    /// Where the producer lives.
    pub endpoint: ResourceEndpoint,
    /// Producer is a secondary producer.
    pub secondary: bool,
    /// Producer answers continuous queries.
    pub continuous: bool,
    /// Producer answers static queries.
    pub is_static: bool,
    /// Producer answers history queries.
    pub history: bool,
    /// Producer answers latest queries.
    pub latest: bool,
    /// Predicate restricting the published rows.
    pub predicate: String,
    /// History retention period.
    pub retention_period: TimeInterval,
}

impl fmt::Display for ProducerTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, letter: char| if set { letter } else { '-' };
        write!(
            f,
            "ProducerTableEntry[endpoint={}, type={}{}{}{}{}, predicate=\"{}\", retention period={}]",
            self.endpoint,
            flag(self.continuous, 'C'),
            flag(self.history, 'H'),
            flag(self.latest, 'L'),
            flag(self.secondary, 'R'),
            flag(self.is_static, 'S'),
            self.predicate,
            self.retention_period.as_seconds()
        )
    }
}

/// A named tuple store owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleStore {
    /// Logical name.
    pub logical_name: String,
    /// Store answers history queries.
    pub history: bool,
    /// Store answers latest queries.
    pub latest: bool,
}
