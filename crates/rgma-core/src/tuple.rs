// crates/rgma-core/src/tuple.rs
// ============================================================================
// Module: R-GMA Tuples
// Description: Rows of nullable string cells and the sets they arrive in.
// Purpose: Give typed, null-aware access to cells decoded from responses.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every cell travels as text. A [`Tuple`] keeps cells as `Option<String>`
//! and converts on read: nulls become the zero value of the requested type,
//! while a non-null cell that does not parse is a permanent fault.
//! A [`TupleSet`] is the decoded result of one response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::error::RgmaError;

// ============================================================================
// SECTION: Tuple
// ============================================================================

/// One row: a fixed-arity sequence of nullable string cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tuple {
    /// Cells in column order; `None` is SQL NULL.
    cells: Vec<Option<String>>,
}

impl Tuple {
    /// Builds a tuple from its cells.
    #[must_use]
    pub const fn new(cells: Vec<Option<String>>) -> Self {
        Self {
            cells,
        }
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true when the tuple has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the raw cells; nulls are `None`.
    #[must_use]
    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// Returns the column as an integer; null reads as 0.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] for a bad offset or a non-integer value.
    pub fn get_int(&self, column: usize) -> Result<i32, RgmaError> {
        match self.get(column)? {
            None => Ok(0),
            Some(value) => value.trim().parse::<i32>().map_err(|_| {
                RgmaError::permanent(format!("Value '{value}' does not represent an Integer"))
            }),
        }
    }

    /// Returns the column as a float; null reads as 0.0.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] for a bad offset or a non-numeric value.
    pub fn get_float(&self, column: usize) -> Result<f64, RgmaError> {
        match self.get(column)? {
            None => Ok(0.0),
            Some(value) => value.trim().parse::<f64>().map_err(|_| {
                RgmaError::permanent(format!("Value '{value}' does not represent a Float"))
            }),
        }
    }

    /// Returns true when the column equals `true`, ignoring case; null reads
    /// as false.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] for a bad offset.
    pub fn get_bool(&self, column: usize) -> Result<bool, RgmaError> {
        Ok(self.get(column)?.is_some_and(|value| value.eq_ignore_ascii_case("true")))
    }

    /// Returns the column text; null reads as the empty string.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] for a bad offset.
    pub fn get_string(&self, column: usize) -> Result<&str, RgmaError> {
        Ok(self.get(column)?.unwrap_or(""))
    }

    /// Returns true when the column holds SQL NULL.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] for a bad offset.
    pub fn is_null(&self, column: usize) -> Result<bool, RgmaError> {
        Ok(self.get(column)?.is_none())
    }

    /// Looks up a cell, rejecting offsets outside the tuple.
    fn get(&self, column: usize) -> Result<Option<&str>, RgmaError> {
        self.cells.get(column).map(Option::as_deref).ok_or_else(|| {
            RgmaError::permanent(format!(
                "column offset must be between 0 and {}",
                self.cells.len().saturating_sub(1)
            ))
        })
    }
}

// ============================================================================
// SECTION: Tuple Set
// ============================================================================

/// Rows, end-of-results flag and warning decoded from one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleSet {
    /// Rows in document order.
    rows: Vec<Tuple>,
    /// True when no further pop is needed for the query.
    end_of_results: bool,
    /// Accumulated warnings, space separated; empty when none.
    warning: String,
}

impl TupleSet {
    /// Builds a tuple set.
    #[must_use]
    pub fn new(rows: Vec<Tuple>, end_of_results: bool, warning: impl Into<String>) -> Self {
        Self {
            rows,
            end_of_results,
            warning: warning.into(),
        }
    }

    /// Returns the rows; possibly empty.
    #[must_use]
    pub fn rows(&self) -> &[Tuple] {
        &self.rows
    }

    /// Returns true when this set is the last one for the query.
    #[must_use]
    pub const fn is_end_of_results(&self) -> bool {
        self.end_of_results
    }

    /// Returns the warning text; empty when none.
    #[must_use]
    pub fn warning(&self) -> &str {
        &self.warning
    }

    /// Appends a warning, separated from any existing one by a space.
    pub fn append_warning(&mut self, warning: &str) {
        if self.warning.is_empty() {
            self.warning = warning.to_string();
        } else {
            self.warning.push(' ');
            self.warning.push_str(warning);
        }
    }

    /// Returns the first row.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] when the set has no rows.
    pub fn first_row(&self) -> Result<&Tuple, RgmaError> {
        self.rows.first().ok_or_else(|| RgmaError::permanent("Server returned no rows"))
    }
}
