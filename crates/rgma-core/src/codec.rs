// crates/rgma-core/src/codec.rs
// ============================================================================
// Module: R-GMA Response Codec
// Description: Single-pass decoder for the server's XML response grammar.
// Purpose: Turn one response body into a tuple set or a classified fault.
// Dependencies: quick-xml, tracing
// ============================================================================

//! ## Overview
//! Every server response is a small XML document built from single-letter
//! tags:
//!
//! | Tag | Meaning | Attributes |
//! |-----|---------|------------|
//! | `r` | result set | `c` columns (1), `r` rows (1), `m` warning ("") |
//! | `v` | non-null cell, text content is the value | |
//! | `n` | null cell | |
//! | `e` | end of results for a consumer query | |
//! | `t` | temporary fault | `m` message, `o` successful operations |
//! | `p` | permanent fault | `m` message, `o` successful operations |
//! | `u` | unknown resource | |
//!
//! The decoder reads events forward only and never buffers the document, so
//! arbitrarily large result sets decode in bounded extra memory beyond the
//! rows themselves.
//! Invariants:
//! - Cells fill the current row; a row is emitted when it reaches `c` cells.
//! - The first fault tag ends decoding and is returned as the outcome.
//! - A document without an `r` element is a permanent fault.
//! - A document that ends with elements still open is a permanent fault.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use tracing::debug;

use crate::error::CallError;
use crate::error::RgmaError;
use crate::tuple::Tuple;
use crate::tuple::TupleSet;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Upper bound on rows preallocated from the advertised row count.
const MAX_PREALLOCATED_ROWS: usize = 1024;

/// Message for documents that never declare a result set.
pub const BAD_RESPONSE_MESSAGE: &str = "Bad response from server";

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Decodes a complete response from a buffered reader.
///
/// # Errors
///
/// Returns [`CallError::UnknownResource`] for an unknown-resource tag, and
/// [`CallError::Fault`] for server faults, malformed XML or a document with no
/// result set.
pub fn decode_response<R: BufRead>(source: R) -> Result<TupleSet, CallError> {
    let mut reader = Reader::from_reader(source);
    let mut decoder = ResponseDecoder::default();
    let mut buf = Vec::new();
    loop {
        let event = reader.read_event_into(&mut buf).map_err(internal_error)?;
        match event {
            Event::Start(element) => {
                decoder.start(&element)?;
                decoder.open_elements += 1;
            }
            Event::Empty(element) => {
                decoder.start(&element)?;
                decoder.end(element.name().as_ref());
            }
            Event::End(element) => {
                decoder.end(element.name().as_ref());
                decoder.open_elements = decoder.open_elements.saturating_sub(1);
            }
            Event::Text(text) => decoder.text(&text.unescape().map_err(internal_error)?),
            Event::CData(data) => {
                let bytes = data.into_inner();
                decoder.text(&String::from_utf8_lossy(&bytes));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    decoder.finish()
}

// ============================================================================
// SECTION: Decoder State
// ============================================================================

/// Accumulates rows while events stream past.
#[derive(Debug, Default)]
struct ResponseDecoder {
    /// Result-set header, present once the `r` tag has been seen.
    result: Option<ResultHeader>,
    /// Completed rows.
    rows: Vec<Tuple>,
    /// Cells of the row being filled.
    row: Vec<Option<String>>,
    /// Text of the open `v` cell, if one is open.
    cell_text: Option<String>,
    /// Whether an `e` tag was seen.
    end_of_results: bool,
    /// Elements opened but not yet closed.
    open_elements: usize,
}

/// Attributes of the `r` element.
#[derive(Debug)]
struct ResultHeader {
    /// Cells per row.
    columns: usize,
    /// Warning text attached to the result.
    warning: String,
}

impl ResponseDecoder {
    /// Handles an opening (or self-closing) tag.
    fn start(&mut self, element: &BytesStart<'_>) -> Result<(), CallError> {
        match element.name().as_ref() {
            b"r" => {
                let columns = parse_count(element, b"c")?.unwrap_or(1);
                if columns == 0 {
                    return Err(RgmaError::permanent(format!(
                        "{BAD_RESPONSE_MESSAGE}: column count must be positive"
                    ))
                    .into());
                }
                let rows = parse_count(element, b"r")?.unwrap_or(1);
                let warning = attribute(element, b"m")?.unwrap_or_default();
                self.rows = Vec::with_capacity(rows.min(MAX_PREALLOCATED_ROWS));
                self.row = Vec::with_capacity(columns);
                self.result = Some(ResultHeader {
                    columns,
                    warning,
                });
            }
            b"v" => {
                self.require_result("v")?;
                self.cell_text = Some(String::new());
            }
            b"n" => {
                self.require_result("n")?;
            }
            b"e" => self.end_of_results = true,
            b"t" => return Err(fault(element, FaultKind::Temporary)?.into()),
            b"p" => return Err(fault(element, FaultKind::Permanent)?.into()),
            b"u" => return Err(CallError::UnknownResource),
            other => {
                return Err(RgmaError::permanent(format!(
                    "Unexpected tag {} in XML from server.",
                    String::from_utf8_lossy(other)
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Handles a closing tag; only cell tags change state.
    fn end(&mut self, name: &[u8]) {
        match name {
            b"v" => {
                let value = self.cell_text.take().unwrap_or_default();
                self.push_cell(Some(value));
            }
            b"n" => self.push_cell(None),
            _ => {}
        }
    }

    /// Appends character data to the open value cell.
    fn text(&mut self, text: &str) {
        if let Some(cell) = self.cell_text.as_mut() {
            cell.push_str(text);
        }
    }

    /// Adds a cell to the current row, emitting the row when full.
    fn push_cell(&mut self, cell: Option<String>) {
        let Some(header) = self.result.as_ref() else {
            return;
        };
        self.row.push(cell);
        if self.row.len() == header.columns {
            let row = std::mem::replace(&mut self.row, Vec::with_capacity(header.columns));
            self.rows.push(Tuple::new(row));
        }
    }

    /// Rejects cells that appear before the result element.
    fn require_result(&self, tag: &str) -> Result<(), CallError> {
        if self.result.is_none() {
            return Err(RgmaError::permanent(format!(
                "Unexpected tag {tag} outside a result set in XML from server."
            ))
            .into());
        }
        Ok(())
    }

    /// Produces the tuple set once input is exhausted.
    fn finish(self) -> Result<TupleSet, CallError> {
        let Some(header) = self.result else {
            return Err(RgmaError::permanent(BAD_RESPONSE_MESSAGE).into());
        };
        if self.open_elements > 0 {
            return Err(RgmaError::permanent(format!(
                "{BAD_RESPONSE_MESSAGE}: document ended with {} unclosed elements",
                self.open_elements
            ))
            .into());
        }
        if !self.row.is_empty() {
            debug!(cells = self.row.len(), columns = header.columns, "discarding partial row");
        }
        debug!(rows = self.rows.len(), end_of_results = self.end_of_results, "decoded response");
        Ok(TupleSet::new(self.rows, self.end_of_results, header.warning))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Fault tags carried in a response.
#[derive(Debug, Clone, Copy)]
enum FaultKind {
    /// `t` tag.
    Temporary,
    /// `p` tag.
    Permanent,
}

/// Builds a fault from a `t` or `p` element.
fn fault(element: &BytesStart<'_>, kind: FaultKind) -> Result<RgmaError, CallError> {
    let message = attribute(element, b"m")?.unwrap_or_default();
    let mut err = match kind {
        FaultKind::Temporary => RgmaError::temporary(message),
        FaultKind::Permanent => RgmaError::permanent(message),
    };
    if let Some(count) = parse_count(element, b"o")? {
        let count = u32::try_from(count).map_err(|_| {
            RgmaError::permanent(format!("{BAD_RESPONSE_MESSAGE}: operation count out of range"))
        })?;
        err = err.with_successful_ops(count);
    }
    Ok(err)
}

/// Reads an unescaped attribute value.
fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, CallError> {
    for attr in element.attributes() {
        let attr = attr.map_err(internal_error)?;
        if attr.key.as_ref() == key {
            let value: Cow<'_, str> = attr.unescape_value().map_err(internal_error)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Reads a non-negative integer attribute.
fn parse_count(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<usize>, CallError> {
    let Some(raw) = attribute(element, key)? else {
        return Ok(None);
    };
    raw.trim().parse::<usize>().map(Some).map_err(|_| {
        RgmaError::permanent(format!(
            "{BAD_RESPONSE_MESSAGE}: attribute {} has invalid value '{raw}'",
            String::from_utf8_lossy(key)
        ))
        .into()
    })
}

/// Wraps parser failures as permanent faults.
fn internal_error(err: impl std::fmt::Display) -> CallError {
    RgmaError::permanent(format!("Internal error: {err}")).into()
}
