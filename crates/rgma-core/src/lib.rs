// crates/rgma-core/src/lib.rs
// ============================================================================
// Module: R-GMA Core Library
// Description: Value types, fault taxonomy and response codec for R-GMA clients.
// Purpose: Provide the I/O-free building blocks shared by config and client crates.
// Dependencies: quick-xml, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! R-GMA exposes producers and consumers of relational tuples as resources on
//! a remote server. This crate holds everything about that protocol that does
//! not touch the network: the temporary/permanent fault taxonomy, time
//! intervals checked against the server's 32-bit limits, tuples with typed
//! accessors, schema records, and the streaming decoder for response bodies.
//! Invariants:
//! - Every public failure is an [`RgmaError`].
//! - [`CallError::UnknownResource`] is consumed by the resource layer.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod codec;
pub mod error;
pub mod schema;
pub mod time;
pub mod tuple;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use codec::decode_response;
pub use error::CallError;
pub use error::RgmaError;
pub use error::UNKNOWN_RESOURCE_MESSAGE;
pub use schema::ColumnDefinition;
pub use schema::Index;
pub use schema::ProducerTableEntry;
pub use schema::RgmaType;
pub use schema::TableDefinition;
pub use schema::TupleStore;
pub use time::TimeInterval;
pub use time::TimeUnit;
pub use tuple::Tuple;
pub use tuple::TupleSet;
pub use types::ConsumerQueryType;
pub use types::QueryType;
pub use types::QueryTypeWithInterval;
pub use types::ResourceEndpoint;
pub use types::ResourceId;
pub use types::Storage;
pub use types::SupportedQueries;
