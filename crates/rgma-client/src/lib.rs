// crates/rgma-client/src/lib.rs
// ============================================================================
// Module: R-GMA Client Library
// Description: Producers, consumers and helper services over pooled HTTPS.
// Purpose: Give applications typed handles to remote R-GMA resources.
// Dependencies: reqwest, rgma-config, rgma-core, thiserror, tracing, url
// ============================================================================

//! ## Overview
//! A [`ClientContext`] binds the server address and a bounded connection
//! pool. Resource handles ([`PrimaryProducer`], [`SecondaryProducer`],
//! [`OnDemandProducer`], [`Consumer`]) own a server-side id and transparently
//! recreate the resource when the server has lost it. Stateless helpers
//! ([`Schema`], [`Registry`], [`RgmaService`]) issue one call per method.
//! Invariants:
//! - Every public failure is an [`RgmaError`].
//! - Open connections never exceed the context's limit.
//! - A closed or destroyed handle makes no further network calls.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod consumer;
pub mod context;
pub mod on_demand_producer;
pub mod pool;
pub mod primary_producer;
pub mod registry;
pub mod resource;
pub mod rgma_service;
pub mod schema;
pub mod secondary_producer;
pub mod service;
pub mod transport;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use consumer::Consumer;
pub use consumer::ConsumerOptions;
pub use context::ClientContext;
pub use on_demand_producer::OnDemandProducer;
pub use on_demand_producer::OnDemandTable;
pub use pool::ConnectionPool;
pub use pool::PoolStats;
pub use primary_producer::PrimaryProducer;
pub use primary_producer::PrimaryTable;
pub use registry::Registry;
pub use resource::ResourceHandle;
pub use rgma_config::ClientSettings;
pub use rgma_config::Environment;
pub use rgma_config::Scheme;
pub use rgma_config::ServerAddress;
pub use rgma_core::ColumnDefinition;
pub use rgma_core::ConsumerQueryType;
pub use rgma_core::Index;
pub use rgma_core::ProducerTableEntry;
pub use rgma_core::QueryType;
pub use rgma_core::QueryTypeWithInterval;
pub use rgma_core::ResourceEndpoint;
pub use rgma_core::ResourceId;
pub use rgma_core::RgmaError;
pub use rgma_core::RgmaType;
pub use rgma_core::Storage;
pub use rgma_core::SupportedQueries;
pub use rgma_core::TableDefinition;
pub use rgma_core::TimeInterval;
pub use rgma_core::TimeUnit;
pub use rgma_core::Tuple;
pub use rgma_core::TupleSet;
pub use rgma_core::TupleStore;
pub use rgma_service::RgmaService;
pub use schema::Schema;
pub use secondary_producer::SecondaryProducer;
pub use secondary_producer::SecondaryTable;
pub use transport::Connection;
pub use transport::Connector;
pub use transport::HttpMethod;
pub use transport::HttpReply;
pub use transport::HttpRequest;
pub use transport::HttpsConnector;
pub use transport::TransportError;
