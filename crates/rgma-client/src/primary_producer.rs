// crates/rgma-client/src/primary_producer.rs
// ============================================================================
// Module: Primary Producer
// Description: Resource that publishes tuples into declared tables.
// Purpose: Declare tables and insert rows with retention periods.
// Dependencies: rgma-core
// ============================================================================

//! ## Overview
//! A [`PrimaryProducer`] publishes rows with SQL `INSERT` statements into
//! tables it has declared. Each declaration carries a history and a latest
//! retention period; an insert may override the latest retention period.
//! Invariants:
//! - A table is recorded locally only after the server acknowledged it.
//! - INSERT text is passed through verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rgma_core::ResourceEndpoint;
use rgma_core::ResourceId;
use rgma_core::RgmaError;
use rgma_core::Storage;
use rgma_core::SupportedQueries;
use rgma_core::TimeInterval;
use rgma_core::types::wire_bool;

use crate::context::ClientContext;
use crate::resource::Creation;
use crate::resource::Declaration;
use crate::resource::ResourceCore;
use crate::resource::ResourceHandle;
use crate::service::Params;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service hosting primary producers.
pub const PRIMARY_PRODUCER_SERVICE: &str = "PrimaryProducerServlet";

/// Insert command; sent as POST.
const INSERT_COMMAND: &str = "POST:insert";

// ============================================================================
// SECTION: Declarations
// ============================================================================

/// A table declared on a primary producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryTable {
    /// Table name.
    pub name: String,
    /// SQL WHERE clause limiting published rows; empty for the whole table.
    pub predicate: String,
    /// How long tuples stay available to history queries.
    pub history_retention: TimeInterval,
    /// Default latest retention period for inserted tuples.
    pub latest_retention: TimeInterval,
}

impl Declaration for PrimaryTable {
    fn params(&self) -> Params {
        Params::new()
            .with("tableName", &self.name)
            .with("predicate", &self.predicate)
            .with("hrpSec", self.history_retention.as_seconds())
            .with("lrpSec", self.latest_retention.as_seconds())
    }
}

/// Create parameters shared by primary and secondary producers.
pub(crate) fn storage_params(storage: &Storage, supported: SupportedQueries) -> Params {
    Params::new()
        .with("type", storage.storage_type())
        .with_opt("logicalName", storage.logical_name())
        .with("isLatest", wire_bool(supported.is_latest()))
        .with("isHistory", wire_bool(supported.is_history()))
}

// ============================================================================
// SECTION: Primary Producer
// ============================================================================

/// Publishes tuples into R-GMA.
#[derive(Debug)]
pub struct PrimaryProducer {
    /// Shared lifecycle state and declared tables.
    core: ResourceCore<PrimaryTable>,
    /// Tuple storage.
    storage: Storage,
    /// Query types answered.
    supported_queries: SupportedQueries,
}

impl PrimaryProducer {
    /// Creates a primary producer.
    ///
    /// # Errors
    ///
    /// Returns any fault from the create call.
    pub fn new(
        context: &ClientContext,
        storage: Storage,
        supported_queries: SupportedQueries,
    ) -> Result<Self, RgmaError> {
        let creation =
            Creation::new("createPrimaryProducer", storage_params(&storage, supported_queries));
        let core = ResourceCore::create(context, PRIMARY_PRODUCER_SERVICE, creation)?;
        Ok(Self {
            core,
            storage,
            supported_queries,
        })
    }

    /// Declares a table to publish into.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the declaration.
    pub fn declare_table(
        &mut self,
        name: &str,
        predicate: &str,
        history_retention: TimeInterval,
        latest_retention: TimeInterval,
    ) -> Result<(), RgmaError> {
        self.core.declare(PrimaryTable {
            name: name.to_string(),
            predicate: predicate.to_string(),
            history_retention,
            latest_retention,
        })
    }

    /// Publishes one INSERT statement.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the insert.
    pub fn insert(
        &mut self,
        statement: &str,
        latest_retention: Option<TimeInterval>,
    ) -> Result<(), RgmaError> {
        self.insert_all(&[statement], latest_retention)
    }

    /// Publishes several INSERT statements in one request.
    ///
    /// A fault reports how many statements the server applied before failing.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the batch.
    pub fn insert_all<S: AsRef<str>>(
        &mut self,
        statements: &[S],
        latest_retention: Option<TimeInterval>,
    ) -> Result<(), RgmaError> {
        let params = Params::new()
            .with_list("insert", statements.iter().map(|statement| statement.as_ref()))
            .with_opt("lrpSec", latest_retention.map(TimeInterval::as_seconds));
        self.core.acknowledged(INSERT_COMMAND, &params)
    }

    /// Returns acknowledged table declarations in order.
    #[must_use]
    pub fn declared_tables(&self) -> &[PrimaryTable] {
        self.core.declared()
    }

    /// Returns the endpoint consumers use to query this producer directly.
    ///
    /// # Errors
    ///
    /// Returns the context's initialisation error.
    pub fn endpoint(&self) -> Result<ResourceEndpoint, RgmaError> {
        self.core.endpoint()
    }

    /// Returns the storage.
    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Returns the supported query types.
    #[must_use]
    pub const fn supported_queries(&self) -> SupportedQueries {
        self.supported_queries
    }
}

impl ResourceHandle for PrimaryProducer {
    fn resource_id(&self) -> ResourceId {
        self.core.resource_id()
    }

    fn is_dead(&self) -> bool {
        self.core.is_dead()
    }

    fn close(&mut self) -> Result<(), RgmaError> {
        self.core.terminate("close")
    }

    fn destroy(&mut self) -> Result<(), RgmaError> {
        self.core.terminate("destroy")
    }
}
