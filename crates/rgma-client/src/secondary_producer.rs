// crates/rgma-client/src/secondary_producer.rs
// ============================================================================
// Module: Secondary Producer
// Description: Resource that republishes tuples gathered from other producers.
// Purpose: Declare republished tables and keep the resource alive.
// Dependencies: rgma-core, tracing
// ============================================================================

//! ## Overview
//! A [`SecondaryProducer`] collects tuples for the tables it declares and
//! republishes them. It must show a sign of life periodically or the server
//! discards it. The static operations address a secondary producer by id
//! alone, for managers running in another process.
//! Invariants:
//! - A lost producer found by the heartbeat is recreated without resending
//!   the heartbeat.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rgma_core::CallError;
use rgma_core::ResourceEndpoint;
use rgma_core::ResourceId;
use rgma_core::RgmaError;
use rgma_core::Storage;
use rgma_core::SupportedQueries;
use rgma_core::TimeInterval;
use tracing::debug;

use crate::context::ClientContext;
use crate::primary_producer::storage_params;
use crate::resource::Creation;
use crate::resource::Declaration;
use crate::resource::RESOURCE_ID_PARAM;
use crate::resource::ResourceCore;
use crate::resource::ResourceHandle;
use crate::service::Params;
use crate::service::ServiceCaller;
use crate::service::check_ok;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service hosting secondary producers.
pub const SECONDARY_PRODUCER_SERVICE: &str = "SecondaryProducerServlet";

/// Heartbeat command.
const SHOW_SIGN_OF_LIFE: &str = "showSignOfLife";

// ============================================================================
// SECTION: Declarations
// ============================================================================

/// A table declared on a secondary producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryTable {
    /// Table name.
    pub name: String,
    /// SQL WHERE clause limiting republished rows.
    pub predicate: String,
    /// How long tuples stay available to history queries.
    pub history_retention: TimeInterval,
}

impl Declaration for SecondaryTable {
    fn params(&self) -> Params {
        Params::new()
            .with("tableName", &self.name)
            .with("predicate", &self.predicate)
            .with("hrpSec", self.history_retention.as_seconds())
    }
}

// ============================================================================
// SECTION: Secondary Producer
// ============================================================================

/// Republishes tuples from other producers.
#[derive(Debug)]
pub struct SecondaryProducer {
    /// Shared lifecycle state and declared tables.
    core: ResourceCore<SecondaryTable>,
    /// Tuple storage.
    storage: Storage,
    /// Query types answered.
    supported_queries: SupportedQueries,
}

impl SecondaryProducer {
    /// Creates a secondary producer.
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
            Creation::new("createSecondaryProducer", storage_params(&storage, supported_queries));
        let core = ResourceCore::create(context, SECONDARY_PRODUCER_SERVICE, creation)?;
        Ok(Self {
            core,
            storage,
            supported_queries,
        })
    }

    /// Declares a table to republish.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the declaration.
    pub fn declare_table(
        &mut self,
        name: &str,
        predicate: &str,
        history_retention: TimeInterval,
    ) -> Result<(), RgmaError> {
        self.core.declare(SecondaryTable {
            name: name.to_string(),
            predicate: predicate.to_string(),
            history_retention,
        })
    }

    /// Keeps the producer from being timed out.
    ///
    /// When the server has already discarded the producer it is recreated
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the heartbeat or the recreation fails.
    pub fn show_sign_of_life(&mut self) -> Result<(), RgmaError> {
        match self.core.call(SHOW_SIGN_OF_LIFE, Params::new()) {
            Ok(set) => check_ok(&set),
            Err(CallError::UnknownResource) => self.core.restore(),
            Err(CallError::Fault(err)) => Err(err),
        }
    }

    /// Returns acknowledged table declarations in order.
    #[must_use]
    pub fn declared_tables(&self) -> &[SecondaryTable] {
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

    /// Sends a heartbeat to the producer with `resource_id`.
    ///
    /// Returns `false` when the server no longer knows the producer.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] for any other failure.
    pub fn static_show_sign_of_life(
        context: &ClientContext,
        resource_id: ResourceId,
    ) -> Result<bool, RgmaError> {
        let caller = ServiceCaller::new(context.clone(), SECONDARY_PRODUCER_SERVICE);
        let params = Params::new().with(RESOURCE_ID_PARAM, resource_id);
        match caller.call(SHOW_SIGN_OF_LIFE, &params) {
            Ok(set) => check_ok(&set).map(|()| true),
            Err(CallError::UnknownResource) => {
                debug!(resource_id = resource_id.get(), "secondary producer no longer exists");
                Ok(false)
            }
            Err(CallError::Fault(err)) => Err(err),
        }
    }

    /// Closes the producer with `resource_id`.
    ///
    /// Closing a producer the server no longer knows is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] for any other failure.
    pub fn static_close(context: &ClientContext, resource_id: ResourceId) -> Result<(), RgmaError> {
        let caller = ServiceCaller::new(context.clone(), SECONDARY_PRODUCER_SERVICE);
        let params = Params::new().with(RESOURCE_ID_PARAM, resource_id);
        match caller.call("close", &params) {
            Ok(set) => check_ok(&set),
            Err(CallError::UnknownResource) => Ok(()),
            Err(CallError::Fault(err)) => Err(err),
        }
    }
}

impl ResourceHandle for SecondaryProducer {
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
