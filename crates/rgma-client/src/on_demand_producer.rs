// crates/rgma-client/src/on_demand_producer.rs
// ============================================================================
// Module: On-Demand Producer
// Description: Resource that answers queries by calling back a listener.
// Purpose: Register a callback host and the tables it can answer for.
// Dependencies: rgma-core
// ============================================================================

//! ## Overview
//! An [`OnDemandProducer`] stores nothing; the server forwards each query to
//! the listener at the host and port given at construction. Declarations
//! carry no retention periods.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rgma_core::ResourceEndpoint;
use rgma_core::ResourceId;
use rgma_core::RgmaError;

use crate::context::ClientContext;
use crate::resource::Creation;
use crate::resource::Declaration;
use crate::resource::ResourceCore;
use crate::resource::ResourceHandle;
use crate::service::Params;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service hosting on-demand producers.
pub const ON_DEMAND_PRODUCER_SERVICE: &str = "OnDemandProducerServlet";

// ============================================================================
// SECTION: Declarations
// ============================================================================

/// A table declared on an on-demand producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnDemandTable {
    /// Table name.
    pub name: String,
    /// SQL WHERE clause limiting answered rows.
    pub predicate: String,
}

impl Declaration for OnDemandTable {
    fn params(&self) -> Params {
        Params::new().with("tableName", &self.name).with("predicate", &self.predicate)
    }
}

// ============================================================================
// SECTION: On-Demand Producer
// ============================================================================

/// Answers queries through a callback listener.
#[derive(Debug)]
pub struct OnDemandProducer {
    /// Shared lifecycle state and declared tables.
    core: ResourceCore<OnDemandTable>,
    /// Listener host.
    host_name: String,
    /// Listener port.
    port: u16,
}

impl OnDemandProducer {
    /// Creates an on-demand producer served by `host_name:port`.
    ///
    /// # Errors
    ///
    /// Returns any fault from the create call.
    pub fn new(context: &ClientContext, host_name: &str, port: u16) -> Result<Self, RgmaError> {
        let params = Params::new().with("hostName", host_name).with("port", port);
        let core = ResourceCore::create(
            context,
            ON_DEMAND_PRODUCER_SERVICE,
            Creation::new("createOnDemandProducer", params),
        )?;
        Ok(Self {
            core,
            host_name: host_name.to_string(),
            port,
        })
    }

    /// Declares a table the listener answers for.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the declaration.
    pub fn declare_table(&mut self, name: &str, predicate: &str) -> Result<(), RgmaError> {
        self.core.declare(OnDemandTable {
            name: name.to_string(),
            predicate: predicate.to_string(),
        })
    }

    /// Returns acknowledged table declarations in order.
    #[must_use]
    pub fn declared_tables(&self) -> &[OnDemandTable] {
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

    /// Returns the listener host.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Returns the listener port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl ResourceHandle for OnDemandProducer {
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
