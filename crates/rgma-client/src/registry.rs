// crates/rgma-client/src/registry.rs
// ============================================================================
// Module: Registry Helper
// Description: Producer discovery for the tables of one VDB.
// Purpose: Map registry rows to typed producer entries.
// Dependencies: rgma-core
// ============================================================================

//! ## Overview
//! The registry reports every producer publishing to a table, along with
//! the query types it answers and its history retention period.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rgma_core::CallError;
use rgma_core::ProducerTableEntry;
use rgma_core::ResourceEndpoint;
use rgma_core::ResourceId;
use rgma_core::RgmaError;
use rgma_core::TimeInterval;
use rgma_core::Tuple;

use crate::context::ClientContext;
use crate::service::Params;
use crate::service::ServiceCaller;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Service hosting registries.
pub const REGISTRY_SERVICE: &str = "RegistryServlet";

/// Registry of one virtual database.
#[derive(Debug, Clone)]
pub struct Registry {
    /// Caller bound to the registry service.
    caller: ServiceCaller,
    /// VDB name.
    vdb_name: String,
}

impl Registry {
    /// Binds to the registry of `vdb_name`.
    #[must_use]
    pub fn new(context: &ClientContext, vdb_name: &str) -> Self {
        Self {
            caller: ServiceCaller::new(context.clone(), REGISTRY_SERVICE),
            vdb_name: vdb_name.to_string(),
        }
    }

    /// Returns the VDB name.
    #[must_use]
    pub fn vdb_name(&self) -> &str {
        &self.vdb_name
    }

    /// Lists every producer registered for `table_name`.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the call fails or a row is malformed.
    pub fn get_all_producers_for_table(
        &self,
        table_name: &str,
    ) -> Result<Vec<ProducerTableEntry>, RgmaError> {
        let params = Params::new()
            .with("vdbName", &self.vdb_name)
            .with("tableName", table_name)
            .with("canForward", "true");
        let set = self
            .caller
            .call("getAllProducersForTable", &params)
            .map_err(CallError::into_public)?;
        set.rows().iter().map(producer_entry).collect()
    }
}

/// Builds an entry from `(url, id, secondary, continuous, static, history,
/// latest, predicate, hrpSec)`.
fn producer_entry(row: &Tuple) -> Result<ProducerTableEntry, RgmaError> {
    Ok(ProducerTableEntry {
        endpoint: ResourceEndpoint::new(row.get_string(0)?, ResourceId::new(row.get_int(1)?)),
        secondary: row.get_bool(2)?,
        continuous: row.get_bool(3)?,
        is_static: row.get_bool(4)?,
        history: row.get_bool(5)?,
        latest: row.get_bool(6)?,
        predicate: row.get_string(7)?.to_string(),
        retention_period: TimeInterval::from_seconds(i64::from(row.get_int(8)?))?,
    })
}
