// crates/rgma-client/src/rgma_service.rs
// ============================================================================
// Module: Server Information Helper
// Description: Version, termination interval and tuple store administration.
// Purpose: Expose the server-wide stateless calls.
// Dependencies: rgma-core
// ============================================================================

//! ## Overview
//! Calls that concern the server as a whole rather than one resource or VDB.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rgma_core::CallError;
use rgma_core::RgmaError;
use rgma_core::TimeInterval;
use rgma_core::TupleSet;
use rgma_core::TupleStore;

use crate::context::ClientContext;
use crate::service::Params;
use crate::service::ServiceCaller;
use crate::service::check_ok;

// ============================================================================
// SECTION: Service
// ============================================================================

/// Service answering server-wide queries.
pub const RGMA_SERVICE: &str = "RGMAService";

/// Server-wide queries and tuple store administration.
#[derive(Debug, Clone)]
pub struct RgmaService {
    /// Caller bound to the server service.
    caller: ServiceCaller,
}

impl RgmaService {
    /// Binds to the server service.
    #[must_use]
    pub fn new(context: &ClientContext) -> Self {
        Self {
            caller: ServiceCaller::new(context.clone(), RGMA_SERVICE),
        }
    }

    /// Returns the server's version string.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the call fails or the reply is empty.
    pub fn get_version(&self) -> Result<String, RgmaError> {
        let set = self.call("getVersion", &Params::new())?;
        Ok(set.first_row()?.get_string(0)?.to_string())
    }

    /// Returns the interval after which idle resources are reclaimed.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the call fails or the reply is malformed.
    pub fn get_termination_interval(&self) -> Result<TimeInterval, RgmaError> {
        let set = self.call("getTerminationInterval", &Params::new())?;
        TimeInterval::from_seconds(i64::from(set.first_row()?.get_int(0)?))
    }

    /// Lists the tuple stores owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the call fails or a row is malformed.
    pub fn list_tuple_stores(&self) -> Result<Vec<TupleStore>, RgmaError> {
        let set = self.call("listTupleStores", &Params::new())?;
        set.rows()
            .iter()
            .map(|row| {
                Ok(TupleStore {
                    logical_name: row.get_string(0)?.to_string(),
                    history: row.get_bool(1)?,
                    latest: row.get_bool(2)?,
                })
            })
            .collect()
    }

    /// Permanently deletes a named tuple store.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the call fails or is not acknowledged.
    pub fn drop_tuple_store(&self, logical_name: &str) -> Result<(), RgmaError> {
        let set = self.call("dropTupleStore", &Params::new().with("logicalName", logical_name))?;
        check_ok(&set)
    }

    /// Calls a command with no resource context.
    fn call(&self, command: &str, params: &Params) -> Result<TupleSet, RgmaError> {
        self.caller.call(command, params).map_err(CallError::into_public)
    }
}
