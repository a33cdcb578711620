// crates/rgma-client/src/resource.rs
// ============================================================================
// Module: Resource Lifecycle
// Description: Shared identity, dead flag and recovery loop for all resources.
// Purpose: Recreate lost server-side resources and retry the failed call once.
// Dependencies: rgma-core, tracing
// ============================================================================

//! ## Overview
//! Every resource owns a server-assigned id obtained by one create command.
//! When a resource-scoped call reports the unknown-resource signal the
//! resource is recreated with its original create parameters, every
//! previously acknowledged table declaration is replayed in order, the new id
//! is adopted, and the failed call is retried exactly once.
//!
//! ```text
//! Attempt --unknown--> Restore --ok--> Retry
//!    |                    |              |
//!   ok/fault           fault          ok/fault (unknown becomes temporary)
//! ```
//!
//! Invariants:
//! - The unknown-resource signal never leaves this module.
//! - After `close` or `destroy` the handle is dead; later calls fail locally.
//! - Declarations are recorded only after the server acknowledged them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::convert::Infallible;

use rgma_core::CallError;
use rgma_core::ResourceEndpoint;
use rgma_core::ResourceId;
use rgma_core::RgmaError;
use rgma_core::TupleSet;
use tracing::info;
use tracing::warn;

use crate::context::ClientContext;
use crate::service::Params;
use crate::service::ServiceCaller;
use crate::service::check_ok;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Parameter naming the addressed resource.
pub(crate) const RESOURCE_ID_PARAM: &str = "connectionId";

/// Command declaring a table on a producer.
const DECLARE_TABLE: &str = "declareTable";

/// Fault for calls on a closed or destroyed handle.
pub const DEAD_RESOURCE_MESSAGE: &str =
    "This resource cannot be reused after you have closed or destroyed it.";

// ============================================================================
// SECTION: Public Capability
// ============================================================================

/// Operations common to every resource handle.
pub trait ResourceHandle {
    /// Returns the current server-side id; it changes after recreation.
    fn resource_id(&self) -> ResourceId;

    /// Returns true once the handle was closed or destroyed.
    fn is_dead(&self) -> bool;

    /// Closes the resource; it finishes serving current clients first.
    ///
    /// Closing a resource the server no longer knows is not an error, and
    /// closing a dead handle does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the request.
    fn close(&mut self) -> Result<(), RgmaError>;

    /// Closes and destroys the resource immediately.
    ///
    /// Destroying a resource the server no longer knows is not an error, and
    /// destroying a dead handle does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the request.
    fn destroy(&mut self) -> Result<(), RgmaError>;
}

// ============================================================================
// SECTION: Declarations
// ============================================================================

/// A table declaration that can be replayed against a recreated resource.
pub(crate) trait Declaration {
    /// Returns the `declareTable` parameters, without the resource id.
    fn params(&self) -> Params;
}

impl Declaration for Infallible {
    fn params(&self) -> Params {
        match *self {}
    }
}

/// How to create the resource again.
#[derive(Debug, Clone)]
pub(crate) struct Creation {
    /// Create command name.
    command: &'static str,
    /// Original create parameters.
    params: Params,
}

impl Creation {
    /// Records a create command and its parameters.
    pub(crate) const fn new(command: &'static str, params: Params) -> Self {
        Self {
            command,
            params,
        }
    }

    /// Issues the create command and returns the new id from cell (0, 0).
    fn run(&self, caller: &ServiceCaller) -> Result<ResourceId, CallError> {
        let set = caller.call(self.command, &self.params)?;
        Ok(ResourceId::new(set.first_row()?.get_int(0)?))
    }
}

// ============================================================================
// SECTION: Recovery Outcome
// ============================================================================

/// Result of an operation run under recovery.
#[derive(Debug)]
pub(crate) enum Recovered<T> {
    /// The first attempt succeeded.
    Direct(T),
    /// The resource was recreated before the retry succeeded.
    Restored(T),
}

impl<T> Recovered<T> {
    /// Returns true when the resource was recreated.
    pub(crate) const fn was_restored(&self) -> bool {
        matches!(self, Self::Restored(_))
    }

    /// Returns the value.
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Direct(value) | Self::Restored(value) => value,
        }
    }
}

/// Position in the recovery loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecoveryStep {
    /// First try.
    Attempt,
    /// Recreate and replay.
    Restore,
    /// Single retry after a restore.
    Retry,
}

// ============================================================================
// SECTION: Resource Core
// ============================================================================

/// Identity, dead flag and replay log shared by every resource kind.
#[derive(Debug)]
pub(crate) struct ResourceCore<D> {
    /// Caller bound to the resource's service.
    caller: ServiceCaller,
    /// How to recreate the resource.
    creation: Creation,
    /// Current server-side id.
    resource_id: ResourceId,
    /// Set once closed or destroyed.
    dead: bool,
    /// Acknowledged declarations, in order.
    declared: Vec<D>,
}

impl<D: Declaration> ResourceCore<D> {
    /// Creates the resource on the server.
    pub(crate) fn create(
        context: &ClientContext,
        service: &'static str,
        creation: Creation,
    ) -> Result<Self, RgmaError> {
        let caller = ServiceCaller::new(context.clone(), service);
        let resource_id = creation.run(&caller).map_err(CallError::into_public)?;
        info!(service, resource_id = resource_id.get(), "created resource");
        Ok(Self {
            caller,
            creation,
            resource_id,
            dead: false,
            declared: Vec::new(),
        })
    }

    /// Returns the current id.
    pub(crate) const fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    /// Returns true once closed or destroyed.
    pub(crate) const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Returns acknowledged declarations in order.
    pub(crate) fn declared(&self) -> &[D] {
        &self.declared
    }

    /// Returns the service URL and current id.
    pub(crate) fn endpoint(&self) -> Result<ResourceEndpoint, RgmaError> {
        Ok(ResourceEndpoint::new(self.caller.service_url()?, self.resource_id))
    }

    /// Calls a command addressed to this resource, without recovery.
    pub(crate) fn call(&self, command: &str, params: Params) -> Result<TupleSet, CallError> {
        if self.dead {
            return Err(RgmaError::permanent(DEAD_RESOURCE_MESSAGE).into());
        }
        let params = params.with(RESOURCE_ID_PARAM, self.resource_id);
        self.caller.call(command, &params)
    }

    /// Runs `operation`, recreating the resource and retrying once when the
    /// server has lost it.
    pub(crate) fn with_recovery<T>(
        &mut self,
        mut operation: impl FnMut(&Self) -> Result<T, CallError>,
    ) -> Result<Recovered<T>, RgmaError> {
        let mut step = RecoveryStep::Attempt;
        loop {
            step = match step {
                RecoveryStep::Attempt => match operation(&*self) {
                    Ok(value) => return Ok(Recovered::Direct(value)),
                    Err(CallError::UnknownResource) => RecoveryStep::Restore,
                    Err(CallError::Fault(err)) => return Err(err),
                },
                RecoveryStep::Restore => {
                    self.restore()?;
                    RecoveryStep::Retry
                }
                RecoveryStep::Retry => {
                    return operation(&*self).map(Recovered::Restored).map_err(CallError::into_public);
                }
            };
        }
    }

    /// Sends a command that must be acknowledged with `OK`, under recovery.
    pub(crate) fn acknowledged(&mut self, command: &str, params: &Params) -> Result<(), RgmaError> {
        self.with_recovery(|core| {
            let set = core.call(command, params.clone())?;
            check_ok(&set).map_err(CallError::from)
        })
        .map(Recovered::into_inner)
    }

    /// Declares a table under recovery and records it once acknowledged.
    pub(crate) fn declare(&mut self, declaration: D) -> Result<(), RgmaError> {
        self.acknowledged(DECLARE_TABLE, &declaration.params())?;
        self.declared.push(declaration);
        Ok(())
    }

    /// Recreates the resource and replays declarations.
    ///
    /// The new id is adopted only once every declaration has been replayed,
    /// so a failed restore leaves the handle on the lost id and the next call
    /// restores again.
    pub(crate) fn restore(&mut self) -> Result<(), RgmaError> {
        if self.dead {
            return Err(RgmaError::permanent(DEAD_RESOURCE_MESSAGE));
        }
        let service = self.caller.service();
        let previous = self.resource_id;
        warn!(service, resource_id = previous.get(), "server lost resource; recreating");
        let restored = self.creation.run(&self.caller).map_err(CallError::into_public)?;
        for declaration in &self.declared {
            let params = declaration.params().with(RESOURCE_ID_PARAM, restored);
            let set = self.caller.call(DECLARE_TABLE, &params).map_err(CallError::into_public)?;
            check_ok(&set)?;
        }
        self.resource_id = restored;
        info!(
            service,
            previous_id = previous.get(),
            resource_id = self.resource_id.get(),
            replayed = self.declared.len(),
            "recreated resource"
        );
        Ok(())
    }

    /// Closes or destroys the resource; the handle is dead afterwards.
    pub(crate) fn terminate(&mut self, command: &'static str) -> Result<(), RgmaError> {
        if self.dead {
            return Ok(());
        }
        let outcome = self.call(command, Params::new());
        self.dead = true;
        info!(
            service = self.caller.service(),
            resource_id = self.resource_id.get(),
            command,
            "terminated resource"
        );
        match outcome {
            Ok(set) => check_ok(&set),
            Err(CallError::UnknownResource) => Ok(()),
            Err(CallError::Fault(err)) => Err(err),
        }
    }
}
