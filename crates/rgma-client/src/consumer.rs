// crates/rgma-client/src/consumer.rs
// ============================================================================
// Module: Consumer
// Description: Query resource that retrieves tuples from producers.
// Purpose: Run one SQL query and drain its results with pop.
// Dependencies: rgma-core
// ============================================================================

//! ## Overview
//! A [`Consumer`] runs one query chosen at construction. Results are drained
//! with [`Consumer::pop`]; a set flagged end-of-results is the last one.
//! Invariants:
//! - An interval is supplied exactly when the query type requires one,
//!   checked before any network call.
//! - A pop after end-of-results still succeeds but carries a warning.
//! - A pop answered by a recreated consumer carries a duplicates warning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::convert::Infallible;

use rgma_core::CallError;
use rgma_core::ConsumerQueryType;
use rgma_core::ResourceEndpoint;
use rgma_core::ResourceId;
use rgma_core::RgmaError;
use rgma_core::TimeInterval;
use rgma_core::TupleSet;

use crate::context::ClientContext;
use crate::resource::Creation;
use crate::resource::Recovered;
use crate::resource::ResourceCore;
use crate::resource::ResourceHandle;
use crate::service::Params;
use crate::service::check_ok;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service hosting consumers.
pub const CONSUMER_SERVICE: &str = "ConsumerServlet";

/// Warning appended when a pop was answered by a recreated consumer.
pub const QUERY_RESTARTED_WARNING: &str = "The query was restarted - many duplicates may be returned.";

/// Warning appended to a pop following an end-of-results set.
pub const POP_AFTER_END_WARNING: &str = "You have called pop again after end of results returned.";

// ============================================================================
// SECTION: Options
// ============================================================================

/// Optional consumer construction parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerOptions {
    /// Look-back window; required by interval query types.
    pub query_interval: Option<TimeInterval>,
    /// Abort the query after this long.
    pub timeout: Option<TimeInterval>,
    /// Producers to query directly instead of via the mediator.
    pub producers: Vec<ResourceEndpoint>,
}

impl ConsumerOptions {
    /// Sets the look-back window.
    #[must_use]
    pub const fn with_query_interval(mut self, interval: TimeInterval) -> Self {
        self.query_interval = Some(interval);
        self
    }

    /// Sets the query timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: TimeInterval) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Names producers explicitly.
    #[must_use]
    pub fn with_producers(mut self, producers: Vec<ResourceEndpoint>) -> Self {
        self.producers = producers;
        self
    }
}

// ============================================================================
// SECTION: Consumer
// ============================================================================

/// A running query.
#[derive(Debug)]
pub struct Consumer {
    /// Shared lifecycle state; consumers declare no tables.
    core: ResourceCore<Infallible>,
    /// SQL text of the query.
    query: String,
    /// Query type.
    query_type: ConsumerQueryType,
    /// Whether the last pop reported end of results.
    end_of_results: bool,
}

impl Consumer {
    /// Starts a query.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] for a mismatched query type and
    /// interval, or any fault from the create call.
    pub fn new(
        context: &ClientContext,
        query: &str,
        query_type: impl Into<ConsumerQueryType>,
        options: ConsumerOptions,
    ) -> Result<Self, RgmaError> {
        let query_type = query_type.into();
        query_type.check_interval(options.query_interval.as_ref())?;
        let params = Params::new()
            .with("select", query)
            .with("queryType", query_type.as_str())
            .with_opt("timeIntervalSec", options.query_interval.map(TimeInterval::as_seconds))
            .with_opt("timeoutSec", options.timeout.map(TimeInterval::as_seconds))
            .with_list("producerConnections", options.producers.iter().map(ResourceEndpoint::connection_string));
        let core = ResourceCore::create(context, CONSUMER_SERVICE, Creation::new("createConsumer", params))?;
        Ok(Self {
            core,
            query: query.to_string(),
            query_type,
            end_of_results: false,
        })
    }

    /// Returns the query text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns the query type.
    #[must_use]
    pub const fn query_type(&self) -> ConsumerQueryType {
        self.query_type
    }

    /// Retrieves up to `max_count` tuples.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] for a zero `max_count` or a dead
    /// handle, and any fault from the server.
    pub fn pop(&mut self, max_count: u32) -> Result<TupleSet, RgmaError> {
        if max_count == 0 {
            return Err(RgmaError::permanent("maxCount must be a positive integer"));
        }
        let params = Params::new().with("maxCount", max_count);
        let outcome = self.core.with_recovery(|core| core.call("pop", params.clone()))?;
        let restored = outcome.was_restored();
        let mut set = outcome.into_inner();
        if restored {
            set.append_warning(QUERY_RESTARTED_WARNING);
        } else if self.end_of_results {
            set.append_warning(POP_AFTER_END_WARNING);
        }
        self.end_of_results = set.is_end_of_results();
        Ok(set)
    }

    /// Aborts the query; buffered tuples can still be popped.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the request.
    pub fn abort(&mut self) -> Result<(), RgmaError> {
        let outcome = self.core.with_recovery(|core| {
            let set = core.call("abort", Params::new())?;
            check_ok(&set).map_err(CallError::from)
        })?;
        self.note_restart(&outcome);
        Ok(())
    }

    /// Returns true when the query was aborted by a call or its timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the request.
    pub fn has_aborted(&mut self) -> Result<bool, RgmaError> {
        let outcome = self.core.with_recovery(|core| {
            let set = core.call("hasAborted", Params::new())?;
            Ok(set.first_row()?.get_bool(0)?)
        })?;
        self.note_restart(&outcome);
        Ok(outcome.into_inner())
    }

    /// Forgets end of results when the query was restarted.
    fn note_restart<T>(&mut self, outcome: &Recovered<T>) {
        if outcome.was_restored() {
            self.end_of_results = false;
        }
    }

    /// Returns true when the last pop reported end of results.
    #[must_use]
    pub const fn is_end_of_results(&self) -> bool {
        self.end_of_results
    }
}

impl ResourceHandle for Consumer {
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

