// crates/rgma-client/src/context.rs
// ============================================================================
// Module: Client Context
// Description: Shared server address and connection pool.
// Purpose: Give every resource and helper one explicit handle to the server.
// Dependencies: rgma-config, rgma-core, tracing
// ============================================================================

//! ## Overview
//! A [`ClientContext`] is built once and cloned into every resource and
//! helper. Construction through [`ClientContext::setup`] never fails: a
//! configuration error is stored and returned from every later use, so a
//! misconfigured process fails on its first call rather than at start-up.
//! Invariants:
//! - A context is either ready or failed, never partially initialised.
//! - Clones share one pool.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use rgma_config::ClientSettings;
use rgma_config::Environment;
use rgma_config::ServerAddress;
use rgma_core::RgmaError;
use tracing::info;
use tracing::warn;

use crate::pool::ConnectionPool;
use crate::pool::PoolStats;
use crate::transport::Connector;
use crate::transport::HttpsConnector;

// ============================================================================
// SECTION: Context
// ============================================================================

/// Handle to one R-GMA server, shared by resources and helpers.
#[derive(Debug, Clone)]
pub struct ClientContext {
    /// Shared state.
    inner: Arc<ContextState>,
}

/// Outcome of context initialisation.
#[derive(Debug)]
enum ContextState {
    /// Usable context.
    Ready(ReadyContext),
    /// Initialisation failed; returned on every use.
    Failed(RgmaError),
}

/// Address and pool of a usable context.
#[derive(Debug)]
pub(crate) struct ReadyContext {
    /// Server location.
    pub(crate) address: ServerAddress,
    /// Connections to the server.
    pub(crate) pool: ConnectionPool,
}

impl ClientContext {
    /// Builds a context from the process environment.
    ///
    /// Configuration failures are deferred to the first use of the context.
    #[must_use]
    pub fn setup(max_connections: usize) -> Self {
        Self::from_environment(&Environment::process(), max_connections)
    }

    /// Builds a context from an explicit environment.
    ///
    /// Configuration failures are deferred to the first use of the context.
    #[must_use]
    pub fn from_environment(env: &Environment, max_connections: usize) -> Self {
        let outcome = ClientSettings::from_environment(env, max_connections)
            .map_err(RgmaError::from)
            .and_then(Self::from_settings);
        outcome.unwrap_or_else(|err| {
            warn!(error = %err, "client context initialisation failed");
            Self::failed(err)
        })
    }

    /// Builds a context over HTTPS from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] when the settings are invalid or
    /// credentials cannot be loaded.
    pub fn from_settings(settings: ClientSettings) -> Result<Self, RgmaError> {
        let connector = HttpsConnector::new(&settings)?;
        Ok(Self::with_connector(settings.address, settings.max_connections, Arc::new(connector)))
    }

    /// Builds a context over any connector.
    #[must_use]
    pub fn with_connector(
        address: ServerAddress,
        max_connections: usize,
        connector: Arc<dyn Connector>,
    ) -> Self {
        info!(server = %address, max_connections, "client context ready");
        Self {
            inner: Arc::new(ContextState::Ready(ReadyContext {
                address,
                pool: ConnectionPool::new(connector, max_connections),
            })),
        }
    }

    /// Builds a context that reports `err` on every use.
    #[must_use]
    pub fn failed(err: RgmaError) -> Self {
        Self {
            inner: Arc::new(ContextState::Failed(err)),
        }
    }

    /// Returns the server address.
    ///
    /// # Errors
    ///
    /// Returns the stored initialisation error.
    pub fn address(&self) -> Result<&ServerAddress, RgmaError> {
        Ok(&self.ready()?.address)
    }

    /// Returns connection pool occupancy.
    ///
    /// # Errors
    ///
    /// Returns the stored initialisation error.
    pub fn pool_stats(&self) -> Result<PoolStats, RgmaError> {
        Ok(self.ready()?.pool.stats())
    }

    /// Returns the usable state or the stored error.
    pub(crate) fn ready(&self) -> Result<&ReadyContext, RgmaError> {
        match self.inner.as_ref() {
            ContextState::Ready(ready) => Ok(ready),
            ContextState::Failed(err) => Err(err.clone()),
        }
    }
}
