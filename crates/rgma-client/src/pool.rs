// crates/rgma-client/src/pool.rs
// ============================================================================
// Module: Connection Pool
// Description: Bounded pool of logical connections shared by all resources.
// Purpose: Cap simultaneous connections and recycle idle ones.
// Dependencies: rgma-core, tracing
// ============================================================================

//! ## Overview
//! [`ConnectionPool::acquire`] hands out a [`PooledConnection`] guard. Idle
//! connections are reused most-recent first; a new one is opened only while
//! fewer than `max_connections` are in use. At the ceiling the pool refuses
//! immediately with a temporary fault instead of queueing.
//! Invariants:
//! - `in_use` never exceeds `max_connections`.
//! - Dropping a guard always releases its slot, on every exit path.
//! - Pool bookkeeping sits behind one mutex; a poisoned lock is recovered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use rgma_core::RgmaError;
use tracing::debug;

use crate::transport::Connection;
use crate::transport::Connector;
use crate::transport::HttpReply;
use crate::transport::HttpRequest;
use crate::transport::TransportError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fault raised when every slot is taken.
pub const POOL_EXHAUSTED_MESSAGE: &str = "Too many http connections are open";

// ============================================================================
// SECTION: Pool
// ============================================================================

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections currently checked out.
    pub in_use: usize,
    /// Connections waiting for reuse.
    pub idle: usize,
    /// Ceiling on `in_use`.
    pub max_connections: usize,
}

/// Mutable pool bookkeeping.
#[derive(Default)]
struct PoolState {
    /// Released connections, most recent last.
    idle: Vec<Box<dyn Connection>>,
    /// Checked-out slots.
    in_use: usize,
}

/// Bounded set of connections to one server.
pub struct ConnectionPool {
    /// Opens new connections.
    connector: Arc<dyn Connector>,
    /// Ceiling on checked-out connections.
    max_connections: usize,
    /// Free list and slot count.
    state: Mutex<PoolState>,
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("max_connections", &self.max_connections)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ConnectionPool {
    /// Builds an empty pool.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, max_connections: usize) -> Self {
        Self {
            connector,
            max_connections,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Checks out a connection.
    ///
    /// # Errors
    ///
    /// Returns a temporary [`RgmaError`] when `max_connections` are already in
    /// use, or the connector's error when a new connection cannot be opened.
    pub fn acquire(&self) -> Result<PooledConnection<'_>, RgmaError> {
        let reused = {
            let mut state = self.lock();
            if state.in_use >= self.max_connections {
                debug!(in_use = state.in_use, "connection pool exhausted");
                return Err(RgmaError::temporary(POOL_EXHAUSTED_MESSAGE));
            }
            state.in_use += 1;
            state.idle.pop()
        };
        let connection = match reused {
            Some(connection) => connection,
            None => match self.connector.connect() {
                Ok(connection) => connection,
                Err(err) => {
                    self.release_slot(None);
                    return Err(err);
                }
            },
        };
        Ok(PooledConnection {
            pool: self,
            connection: Some(connection),
        })
    }

    /// Returns current occupancy.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        PoolStats {
            in_use: state.in_use,
            idle: state.idle.len(),
            max_connections: self.max_connections,
        }
    }

    /// Frees one slot, keeping `connection` for reuse when present.
    fn release_slot(&self, connection: Option<Box<dyn Connection>>) {
        let mut state = self.lock();
        state.in_use = state.in_use.saturating_sub(1);
        if let Some(connection) = connection {
            state.idle.push(connection);
        }
    }

    /// Locks the bookkeeping, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// SECTION: Guard
// ============================================================================

/// A checked-out connection; releases its slot when dropped.
pub struct PooledConnection<'a> {
    /// Owning pool.
    pool: &'a ConnectionPool,
    /// Live connection, or `None` once discarded.
    connection: Option<Box<dyn Connection>>,
}

impl fmt::Debug for PooledConnection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("live", &self.connection.is_some())
            .finish_non_exhaustive()
    }
}

impl PooledConnection<'_> {
    /// Sends a request on the held connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the exchange fails or the connection
    /// was discarded.
    pub fn send(&mut self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        match self.connection.as_mut() {
            Some(connection) => connection.send(request),
            None => Err(TransportError::new("connection was discarded")),
        }
    }

    /// Replaces the held connection with a fresh one in the same slot.
    ///
    /// # Errors
    ///
    /// Returns the connector's error; the slot then holds no connection.
    pub fn invalidate(&mut self) -> Result<(), RgmaError> {
        self.connection = None;
        self.connection = Some(self.pool.connector.connect()?);
        Ok(())
    }

    /// Drops the held connection so it is not reused.
    pub fn discard(&mut self) {
        self.connection = None;
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        self.pool.release_slot(self.connection.take());
    }
}
