// crates/rgma-client/src/service.rs
// ============================================================================
// Module: Service RPC
// Description: Request building and the call path to a named remote service.
// Purpose: Map commands and parameters to HTTP exchanges and decoded results.
// Dependencies: rgma-config, rgma-core, tracing, url
// ============================================================================

//! ## Overview
//! [`ServiceCaller::call`] turns a command and its [`Params`] into
//! `GET|POST {prefix}{service}/{command}?{params}`, sends it on a pooled
//! connection and decodes the body.
//! Invariants:
//! - A transport failure, including a body stream that breaks mid-read, is
//!   retried once on a fresh connection; a second failure is a temporary
//!   fault and the connection is not reused.
//! - Any status other than 200 is a temporary fault naming the URL.
//! - The unknown-resource signal passes through untouched.
//! - The pooled connection is released on every path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::BufReader;
use std::io::ErrorKind;
use std::io::Read;

use rgma_config::ServerAddress;
use rgma_core::CallError;
use rgma_core::RgmaError;
use rgma_core::TupleSet;
use rgma_core::decode_response;
use tracing::debug;
use tracing::warn;
use url::form_urlencoded;

use crate::context::ClientContext;
use crate::pool::PooledConnection;
use crate::transport::HttpMethod;
use crate::transport::HttpRequest;
use crate::transport::TransportError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fault for a malformed command string.
const INTERNAL_API_ERROR: &str = "Internal error in the API";

/// Reply text expected from acknowledging commands.
const OK_STATUS: &str = "OK";

// ============================================================================
// SECTION: Commands
// ============================================================================

/// A command name with its HTTP verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// HTTP verb.
    method: HttpMethod,
    /// Command path segment.
    name: String,
}

impl Command {
    /// Parses `name` (GET) or `POST:name`.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] for more than one `:` or an
    /// unsupported verb.
    pub fn parse(spec: &str) -> Result<Self, RgmaError> {
        let mut parts = spec.split(':');
        let (method, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None) => (HttpMethod::Get, name),
            (Some("GET"), Some(name), None) => (HttpMethod::Get, name),
            (Some("POST"), Some(name), None) => (HttpMethod::Post, name),
            _ => return Err(RgmaError::permanent(INTERNAL_API_ERROR)),
        };
        Ok(Self {
            method,
            name: name.to_string(),
        })
    }

    /// Returns the verb.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// Ordered request parameters; keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    /// Name/value pairs in insertion order.
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Builds an empty parameter list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pairs: Vec::new(),
        }
    }

    /// Appends one parameter.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Appends a parameter when `value` is present.
    #[must_use]
    pub fn with_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    /// Appends one pair per element, all under `key`.
    #[must_use]
    pub fn with_list<I>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.pairs.extend(values.into_iter().map(|value| (key.to_string(), value.to_string())));
        self
    }

    /// Returns the first value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    /// Returns the pairs in order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Encodes as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

// ============================================================================
// SECTION: Service Caller
// ============================================================================

/// Issues commands against one named service.
#[derive(Debug, Clone)]
pub struct ServiceCaller {
    /// Server handle.
    context: ClientContext,
    /// Service name, e.g. `ConsumerServlet`.
    service: &'static str,
}

impl ServiceCaller {
    /// Binds a caller to a service.
    #[must_use]
    pub const fn new(context: ClientContext, service: &'static str) -> Self {
        Self {
            context,
            service,
        }
    }

    /// Returns the service name.
    #[must_use]
    pub const fn service(&self) -> &'static str {
        self.service
    }

    /// Returns the full service URL.
    ///
    /// # Errors
    ///
    /// Returns the context's initialisation error.
    pub fn service_url(&self) -> Result<String, RgmaError> {
        Ok(self.context.address()?.service_url(self.service))
    }

    /// Calls a command and decodes the response.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::UnknownResource`] when the server no longer knows
    /// the addressed resource, and [`CallError::Fault`] for every other
    /// failure.
    pub fn call(&self, command: &str, params: &Params) -> Result<TupleSet, CallError> {
        let ready = self.context.ready()?;
        let command = Command::parse(command)?;
        let path = format!(
            "{}{}/{}?{}",
            ready.address.path_prefix(),
            self.service,
            command.name(),
            params.encode()
        );
        let request = HttpRequest {
            method: command.method(),
            path_and_query: path,
        };
        debug!(service = self.service, command = command.name(), method = %command.method(), "calling service");

        let mut connection = ready.pool.acquire()?;
        match exchange(&mut connection, &request, &ready.address) {
            Ok(outcome) => outcome,
            Err(first) => {
                warn!(
                    service = self.service,
                    command = command.name(),
                    error = %first,
                    "transport failure; retrying on a fresh connection"
                );
                if let Err(err) = connection.invalidate() {
                    connection.discard();
                    return Err(err.into());
                }
                match exchange(&mut connection, &request, &ready.address) {
                    Ok(outcome) => outcome,
                    Err(second) => {
                        connection.discard();
                        Err(RgmaError::temporary(format!("{}: {second}", ready.address.authority())).into())
                    }
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Exchange
// ============================================================================

/// Sends `request` and decodes the reply.
///
/// The outer error is a transport failure, raised both when no reply arrives
/// and when the body stream breaks while it is being decoded. The inner result
/// is the server's answer.
fn exchange(
    connection: &mut PooledConnection<'_>,
    request: &HttpRequest,
    address: &ServerAddress,
) -> Result<Result<TupleSet, CallError>, TransportError> {
    let reply = connection.send(request)?;
    if reply.status != 200 {
        return Ok(Err(RgmaError::temporary(format!(
            "{}{}: HTTP error {} ({})",
            address.origin(),
            request.path_and_query,
            reply.status,
            reply.reason
        ))
        .into()));
    }
    let mut body = ObservedBody::new(reply.body);
    let outcome = decode_response(BufReader::new(&mut body));
    match body.failure {
        Some(cause) => Err(TransportError::new(format!("reading response failed: {cause}"))),
        None => Ok(outcome),
    }
}

/// Response body that remembers the first read failure.
struct ObservedBody {
    /// Underlying stream.
    inner: Box<dyn Read + Send>,
    /// First non-retryable read error.
    failure: Option<String>,
}

impl ObservedBody {
    /// Wraps a body stream.
    fn new(inner: Box<dyn Read + Send>) -> Self {
        Self {
            inner,
            failure: None,
        }
    }
}

impl Read for ObservedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.inner.read(buf);
        if self.failure.is_none() {
            self.failure =
                result.as_ref().err().filter(|err| err.kind() != ErrorKind::Interrupted).map(ToString::to_string);
        }
        result
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Requires the first cell of the first row to read `OK`.
///
/// # Errors
///
/// Returns a permanent [`RgmaError`] otherwise.
pub fn check_ok(set: &TupleSet) -> Result<(), RgmaError> {
    let acknowledged = set
        .rows()
        .first()
        .and_then(|row| row.get_string(0).ok())
        .is_some_and(|value| value == OK_STATUS);
    if acknowledged {
        Ok(())
    } else {
        Err(RgmaError::permanent("Failed to return status of OK"))
    }
}
