// crates/rgma-client/src/transport.rs
// ============================================================================
// Module: R-GMA Transport
// Description: Connection traits and the reqwest-backed HTTPS implementation.
// Purpose: Isolate the wire exchange so the RPC layer can run over any transport.
// Dependencies: reqwest, rgma-config, rgma-core, thiserror
// ============================================================================

//! ## Overview
//! A [`Connector`] opens logical [`Connection`]s to one server; a connection
//! sends one request at a time and hands back the status line and a body
//! stream. [`HttpsConnector`] is the production implementation: TLS with a
//! client certificate, redirects refused, a total per-request timeout, and no
//! idle socket reuse, so each exchange closes its socket when the body is
//! dropped.
//! Invariants:
//! - All parameters travel in the query string; request bodies are empty.
//! - Cleartext `http` is only reachable when the settings allow it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use reqwest::Certificate;
use reqwest::Identity;
use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::CACHE_CONTROL;
use reqwest::header::CONNECTION;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use rgma_config::ClientSettings;
use rgma_config::Credentials;
use rgma_core::RgmaError;
use thiserror::Error;

// ============================================================================
// SECTION: Requests and Replies
// ============================================================================

/// HTTP verb of a service command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Read-style commands.
    Get,
    /// Commands carrying inserts.
    Post,
}

impl HttpMethod {
    /// Returns the verb as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request: verb plus absolute path and encoded query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path beginning with `/`, including `?query`.
    pub path_and_query: String,
}

/// Status line and body stream of one response.
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase, possibly empty.
    pub reason: String,
    /// Response body, read once by the codec.
    pub body: Box<dyn Read + Send>,
}

impl fmt::Debug for HttpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpReply")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// A request could not be exchanged with the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// Human-readable cause.
    message: String,
}

impl TransportError {
    /// Builds a transport error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// A logical connection to the server.
pub trait Connection: Send {
    /// Sends one request and returns the reply.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no reply was received.
    fn send(&mut self, request: &HttpRequest) -> Result<HttpReply, TransportError>;
}

/// Opens connections to one server.
pub trait Connector: Send + Sync {
    /// Opens a new logical connection.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the connection cannot be opened.
    fn connect(&self) -> Result<Box<dyn Connection>, RgmaError>;
}

// ============================================================================
// SECTION: HTTPS Connector
// ============================================================================

/// Connector backed by a shared reqwest blocking client.
#[derive(Debug, Clone)]
pub struct HttpsConnector {
    /// Client configured with identity, roots and timeout.
    client: Client,
    /// `scheme://host:port` prefix of every request.
    origin: String,
}

impl HttpsConnector {
    /// Builds the connector from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns a permanent [`RgmaError`] when the settings are invalid or the
    /// credential files cannot be loaded.
    pub fn new(settings: &ClientSettings) -> Result<Self, RgmaError> {
        settings.validate()?;
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let mut builder = Client::builder()
            .timeout(settings.connection_timeout)
            .redirect(Policy::none())
            .pool_max_idle_per_host(0)
            .default_headers(headers)
            .https_only(!settings.allow_http);
        if let Some(credentials) = &settings.credentials {
            let identity = Identity::from_pem(&identity_pem(credentials)?)
                .map_err(|err| RgmaError::permanent(format!("Invalid client credentials: {err}")))?;
            builder = builder.identity(identity);
        }
        for root in &settings.trust_roots {
            let pem = read_pem(root)?;
            let cert = Certificate::from_pem(&pem).map_err(|err| {
                RgmaError::permanent(format!("Invalid CA certificate {}: {err}", root.display()))
            })?;
            builder = builder.add_root_certificate(cert);
        }
        let client = builder
            .build()
            .map_err(|err| RgmaError::permanent(format!("Secure connection setup failed: {err}")))?;
        Ok(Self {
            client,
            origin: settings.address.origin(),
        })
    }
}

impl Connector for HttpsConnector {
    fn connect(&self) -> Result<Box<dyn Connection>, RgmaError> {
        Ok(Box::new(HttpsConnection {
            client: self.client.clone(),
            origin: self.origin.clone(),
        }))
    }
}

/// One logical connection sharing the connector's client.
struct HttpsConnection {
    /// Shared client.
    client: Client,
    /// `scheme://host:port` prefix.
    origin: String,
}

impl Connection for HttpsConnection {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        let url = format!("{}{}", self.origin, request.path_and_query);
        let response = self
            .client
            .request(method, url)
            .send()
            .map_err(|err| TransportError::new(format!("HTTP connection failed: {err}")))?;
        let status = response.status();
        Ok(HttpReply {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: Box::new(response),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Concatenates certificate and key PEM, reading a shared file once.
fn identity_pem(credentials: &Credentials) -> Result<Vec<u8>, RgmaError> {
    let mut pem = read_pem(&credentials.certificate_file)?;
    if !credentials.is_single_file() {
        pem.push(b'\n');
        pem.extend(read_pem(&credentials.key_file)?);
    }
    Ok(pem)
}

/// Reads a PEM file.
fn read_pem(path: &Path) -> Result<Vec<u8>, RgmaError> {
    fs::read(path)
        .map_err(|err| RgmaError::permanent(format!("Cannot read {}: {err}", path.display())))
}
