// crates/rgma-client/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Scripted transport and response builders for client tests.
// Purpose: Drive resources through canned server replies and record requests.
// Dependencies: rgma-client, url
// ============================================================================

//! ## Overview
//! A [`Script`] holds the replies a fake server will give, in order, and
//! records every request it receives. [`ScriptedConnector`] hands out
//! connections that share one script, so tests can assert on the exact
//! sequence of commands a resource issued.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::VecDeque;
use std::io;
use std::io::Cursor;
use std::io::ErrorKind;
use std::io::Read;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;

use rgma_client::ClientContext;
use rgma_client::Connection;
use rgma_client::Connector;
use rgma_client::HttpMethod;
use rgma_client::HttpReply;
use rgma_client::HttpRequest;
use rgma_client::RgmaError;
use rgma_client::ServerAddress;
use rgma_client::TransportError;
use url::form_urlencoded;

// ============================================================================
// SECTION: Script
// ============================================================================

/// One canned server behaviour.
#[derive(Debug)]
pub enum Scripted {
    /// Reply with a status and body.
    Reply {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// Fail the exchange at the transport level.
    Fail(String),
    /// Reply 200, yield `body`, then reset the connection mid-stream.
    Reset(String),
    /// Signal `entered`, wait for `release`, then reply 200 with `body`.
    Held {
        /// Notified once the request is in flight.
        entered: Sender<()>,
        /// Awaited before replying.
        release: Receiver<()>,
        /// Response body.
        body: String,
    },
}

/// Replies still to be given and requests seen so far.
#[derive(Debug, Default)]
pub struct Script {
    /// Pending replies, front first.
    replies: Mutex<VecDeque<Scripted>>,
    /// Requests received, in order.
    requests: Mutex<Vec<HttpRequest>>,
    /// Connections opened.
    connects: AtomicUsize,
}

impl Script {
    /// Builds a script that answers 200 with each body in turn.
    pub fn bodies<I, S>(bodies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::steps(bodies.into_iter().map(|body| ok(body)))
    }

    /// Builds a script from explicit steps.
    pub fn steps<I>(steps: I) -> Arc<Self>
    where
        I: IntoIterator<Item = Scripted>,
    {
        Arc::new(Self {
            replies: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
        })
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns the command names received so far.
    pub fn commands(&self) -> Vec<String> {
        self.requests().iter().map(command_of).collect()
    }

    /// Returns how many replies were never consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    /// Returns how many connections were opened.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Records `request` and pops the next step.
    fn answer(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.replies.lock().unwrap().pop_front();
        match step {
            Some(Scripted::Reply {
                status,
                body,
            }) => Ok(HttpReply {
                status,
                reason: if status == 200 { "OK".to_string() } else { "Server Error".to_string() },
                body: Box::new(Cursor::new(body.into_bytes())),
            }),
            Some(Scripted::Fail(message)) => Err(TransportError::new(message)),
            Some(Scripted::Reset(body)) => Ok(HttpReply {
                status: 200,
                reason: "OK".to_string(),
                body: Box::new(Cursor::new(body.into_bytes()).chain(ResetReader)),
            }),
            Some(Scripted::Held {
                entered,
                release,
                body,
            }) => {
                entered.send(()).map_err(|err| TransportError::new(err.to_string()))?;
                release.recv().map_err(|err| TransportError::new(err.to_string()))?;
                Ok(HttpReply {
                    status: 200,
                    reason: "OK".to_string(),
                    body: Box::new(Cursor::new(body.into_bytes())),
                })
            }
            None => Err(TransportError::new("script exhausted")),
        }
    }
}

/// Body tail that fails every read with a connection reset.
struct ResetReader;

impl Read for ResetReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(ErrorKind::ConnectionReset, "connection reset by peer"))
    }
}

/// A 200 reply carrying `body`.
pub fn ok(body: impl Into<String>) -> Scripted {
    Scripted::Reply {
        status: 200,
        body: body.into(),
    }
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Connector whose connections answer from a shared script.
#[derive(Debug)]
pub struct ScriptedConnector {
    /// Shared script.
    script: Arc<Script>,
}

impl Connector for ScriptedConnector {
    fn connect(&self) -> Result<Box<dyn Connection>, RgmaError> {
        self.script.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedConnection {
            script: Arc::clone(&self.script),
        }))
    }
}

/// Connection answering from a shared script.
struct ScriptedConnection {
    /// Shared script.
    script: Arc<Script>,
}

impl Connection for ScriptedConnection {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        self.script.answer(request)
    }
}

/// Address every scripted context reports.
pub fn test_address() -> ServerAddress {
    ServerAddress::new("rgma.example.org", 8443, "")
}

/// Builds a context over `script` with room for `max_connections`.
pub fn context(script: &Arc<Script>, max_connections: usize) -> ClientContext {
    ClientContext::with_connector(
        test_address(),
        max_connections,
        Arc::new(ScriptedConnector {
            script: Arc::clone(script),
        }),
    )
}

// ============================================================================
// SECTION: Bodies
// ============================================================================

/// Acknowledgement body.
pub fn ok_body() -> String {
    "<r><v>OK</v></r>".to_string()
}

/// Body returned by a create command.
pub fn id_body(id: i32) -> String {
    format!("<r><v>{id}</v></r>")
}

/// Unknown-resource signal.
pub fn unknown_body() -> String {
    "<u/>".to_string()
}

/// Temporary fault body.
pub fn temporary_body(message: &str) -> String {
    format!(r#"<t m="{message}"/>"#)
}

/// Result set body of single-column rows.
pub fn column_body(values: &[&str], end_of_results: bool) -> String {
    rows_body(&values.iter().map(|value| vec![*value]).collect::<Vec<_>>(), end_of_results)
}

/// Result set body of arbitrary rows; every row must have the same width.
pub fn rows_body(rows: &[Vec<&str>], end_of_results: bool) -> String {
    let columns = rows.first().map_or(1, Vec::len);
    let mut body = format!(r#"<r c="{columns}" r="{}">"#, rows.len());
    for row in rows {
        for cell in row {
            body.push_str(&format!("<v>{cell}</v>"));
        }
    }
    if end_of_results {
        body.push_str("<e/>");
    }
    body.push_str("</r>");
    body
}

/// A result set whose `None` cells are sent as nulls.
pub fn nullable_rows_body(rows: &[Vec<Option<&str>>]) -> String {
    let columns = rows.first().map_or(1, Vec::len);
    let mut body = format!(r#"<r c="{columns}" r="{}">"#, rows.len());
    for row in rows {
        for cell in row {
            match cell {
                Some(value) => body.push_str(&format!("<v>{value}</v>")),
                None => body.push_str("<n/>"),
            }
        }
    }
    body.push_str("</r>");
    body
}

// ============================================================================
// SECTION: Request Inspection
// ============================================================================

/// Returns the command segment of a request path.
pub fn command_of(request: &HttpRequest) -> String {
    let path = request.path_and_query.split('?').next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Returns every value of `key` in the request's query string.
pub fn param_values(request: &HttpRequest, key: &str) -> Vec<String> {
    let query = request.path_and_query.split_once('?').map_or("", |(_, query)| query);
    form_urlencoded::parse(query.as_bytes())
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
        .collect()
}

/// Returns the single value of `key`, if present.
pub fn param(request: &HttpRequest, key: &str) -> Option<String> {
    param_values(request, key).into_iter().next()
}

/// Asserts the request was sent with `method`.
pub fn assert_method(request: &HttpRequest, method: HttpMethod) {
    assert_eq!(request.method, method, "method of {}", request.path_and_query);
}
