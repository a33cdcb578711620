// crates/rgma-config/src/settings.rs
// ============================================================================
// Module: Client Settings
// Description: Server address, credentials and connection limits.
// Purpose: Resolve everything a client context needs from RGMA_HOME and TLS variables.
// Dependencies: rgma-core, tracing
// ============================================================================

//! ## Overview
//! [`ClientSettings::from_environment`] reads `$RGMA_HOME/etc/rgma/rgma.conf`
//! for the server's `hostname`, `port` and optional `prefix`, then resolves
//! client credentials. Settings are validated before use; cleartext HTTP is
//! refused unless explicitly allowed.
//! Invariants:
//! - `max_connections` is at least 1.
//! - An `http` address requires `allow_http`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::credentials::Credentials;
use crate::credentials::ca_certificate_files;
use crate::credentials::resolve_security;
use crate::environment::Environment;
use crate::environment::RGMA_HOME;
use crate::error::ConfigError;
use crate::properties::Properties;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Connections allowed when none is specified.
pub const DEFAULT_MAX_CONNECTIONS: usize = 5;
/// Per-request timeout.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(300);
/// Servlet path prefix when rgma.conf has none.
pub const DEFAULT_PREFIX: &str = "R-GMA";

// ============================================================================
// SECTION: Server Address
// ============================================================================

/// URL scheme used to reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// TLS with client certificates.
    Https,
    /// Cleartext; only for in-process test servers.
    Http,
}

impl Scheme {
    /// Returns the scheme name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

/// Where the R-GMA server listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    /// URL scheme.
    scheme: Scheme,
    /// Host name.
    host: String,
    /// TCP port.
    port: u16,
    /// Servlet path prefix, without slashes.
    prefix: String,
}

impl ServerAddress {
    /// Builds an HTTPS address; an empty prefix falls back to [`DEFAULT_PREFIX`].
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        Self {
            scheme: Scheme::Https,
            host: host.into(),
            port,
            prefix: if prefix.is_empty() { DEFAULT_PREFIX.to_string() } else { prefix.to_string() },
        }
    }

    /// Returns the same address with a different scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Returns the scheme.
    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns the host name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the path prefix, `/<prefix>/`.
    #[must_use]
    pub fn path_prefix(&self) -> String {
        format!("/{}/", self.prefix)
    }

    /// Returns `scheme://host:port` with no path.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme.as_str(), self.authority())
    }

    /// Returns the full URL of a named service.
    #[must_use]
    pub fn service_url(&self, service: &str) -> String {
        format!("{}{}{service}", self.origin(), self.path_prefix())
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin(), self.path_prefix())
    }
}

// ============================================================================
// SECTION: Client Settings
// ============================================================================

/// Everything needed to open connections to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Server location.
    pub address: ServerAddress,
    /// Client identity; `None` only for cleartext test servers.
    pub credentials: Option<Credentials>,
    /// Extra trusted CA certificate files.
    pub trust_roots: Vec<PathBuf>,
    /// Maximum simultaneously open connections.
    pub max_connections: usize,
    /// Total per-request timeout.
    pub connection_timeout: Duration,
    /// Permit `http` addresses.
    pub allow_http: bool,
}

impl ClientSettings {
    /// Builds settings for `address` with default limits and no credentials.
    #[must_use]
    pub const fn new(address: ServerAddress, max_connections: usize) -> Self {
        Self {
            address,
            credentials: None,
            trust_roots: Vec::new(),
            max_connections,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            allow_http: false,
        }
    }

    /// Resolves settings from `RGMA_HOME` and the credential variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable, file or entry is missing or
    /// invalid.
    pub fn from_environment(env: &Environment, max_connections: usize) -> Result<Self, ConfigError> {
        let home = env
            .var(RGMA_HOME)
            .ok_or_else(|| ConfigError::Missing("Environment variable RGMA_HOME is not set".to_string()))?;
        let conf_path = config_path(Path::new(&home));
        let properties = Properties::load(&conf_path)?;
        let security = resolve_security(env)?;

        let host = properties
            .get("hostname")
            .ok_or_else(|| ConfigError::Missing("No entry for hostname in rgma.conf".to_string()))?;
        let port_text = properties
            .get("port")
            .ok_or_else(|| ConfigError::Missing("No entry for port in rgma.conf".to_string()))?;
        let port = port_text
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid(format!("Invalid port '{port_text}' in rgma.conf")))?;
        let prefix = properties.get("prefix").unwrap_or_default();

        let mut settings = Self::new(ServerAddress::new(host, port, prefix), max_connections)
            .with_credentials(security.credentials);
        settings.trust_roots = ca_certificate_files(&security.ca_directory)?;
        settings.validate()?;
        debug!(
            server = %settings.address,
            max_connections = settings.max_connections,
            trust_roots = settings.trust_roots.len(),
            "resolved client settings"
        );
        Ok(settings)
    }

    /// Returns the same settings with cleartext HTTP permitted or refused.
    #[must_use]
    pub const fn with_allow_http(mut self, allow_http: bool) -> Self {
        self.allow_http = allow_http;
        self
    }

    /// Returns the same settings with a different request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Returns the same settings with client credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Checks limits and scheme policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a limit is zero or cleartext is
    /// used without being allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("max connections must be at least 1".to_string()));
        }
        if self.connection_timeout.is_zero() {
            return Err(ConfigError::Invalid("connection timeout must be positive".to_string()));
        }
        if self.address.scheme() == Scheme::Http && !self.allow_http {
            return Err(ConfigError::Invalid(format!(
                "cleartext http to {} requires allow_http",
                self.address.authority()
            )));
        }
        Ok(())
    }
}

/// Returns `$RGMA_HOME/etc/rgma/rgma.conf`.
#[must_use]
pub fn config_path(home: &Path) -> PathBuf {
    home.join("etc").join("rgma").join("rgma.conf")
}
