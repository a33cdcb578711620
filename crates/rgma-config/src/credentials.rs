// crates/rgma-config/src/credentials.rs
// ============================================================================
// Module: Credential Resolution
// Description: Locates the client certificate, key and trusted CA roots.
// Purpose: Resolve TLS material from X509_USER_PROXY, TRUSTFILE and X509_CERT_DIR.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! The client authenticates with an X.509 certificate and key, found in this
//! order:
//! 1. `X509_USER_PROXY`, when non-empty: one proxy file used as both
//!    certificate and key.
//! 2. `TRUSTFILE`, when non-empty: a property file naming `sslCertFile` and
//!    `sslKey`, or else `gridProxyFile`.
//!
//! Trusted CA roots come from `X509_CERT_DIR`, else the TRUSTFILE's
//! `sslCAFiles` entry, else `/etc/grid-security/certificates`.
//! Invariants:
//! - Every returned credential path existed when it was resolved.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::environment::Environment;
use crate::environment::TRUSTFILE;
use crate::environment::X509_CERT_DIR;
use crate::environment::X509_USER_PROXY;
use crate::error::ConfigError;
use crate::properties::Properties;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// CA directory used when nothing else is configured.
pub const DEFAULT_CA_DIRECTORY: &str = "/etc/grid-security/certificates";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Client certificate and private key files, both PEM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Certificate chain file.
    pub certificate_file: PathBuf,
    /// Private key file; may equal the certificate file for proxies.
    pub key_file: PathBuf,
}

impl Credentials {
    /// Uses one file for both certificate and key.
    #[must_use]
    pub fn proxy(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            certificate_file: path.clone(),
            key_file: path,
        }
    }

    /// Returns true when certificate and key come from the same file.
    #[must_use]
    pub fn is_single_file(&self) -> bool {
        self.certificate_file == self.key_file
    }
}

/// Credentials plus the directory of trusted CA certificates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Client identity.
    pub credentials: Credentials,
    /// Directory searched for CA certificates.
    pub ca_directory: PathBuf,
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves credentials and the CA directory from the environment.
///
/// # Errors
///
/// Returns [`ConfigError`] when no credential source is configured or a named
/// file is missing.
pub fn resolve_security(env: &Environment) -> Result<SecurityConfig, ConfigError> {
    let trustfile = env.var(TRUSTFILE).filter(|value| !value.is_empty());
    let trust_properties =
        trustfile.as_deref().map(|path| (path, Properties::load(Path::new(path))));
    let credentials = resolve_credentials(env, trust_properties.as_ref())?;
    let loaded = trust_properties.as_ref().and_then(|(_, loaded)| loaded.as_ref().ok());
    let ca_directory = resolve_ca_directory(env, loaded);
    debug!(
        certificate = %credentials.certificate_file.display(),
        ca_directory = %ca_directory.display(),
        "resolved client credentials"
    );
    Ok(SecurityConfig {
        credentials,
        ca_directory,
    })
}

/// Picks the certificate and key from the proxy variable or the trust file.
fn resolve_credentials(
    env: &Environment,
    trust: Option<&(&str, Result<Properties, ConfigError>)>,
) -> Result<Credentials, ConfigError> {
    if let Some(proxy) = env.var(X509_USER_PROXY).filter(|value| !value.is_empty()) {
        let path = Path::new(&proxy);
        if !path.exists() {
            return Err(ConfigError::Invalid(format!(
                "X509_USER_PROXY set to file {proxy} which does not exist"
            )));
        }
        if File::open(path).is_err() {
            return Err(ConfigError::Invalid(format!(
                "X509_USER_PROXY set to file {proxy} which is not readable"
            )));
        }
        return Ok(Credentials::proxy(path));
    }

    let Some((trustfile, loaded)) = trust else {
        return Err(ConfigError::Missing("Neither TRUSTFILE nor X509_USER_PROXY is set".to_string()));
    };
    let properties = loaded
        .as_ref()
        .map_err(|err| ConfigError::Io(format!("Couldn't open TRUSTFILE: {trustfile} {err}")))?;

    let cert = properties.get_non_empty("sslCertFile");
    let key = properties.get_non_empty("sslKey");
    if let (Some(cert), Some(key)) = (cert, key) {
        require_file(trustfile, "sslCertFile", cert)?;
        require_file(trustfile, "sslKey", key)?;
        return Ok(Credentials {
            certificate_file: PathBuf::from(cert),
            key_file: PathBuf::from(key),
        });
    }
    if let Some(proxy) = properties.get_non_empty("gridProxyFile") {
        require_file(trustfile, "gridProxyFile", proxy)?;
        return Ok(Credentials::proxy(proxy));
    }
    Err(ConfigError::Invalid(format!(
        "Either sslCertFile and sslKey or gridProxyFile must be set in TRUSTFILE ({trustfile})"
    )))
}

/// Fails when a file named by the trust file is absent.
fn require_file(trustfile: &str, key: &str, path: &str) -> Result<(), ConfigError> {
    if Path::new(path).exists() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{key} in TRUSTFILE ({trustfile}) set to file {path} which does not exist"
        )))
    }
}

/// Chooses the CA directory.
fn resolve_ca_directory(env: &Environment, trust: Option<&Properties>) -> PathBuf {
    if let Some(dir) = env.var(X509_CERT_DIR).filter(|value| !value.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(files) = trust.and_then(|props| props.get_non_empty("sslCAFiles")) {
        return strip_glob(files);
    }
    PathBuf::from(DEFAULT_CA_DIRECTORY)
}

/// Turns a `dir/*.0` pattern into `dir`; other paths pass through.
fn strip_glob(pattern: &str) -> PathBuf {
    let path = Path::new(pattern);
    let is_glob = path.file_name().is_some_and(|name| name.to_string_lossy().contains('*'));
    match path.parent() {
        Some(parent) if is_glob => parent.to_path_buf(),
        _ => path.to_path_buf(),
    }
}

// ============================================================================
// SECTION: CA Files
// ============================================================================

/// Lists CA certificate files in `directory`, sorted by name.
///
/// Files named `<hash>.<digit>` or `*.pem` are included. A missing directory
/// yields no files.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when an existing directory cannot be listed.
pub fn ca_certificate_files(directory: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    if !directory.is_dir() {
        debug!(directory = %directory.display(), "CA directory absent; using built-in roots only");
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(directory).map_err(|err| {
        ConfigError::Io(format!("Cannot list CA directory {}: {err}", directory.display()))
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_certificate_name(path))
        .collect();
    files.sort();
    Ok(files)
}

/// Returns true for hashed CA names and `.pem` files.
fn is_certificate_name(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| {
        ext.eq_ignore_ascii_case("pem") || (!ext.is_empty() && ext.bytes().all(|b| b.is_ascii_digit()))
    })
}
