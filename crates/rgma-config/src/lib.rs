// crates/rgma-config/src/lib.rs
// ============================================================================
// Module: R-GMA Client Configuration
// Description: Property files, environment lookup, credentials and settings.
// Purpose: Resolve client settings from the installation and TLS environment.
// Dependencies: rgma-core, thiserror, tracing
// ============================================================================

//! ## Overview
//! A client finds its server through `$RGMA_HOME/etc/rgma/rgma.conf` and
//! authenticates with credentials named by `X509_USER_PROXY` or `TRUSTFILE`.
//! This crate resolves both into [`ClientSettings`]. All failures are
//! [`ConfigError`], which converts to a permanent [`rgma_core::RgmaError`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod credentials;
pub mod environment;
pub mod error;
pub mod properties;
pub mod settings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use credentials::Credentials;
pub use credentials::SecurityConfig;
pub use credentials::ca_certificate_files;
pub use credentials::resolve_security;
pub use environment::Environment;
pub use error::ConfigError;
pub use properties::Properties;
pub use settings::ClientSettings;
pub use settings::DEFAULT_CONNECTION_TIMEOUT;
pub use settings::DEFAULT_MAX_CONNECTIONS;
pub use settings::Scheme;
pub use settings::ServerAddress;
