//! Trove Core - Shared configuration and process setup
//!
//! Holds the once-built, read-only configuration every provider adapter is
//! constructed from, and the tracing setup used by the binaries.

pub mod config;
pub mod tracing_setup;

pub use config::{
    ConfigError, NetworkConfig, PagingConfig, ProviderCredentials, ProviderEndpoints, TroveConfig,
};
pub use tracing_setup::{CliLogLevel, init_tracing};
