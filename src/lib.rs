//! Declarative provider for Aiven
//!
//! Maps resource declarations (billing groups, services, Kafka topics) onto
//! create/read/update/delete calls against the Aiven API.

pub mod api;
pub mod config;
pub mod engine;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod sweep;

/// Version injected at compile time via AIVEN_PROVIDER_VERSION env var (set
/// by CI/CD), or "dev" for local builds.
pub const VERSION: &str = match option_env!("AIVEN_PROVIDER_VERSION") {
    Some(v) => v,
    None => "dev",
};
