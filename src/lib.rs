//! devstack - local backing services inferred from source
//!
//! This library scans an application's entry file and its local import graph
//! for SDK construct invocations (cron jobs, workflows, caches, ...), infers
//! which backing services the application needs, and provisions matching
//! containerized instances on the developer's machine, producing connection
//! variables to inject into the application's environment before it starts.
//!
//! # Core Concepts
//!
//! - **Discovery**: bounded, cycle-safe static scan of the relative-import
//!   graph using line-oriented pattern matching (no execution, no AST)
//! - **Container engines**: one capability interface over two divergent
//!   engines (the Apple `container` CLI and the Docker Engine API), selected
//!   once by a runtime probe
//! - **Provisioning**: idempotent, health-checked creation of named
//!   containers, with user-supplied connection overrides and per-kind error
//!   isolation
//!
//! # Example
//!
//! ```no_run
//! use devstack::{DevstackConfig, InfraManager, SourceScanner};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DevstackConfig::from_env()?;
//!
//! let discovery = SourceScanner::with_max_depth(config.max_import_depth)
//!     .scan(Path::new("src/index.ts"))?;
//!
//! let manager = InfraManager::new(&config);
//! let provisioned = manager.provision(&discovery.required_kinds()).await;
//!
//! for (key, value) in &provisioned.env {
//!     println!("{key}={value}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod infra;
pub mod util;

pub use config::{ConfigError, DevstackConfig};
pub use discovery::{DiscoveryResult, ScanError, SourceScanner};
pub use engine::{ContainerEngine, ContainerEngineKind, DefaultProbe, RuntimeProbe};
pub use infra::{Connection, InfraKind, InfraManager, ProvisionResult, ServiceProvisioner};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_devstack() {
        assert_eq!(NAME, "devstack");
    }
}
