//! Static discovery of backing-service needs from an app's import graph

pub mod patterns;
pub mod scanner;
pub mod types;

pub use patterns::{SourcePattern, MAX_IMPORT_DEPTH, SOURCE_EXTENSIONS};
pub use scanner::{ScanError, SourceScanner};
pub use types::{DiscoveredPrimitive, DiscoveryResult, InfraRequirement};
