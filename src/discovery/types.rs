//! Result types produced by the import-graph scan

use crate::infra::InfraKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single construct invocation found on a source line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveredPrimitive {
    /// SDK construct name (e.g. "cron", "cache")
    pub construct: String,
    /// Path of the file the match was found in
    pub file: String,
    /// 1-based line number of the matching line
    pub line: usize,
    /// Backing service the construct implies, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infra: Option<InfraKind>,
    /// Human-readable reason the service is needed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// One backing service the scanned program needs, aggregated across all files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfraRequirement {
    pub kind: InfraKind,
    /// Construct names that asked for this service
    pub requested_by: BTreeSet<String>,
    /// Deduplicated reason strings from the catalog
    pub reasons: BTreeSet<String>,
}

impl InfraRequirement {
    pub fn new(kind: InfraKind) -> Self {
        Self {
            kind,
            requested_by: BTreeSet::new(),
            reasons: BTreeSet::new(),
        }
    }
}

/// Outcome of scanning an entrypoint and its local import graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Resolved entrypoint the scan started from
    pub entrypoint: String,
    /// Every file visited, each exactly once, in discovery order
    pub analyzed_files: Vec<String>,
    /// Construct matches in the order they were found
    pub primitives: Vec<DiscoveredPrimitive>,
    /// Backing services the program needs
    pub infrastructure: Vec<InfraRequirement>,
    /// Wall-clock scan duration in milliseconds
    pub elapsed_ms: u128,
}

impl DiscoveryResult {
    /// Returns the infra kinds the scan discovered, in catalog order
    pub fn required_kinds(&self) -> Vec<InfraKind> {
        self.infrastructure.iter().map(|req| req.kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_starts_empty() {
        let req = InfraRequirement::new(InfraKind::Postgres);
        assert!(req.requested_by.is_empty());
        assert!(req.reasons.is_empty());
    }

    #[test]
    fn test_requested_by_deduplicates() {
        let mut req = InfraRequirement::new(InfraKind::Redis);
        req.requested_by.insert("cache".to_string());
        req.requested_by.insert("cache".to_string());
        assert_eq!(req.requested_by.len(), 1);
    }

    #[test]
    fn test_result_serializes_to_json() {
        let result = DiscoveryResult {
            entrypoint: "src/index.ts".to_string(),
            analyzed_files: vec!["src/index.ts".to_string()],
            primitives: vec![],
            infrastructure: vec![],
            elapsed_ms: 3,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("src/index.ts"));
    }
}
