//! Construct catalog and import-specifier extraction
//!
//! Matchers are plain regexes applied per line with no retained state, so a
//! match on one line never affects the next.

use crate::infra::InfraKind;
use regex::Regex;
use std::sync::OnceLock;

/// Source extensions tried when resolving an import specifier, in order
pub const SOURCE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs"];

/// Maximum recursion depth for the import-graph scan
pub const MAX_IMPORT_DEPTH: usize = 10;

/// A recognizable SDK construct and the backing service it implies
pub struct SourcePattern {
    /// Construct name reported in discovery results
    pub construct: &'static str,
    /// Line matcher for the construct's invocation
    pub matcher: Regex,
    /// Backing service the construct needs, if any
    pub infra: Option<InfraKind>,
    /// Why the service is needed
    pub reason: Option<&'static str>,
}

/// The static construct catalog, compiled once
pub fn catalog() -> &'static [SourcePattern] {
    static CATALOG: OnceLock<Vec<SourcePattern>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let entry = |construct, pattern: &str, infra, reason| SourcePattern {
            construct,
            matcher: Regex::new(pattern).expect("catalog pattern must compile"),
            infra,
            reason,
        };
        vec![
            entry("api", r"\bapi\s*\(", None, None),
            entry(
                "cron",
                r"\bcron\s*\(",
                Some(InfraKind::Postgres),
                Some("cron schedules persist run state in Postgres"),
            ),
            entry(
                "workflow",
                r"\bworkflow\s*\(",
                Some(InfraKind::Postgres),
                Some("workflow steps checkpoint durable state in Postgres"),
            ),
            entry(
                "auth",
                r"\bauth\s*\(",
                Some(InfraKind::Postgres),
                Some("auth stores users and sessions in Postgres"),
            ),
            entry(
                "cache",
                r"\bcache\s*\(",
                Some(InfraKind::Redis),
                Some("cache primitives are backed by Redis"),
            ),
            entry(
                "queue",
                r"\bqueue\s*\(",
                Some(InfraKind::Redis),
                Some("queues use Redis streams for delivery"),
            ),
            entry(
                "collection",
                r"\bcollection\s*\(",
                Some(InfraKind::Mongo),
                Some("document collections are backed by MongoDB"),
            ),
        ]
    })
}

fn import_matchers() -> &'static [Regex] {
    static MATCHERS: OnceLock<Vec<Regex>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        vec![
            // import ... from '...'  /  export ... from '...'
            Regex::new(r#"^\s*(?:import|export)\b[^'"]*\bfrom\s+['"]([^'"]+)['"]"#).unwrap(),
            // side-effect import: import '...'
            Regex::new(r#"^\s*import\s+['"]([^'"]+)['"]"#).unwrap(),
            // const x = require('...')
            Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap(),
        ]
    })
}

/// Extracts local (relative) import specifiers from one source line.
///
/// Registry/package references are discarded: namespaced (`@scope/pkg`)
/// specifiers, anything routed through `node_modules`, and bare package
/// names. Only specifiers starting with `./` or `../` survive.
pub fn extract_local_imports(line: &str) -> Vec<String> {
    let mut specifiers = Vec::new();
    for matcher in import_matchers() {
        for captures in matcher.captures_iter(line) {
            let spec = &captures[1];
            if is_local_specifier(spec) {
                specifiers.push(spec.to_string());
            }
        }
    }
    specifiers
}

fn is_local_specifier(spec: &str) -> bool {
    if spec.starts_with('@') || spec.contains("node_modules") {
        return false;
    }
    spec.starts_with("./") || spec.starts_with("../")
}
