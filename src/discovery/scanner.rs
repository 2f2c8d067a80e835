//! Import-graph scanner
//!
//! Walks the local import graph from an entry file, applying the construct
//! catalog line by line and aggregating the backing services the program
//! needs. The walk is depth-first, cycle-safe (visited set) and bounded
//! (`MAX_IMPORT_DEPTH`), so hostile or cyclic graphs always terminate.
//! Interior resolution misses and unreadable files truncate only their own
//! branch; they are logged but do not fail the scan.

use super::patterns::{catalog, extract_local_imports, MAX_IMPORT_DEPTH, SOURCE_EXTENSIONS};
use super::types::{DiscoveredPrimitive, DiscoveryResult, InfraRequirement};
use crate::infra::InfraKind;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort the whole scan
#[derive(Debug, Error)]
pub enum ScanError {
    /// The top-level entrypoint could not be resolved to a source file
    #[error("entrypoint not found: {0} (tried verbatim, source extensions, and index files)")]
    EntrypointNotFound(PathBuf),
}

/// Scanner over an entry file and its relative-import closure
pub struct SourceScanner {
    max_depth: usize,
}

impl Default for SourceScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceScanner {
    pub fn new() -> Self {
        Self {
            max_depth: MAX_IMPORT_DEPTH,
        }
    }

    /// Overrides the depth bound (used by config and tests)
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Scans the import graph rooted at `entrypoint`
    pub fn scan(&self, entrypoint: &Path) -> Result<DiscoveryResult, ScanError> {
        let start = Instant::now();
        let resolved = resolve_module(entrypoint)
            .ok_or_else(|| ScanError::EntrypointNotFound(entrypoint.to_path_buf()))?;
        // Reported paths are canonical, matching the visited keys
        let resolved = canonical_key(&resolved);

        debug!(entrypoint = %resolved.display(), "starting import-graph scan");

        let mut state = ScanState::default();
        self.scan_file(&resolved, 0, &mut state);

        let infrastructure: Vec<InfraRequirement> = state.infra.into_values().collect();
        let elapsed = start.elapsed();

        info!(
            files = state.order.len(),
            primitives = state.primitives.len(),
            services = infrastructure.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "import-graph scan completed"
        );

        Ok(DiscoveryResult {
            entrypoint: resolved.to_string_lossy().into_owned(),
            analyzed_files: state.order,
            primitives: state.primitives,
            infrastructure,
            elapsed_ms: elapsed.as_millis(),
        })
    }

    fn scan_file(&self, path: &Path, depth: usize, state: &mut ScanState) {
        if depth > self.max_depth {
            debug!(path = %path.display(), depth, "depth bound reached, truncating branch");
            return;
        }

        let path = canonical_key(path);
        if state.visited.contains(&path) {
            debug!(path = %path.display(), "already visited, skipping");
            return;
        }

        // A file counts as analyzed only once its contents are in hand
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable file, truncating branch");
                return;
            }
        };
        state.visited.insert(path.clone());
        state.order.push(path.to_string_lossy().into_owned());

        for (index, line) in contents.lines().enumerate() {
            let line_number = index + 1;

            for pattern in catalog() {
                if pattern.matcher.is_match(line) {
                    state.primitives.push(DiscoveredPrimitive {
                        construct: pattern.construct.to_string(),
                        file: path.to_string_lossy().into_owned(),
                        line: line_number,
                        infra: pattern.infra,
                        reason: pattern.reason.map(str::to_string),
                    });

                    if let Some(kind) = pattern.infra {
                        let req = state
                            .infra
                            .entry(kind)
                            .or_insert_with(|| InfraRequirement::new(kind));
                        req.requested_by.insert(pattern.construct.to_string());
                        if let Some(reason) = pattern.reason {
                            req.reasons.insert(reason.to_string());
                        }
                    }
                }
            }

            for specifier in extract_local_imports(line) {
                let base = path.parent().unwrap_or_else(|| Path::new("."));
                match resolve_module(&base.join(&specifier)) {
                    Some(target) => self.scan_file(&target, depth + 1, state),
                    None => {
                        warn!(
                            from = %path.display(),
                            specifier,
                            "unresolvable import, truncating branch"
                        );
                    }
                }
            }
        }
    }
}

#[derive(Default)]
struct ScanState {
    visited: HashSet<PathBuf>,
    order: Vec<String>,
    primitives: Vec<DiscoveredPrimitive>,
    infra: BTreeMap<InfraKind, InfraRequirement>,
}

/// Resolves a path to a source file: verbatim, then each source extension
/// appended, then as a directory holding an index file. First hit wins.
pub fn resolve_module(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    for ext in SOURCE_EXTENSIONS {
        let with_ext = append_extension(path, ext);
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    if path.is_dir() {
        for ext in SOURCE_EXTENSIONS {
            let index = path.join(format!("index{ext}"));
            if index.is_file() {
                return Some(index);
            }
        }
    }
    None
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut as_os = path.as_os_str().to_os_string();
    as_os.push(ext);
    PathBuf::from(as_os)
}

fn canonical_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_verbatim() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app.ts");
        fs::write(&file, "").unwrap();
        assert_eq!(resolve_module(&file), Some(file));
    }

    #[test]
    fn test_resolve_appends_extension() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app.ts");
        fs::write(&file, "").unwrap();
        assert_eq!(resolve_module(&dir.path().join("app")), Some(file));
    }

    #[test]
    fn test_resolve_directory_index() {
        let dir = TempDir::new().unwrap();
        let routes = dir.path().join("routes");
        fs::create_dir(&routes).unwrap();
        let index = routes.join("index.ts");
        fs::write(&index, "").unwrap();
        assert_eq!(resolve_module(&routes), Some(index));
    }

    #[test]
    fn test_resolve_extension_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.ts"), "").unwrap();
        fs::write(dir.path().join("app.js"), "").unwrap();
        // .ts is earlier in SOURCE_EXTENSIONS than .js
        assert_eq!(
            resolve_module(&dir.path().join("app")),
            Some(dir.path().join("app.ts"))
        );
    }

    #[test]
    fn test_resolve_miss() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_module(&dir.path().join("ghost")), None);
    }

    #[test]
    fn test_missing_entrypoint_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = SourceScanner::new().scan(&dir.path().join("missing.ts"));
        assert!(matches!(result, Err(ScanError::EntrypointNotFound(_))));
    }

    #[test]
    fn test_unresolvable_interior_import_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("index.ts");
        fs::write(&entry, "import './missing';\ncron('daily', run);\n").unwrap();

        let result = SourceScanner::new().scan(&entry).unwrap();
        assert_eq!(result.analyzed_files.len(), 1);
        assert_eq!(result.primitives.len(), 1);
    }
}
