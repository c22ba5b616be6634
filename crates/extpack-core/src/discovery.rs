use crate::CoreError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolve manifest globs against `root` into a deduplicated file list.
///
/// Relative patterns are joined onto `root`, whose own glob metacharacters
/// are escaped. Matches keep pattern order, and
/// within a pattern the order `glob` yields (sorted by path). A file matched
/// by several patterns appears once, at its first position. Directories are
/// skipped.
pub fn discover_manifests(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, CoreError> {
    let mut found: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        // The root is literal; only the pattern may carry glob syntax.
        let full = if Path::new(pattern).is_absolute() {
            pattern.clone()
        } else {
            let root = glob::Pattern::escape(&root.to_string_lossy());
            Path::new(&root).join(pattern).to_string_lossy().into_owned()
        };

        let entries = glob::glob(&full).map_err(|source| CoreError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;

        let mut matched = 0usize;
        for entry in entries {
            // Unreadable directories during traversal are not fatal.
            let Ok(path) = entry else {
                continue;
            };
            if !path.is_file() {
                continue;
            }
            matched += 1;
            if !found.contains(&path) {
                found.push(path);
            }
        }
        debug!("pattern '{pattern}' matched {matched} file(s)");
    }

    if found.is_empty() {
        return Err(CoreError::NoManifestsFound {
            patterns: patterns.to_vec(),
        });
    }
    info!("discovered {} manifest file(s)", found.len());
    Ok(found)
}
