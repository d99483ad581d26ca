//! Workspace-relative path normalisation and glob matching

use std::path::Path;

use glob::{MatchOptions, Pattern};

/// Normalise an absolute or relative path to workspace-relative form with
/// forward slashes.
///
/// Paths outside the workspace root pass through unchanged apart from
/// separator normalisation; scope patterns will simply fail to match them.
pub fn relative_to_workspace(path: &str, workspace_root: &Path) -> String {
    let mut candidate = path.replace('\\', "/");
    let root = workspace_root.to_string_lossy().replace('\\', "/");
    let root = root.trim_end_matches('/');

    if !root.is_empty() {
        if candidate == root {
            return String::new();
        }
        if let Some(rest) = candidate.strip_prefix(&format!("{root}/")) {
            candidate = rest.to_string();
        }
    }

    while let Some(rest) = candidate.strip_prefix("./") {
        candidate = rest.to_string();
    }

    candidate.trim_start_matches('/').to_string()
}

/// Whether the normalised `path` matches at least one glob in `patterns`.
///
/// Globs use `*` and `**` with literal path separators, so `src/*` stays
/// inside one directory level while `src/**` recurses.
pub fn matches_any(path: &str, patterns: &[String], workspace_root: &Path) -> bool {
    let rel = relative_to_workspace(path, workspace_root);
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::default()
    };

    patterns.iter().any(|pattern| {
        Pattern::new(pattern)
            .map(|p| p.matches_with(&rel, options))
            .unwrap_or(false)
    })
}
