use crate::error::{Result, StaleError};
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = ".kb-stale.yaml";
pub const DEFAULT_DOCS_DIR: &str = "docs";

/// Directories never descended into while looking for pages.
pub const SKIP_DIRS: &[&str] = &[".git", "node_modules"];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn docs_dir(root: &Path, docs_dir: &str) -> PathBuf {
    if docs_dir.is_empty() || docs_dir == "." {
        root.to_path_buf()
    } else {
        root.join(docs_dir)
    }
}

/// Render `path` relative to `root` with `/` separators, the form used in
/// frontmatter globs and in reports. Falls back to the full path when
/// `path` is not under `root`.
pub fn relative_slash(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Pattern validation
// ---------------------------------------------------------------------------

/// Normalize a `related_code` glob into a root-relative pattern.
///
/// A leading `/` means "from the repository root" and is stripped; `./` is
/// dropped. Patterns must not climb out of the repository.
pub fn normalize_pattern(pattern: &str) -> Result<String> {
    let trimmed = pattern.trim();
    let invalid = |reason: &str| StaleError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("empty pattern"));
    }
    if trimmed.contains('\0') {
        return Err(invalid("contains a NUL byte"));
    }

    let unified = trimmed.replace('\\', "/");
    let stripped = unified.trim_start_matches('/');
    let parts: Vec<&str> = stripped
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();

    if parts.iter().any(|p| *p == "..") {
        return Err(invalid("must not contain '..'"));
    }
    if parts.is_empty() {
        return Err(invalid("matches the repository root"));
    }
    Ok(parts.join("/"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
