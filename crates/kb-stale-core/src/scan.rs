use crate::config::Config;
use crate::error::{Result, StaleError};
use crate::frontmatter::{self, DocMeta};
use crate::paths;
use chrono::NaiveDate;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A page that declares `related_code`, with its globs already expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDoc {
    /// Root-relative, `/`-separated path of the page.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub last_verified: Option<NaiveDate>,
    pub patterns: Vec<String>,
    /// Root-relative files matched by `patterns`, sorted and deduplicated.
    pub files: Vec<String>,
    /// Patterns that were invalid or matched nothing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDoc {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocOutcome {
    Tracked(TrackedDoc),
    /// No frontmatter, or frontmatter without `related_code`.
    Untracked,
    Skipped(SkippedDoc),
}

#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub tracked: Vec<TrackedDoc>,
    pub untracked: usize,
    pub skipped: Vec<SkippedDoc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    pub files: Vec<String>,
    pub unmatched: Vec<String>,
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

fn compile(patterns: &[String], field: &str) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| StaleError::InvalidPattern {
                pattern: p.clone(),
                reason: format!("{field}: {e}"),
            })
        })
        .collect()
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| paths::SKIP_DIRS.contains(&name))
            .unwrap_or(false)
}

/// Find every page under the configured docs directory that matches an
/// `include` glob and no `exclude` glob. Paths are returned sorted.
pub fn discover_docs(root: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let dir = paths::docs_dir(root, &config.docs_dir);
    if !dir.is_dir() {
        return Err(StaleError::InvalidConfig(format!(
            "docs_dir '{}' does not exist under {}",
            config.docs_dir,
            root.display()
        )));
    }

    let include = compile(&config.include, "include")?;
    let exclude = compile(&config.exclude, "exclude")?;
    let opts = match_options();

    let mut docs = Vec::new();
    for entry in WalkDir::new(&dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = paths::relative_slash(root, entry.path());
        if !include.iter().any(|p| p.matches_with(&rel, opts)) {
            continue;
        }
        if exclude.iter().any(|p| p.matches_with(&rel, opts)) {
            tracing::debug!("excluded {rel}");
            continue;
        }
        docs.push(entry.into_path());
    }
    docs.sort();
    Ok(docs)
}

// ---------------------------------------------------------------------------
// Glob expansion
// ---------------------------------------------------------------------------

fn collect_dir(root: &Path, dir: &Path, out: &mut BTreeSet<String>) {
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() || entry.path_is_symlink() {
            out.insert(paths::relative_slash(root, entry.path()));
        }
    }
}

/// True when a directory between `root` and `path` is a symlink.
fn behind_symlink(root: &Path, path: &Path) -> bool {
    path.ancestors()
        .skip(1)
        .take_while(|p| *p != root && p.starts_with(root))
        .any(|p| {
            p.symlink_metadata()
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false)
        })
}

/// Expand `related_code` globs relative to `root`.
///
/// Matched directories contribute every file beneath them. Symlinks count as
/// files and are never followed. Invalid patterns and patterns matching
/// nothing are logged and returned in `unmatched`.
pub fn expand_related(root: &Path, patterns: &[String]) -> Expansion {
    let mut files = BTreeSet::new();
    let mut unmatched = Vec::new();

    let Some(root_str) = root.to_str() else {
        tracing::warn!("repository root {} is not valid UTF-8", root.display());
        return Expansion {
            files: Vec::new(),
            unmatched: patterns.to_vec(),
        };
    };
    let escaped_root = Pattern::escape(root_str.trim_end_matches(['/', '\\']));

    for raw in patterns {
        let pattern = match paths::normalize_pattern(raw) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("{e}");
                unmatched.push(raw.clone());
                continue;
            }
        };

        let full = format!("{escaped_root}/{pattern}");
        let entries = match glob::glob_with(&full, match_options()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("invalid pattern '{raw}': {e}");
                unmatched.push(raw.clone());
                continue;
            }
        };

        let before = files.len();
        let mut matched_any = false;
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("cannot read match for '{raw}': {e}");
                    continue;
                }
            };
            if behind_symlink(root, &path) {
                tracing::debug!("not following symlink to {}", path.display());
                continue;
            }
            let Ok(meta) = path.symlink_metadata() else {
                continue;
            };
            if meta.is_dir() {
                matched_any = true;
                collect_dir(root, &path, &mut files);
            } else if meta.is_file() || meta.file_type().is_symlink() {
                matched_any = true;
                files.insert(paths::relative_slash(root, &path));
            }
        }

        if !matched_any {
            tracing::warn!("pattern '{raw}' matched no files");
            unmatched.push(raw.clone());
        } else {
            tracing::debug!("pattern '{raw}' added {} file(s)", files.len() - before);
        }
    }

    Expansion {
        files: files.into_iter().collect(),
        unmatched,
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn tracked_from_meta(root: &Path, rel: String, meta: DocMeta) -> TrackedDoc {
    let expansion = expand_related(root, &meta.related_code);
    TrackedDoc {
        path: rel,
        title: meta.title,
        last_verified: meta.last_verified,
        patterns: meta.related_code,
        files: expansion.files,
        unmatched: expansion.unmatched,
    }
}

/// Read and classify one page. Never fails: unreadable files and bad
/// frontmatter become `DocOutcome::Skipped`.
pub fn load_doc(root: &Path, path: &Path) -> DocOutcome {
    let rel = paths::relative_slash(root, path);
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("skipping {rel}: {e}");
            return DocOutcome::Skipped(SkippedDoc {
                path: rel,
                reason: format!("unreadable: {e}"),
            });
        }
    };

    match frontmatter::parse_doc_meta(&content) {
        Ok(Some(meta)) if meta.is_tracked() => {
            DocOutcome::Tracked(tracked_from_meta(root, rel, meta))
        }
        Ok(_) => DocOutcome::Untracked,
        Err(e) => {
            tracing::warn!("skipping {rel}: {e}");
            DocOutcome::Skipped(SkippedDoc {
                path: rel,
                reason: e.to_string(),
            })
        }
    }
}

/// Discover and load every page.
pub fn scan_docs(root: &Path, config: &Config) -> Result<Scan> {
    let mut scan = Scan::default();
    for path in discover_docs(root, config)? {
        match load_doc(root, &path) {
            DocOutcome::Tracked(doc) => scan.tracked.push(doc),
            DocOutcome::Untracked => scan.untracked += 1,
            DocOutcome::Skipped(s) => scan.skipped.push(s),
        }
    }
    tracing::debug!(
        "scanned {} tracked, {} untracked, {} skipped page(s)",
        scan.tracked.len(),
        scan.untracked,
        scan.skipped.len()
    );
    Ok(scan)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
