use crate::config::Config;
use crate::error::Result;
use crate::git::{CommitDate, GitRepo};
use crate::report::Report;
use crate::scan::{self, Scan, TrackedDoc};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// DocStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    Fresh,
    Stale,
    /// Declares `related_code` but has no `last_verified` date.
    Unverified,
    /// None of the `related_code` globs matched a file.
    NoMatches,
}

impl DocStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocStatus::Fresh => "fresh",
            DocStatus::Stale => "stale",
            DocStatus::Unverified => "unverified",
            DocStatus::NoMatches => "no_matches",
        }
    }
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleFile {
    pub path: String,
    pub modified: CommitDate,
    /// Whole days between `last_verified` and the commit date.
    pub days_after: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocResult {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: DocStatus,
    pub last_verified: Option<NaiveDate>,
    pub files_checked: usize,
    pub newest_change: Option<CommitDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stale_files: Vec<StaleFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Overrides `Config::threshold_days` when set.
    pub threshold_days: Option<u32>,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Decide whether one page is stale given the commit dates of its files.
///
/// A file makes the page stale when it changed more than `threshold_days`
/// whole days after `last_verified`. Files without a known commit date are
/// ignored.
pub fn evaluate(
    doc: &TrackedDoc,
    dates: &HashMap<String, Option<CommitDate>>,
    threshold_days: u32,
) -> DocResult {
    let known: Vec<(&String, CommitDate)> = doc
        .files
        .iter()
        .filter_map(|f| dates.get(f).copied().flatten().map(|d| (f, d)))
        .collect();
    let newest_change = known.iter().map(|(_, d)| *d).max();

    let mut result = DocResult {
        path: doc.path.clone(),
        title: doc.title.clone(),
        status: DocStatus::Fresh,
        last_verified: doc.last_verified,
        files_checked: known.len(),
        newest_change,
        stale_files: Vec::new(),
        unmatched: doc.unmatched.clone(),
    };

    if doc.files.is_empty() {
        result.status = DocStatus::NoMatches;
        return result;
    }
    let Some(verified) = doc.last_verified else {
        result.status = DocStatus::Unverified;
        return result;
    };

    let threshold = i64::from(threshold_days);
    let mut stale: Vec<StaleFile> = known
        .into_iter()
        .filter_map(|(path, modified)| {
            let days_after = (modified.date_naive() - verified).num_days();
            (days_after > threshold).then(|| StaleFile {
                path: path.clone(),
                modified,
                days_after,
            })
        })
        .collect();
    stale.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));

    if !stale.is_empty() {
        result.status = DocStatus::Stale;
        result.stale_files = stale;
    }
    result
}

/// Every distinct file referenced by any tracked page, sorted.
pub fn referenced_files(docs: &[TrackedDoc]) -> Vec<String> {
    docs.iter()
        .flat_map(|d| d.files.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Evaluate a finished scan against known commit dates.
pub fn build_report(
    root: &Path,
    scan: Scan,
    dates: &HashMap<String, Option<CommitDate>>,
    threshold_days: u32,
) -> Report {
    let mut docs: Vec<DocResult> = scan
        .tracked
        .iter()
        .map(|d| evaluate(d, dates, threshold_days))
        .collect();
    docs.sort_by(|a, b| a.path.cmp(&b.path));
    Report::new(
        root,
        threshold_days,
        Utc::now(),
        docs,
        scan.untracked,
        scan.skipped,
    )
}

/// Run the full pipeline: scan pages, look up commit dates, evaluate.
pub fn check(root: &Path, config: &Config, options: CheckOptions) -> Result<Report> {
    let repo = GitRepo::open(root)?;
    check_with(root, config, options, |files, concurrency| {
        repo.last_modified_all(files, concurrency)
    })
}

/// The pipeline behind [`check`], with the commit-date lookup supplied by
/// the caller. `lookup` runs once, over every distinct referenced file.
fn check_with<F>(root: &Path, config: &Config, options: CheckOptions, lookup: F) -> Result<Report>
where
    F: FnOnce(&[String], usize) -> Result<HashMap<String, Option<CommitDate>>>,
{
    let threshold = options.threshold_days.unwrap_or(config.threshold_days);
    let scan = scan::scan_docs(root, config)?;

    let files = referenced_files(&scan.tracked);
    tracing::info!(
        "checking {} page(s) against {} file(s), threshold {threshold} day(s)",
        scan.tracked.len(),
        files.len()
    );
    let dates = lookup(&files, config.effective_concurrency())?;

    Ok(build_report(root, scan, &dates, threshold))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::SkippedDoc;
    use chrono::DateTime;

    fn at(s: &str) -> CommitDate {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn doc(files: &[&str], verified: Option<(i32, u32, u32)>) -> TrackedDoc {
        TrackedDoc {
            path: "docs/page.md".to_string(),
            title: Some("Page".to_string()),
            last_verified: verified.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            patterns: vec!["src/**".to_string()],
            files: files.iter().map(|s| s.to_string()).collect(),
            unmatched: vec![],
        }
    }

    fn dates(entries: &[(&str, Option<&str>)]) -> HashMap<String, Option<CommitDate>> {
        entries
            .iter()
            .map(|(f, d)| (f.to_string(), d.map(at)))
            .collect()
    }

    #[test]
    fn exactly_threshold_days_is_fresh() {
        let d = doc(&["src/a.rs"], Some((2024, 1, 1)));
        let r = evaluate(&d, &dates(&[("src/a.rs", Some("2024-01-08T23:59:00Z"))]), 7);
        assert_eq!(r.status, DocStatus::Fresh);
        assert!(r.stale_files.is_empty());
        assert_eq!(r.files_checked, 1);
    }

    #[test]
    fn one_day_past_threshold_is_stale() {
        let d = doc(&["src/a.rs"], Some((2024, 1, 1)));
        let r = evaluate(&d, &dates(&[("src/a.rs", Some("2024-01-09T00:00:00Z"))]), 7);
        assert_eq!(r.status, DocStatus::Stale);
        assert_eq!(r.stale_files.len(), 1);
        assert_eq!(r.stale_files[0].days_after, 8);
    }

    #[test]
    fn zero_threshold_flags_next_day() {
        let d = doc(&["src/a.rs"], Some((2024, 1, 1)));
        let same_day = evaluate(&d, &dates(&[("src/a.rs", Some("2024-01-01T18:00:00Z"))]), 0);
        assert_eq!(same_day.status, DocStatus::Fresh);
        let next_day = evaluate(&d, &dates(&[("src/a.rs", Some("2024-01-02T01:00:00Z"))]), 0);
        assert_eq!(next_day.status, DocStatus::Stale);
    }

    #[test]
    fn changes_before_verification_are_fresh() {
        let d = doc(&["src/a.rs"], Some((2024, 6, 1)));
        let r = evaluate(&d, &dates(&[("src/a.rs", Some("2023-12-31T00:00:00Z"))]), 0);
        assert_eq!(r.status, DocStatus::Fresh);
    }

    #[test]
    fn commit_date_uses_its_own_offset() {
        // 2024-01-09T01:00+05:00 is still Jan 8 in UTC but Jan 9 locally.
        let d = doc(&["src/a.rs"], Some((2024, 1, 1)));
        let r = evaluate(&d, &dates(&[("src/a.rs", Some("2024-01-09T01:00:00+05:00"))]), 7);
        assert_eq!(r.status, DocStatus::Stale);
    }

    #[test]
    fn stale_files_sorted_newest_first() {
        let d = doc(&["src/a.rs", "src/b.rs", "src/c.rs"], Some((2024, 1, 1)));
        let r = evaluate(
            &d,
            &dates(&[
                ("src/a.rs", Some("2024-02-01T00:00:00Z")),
                ("src/b.rs", Some("2024-03-01T00:00:00Z")),
                ("src/c.rs", Some("2024-01-02T00:00:00Z")),
            ]),
            7,
        );
        let paths: Vec<&str> = r.stale_files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/b.rs", "src/a.rs"]);
        assert_eq!(r.newest_change, Some(at("2024-03-01T00:00:00Z")));
    }

    #[test]
    fn unknown_dates_are_ignored() {
        let d = doc(&["src/a.rs", "src/new.rs"], Some((2024, 1, 1)));
        let r = evaluate(
            &d,
            &dates(&[("src/a.rs", Some("2024-01-02T00:00:00Z")), ("src/new.rs", None)]),
            7,
        );
        assert_eq!(r.status, DocStatus::Fresh);
        assert_eq!(r.files_checked, 1);
    }

    #[test]
    fn missing_last_verified_is_unverified() {
        let d = doc(&["src/a.rs"], None);
        let r = evaluate(&d, &dates(&[("src/a.rs", Some("2030-01-01T00:00:00Z"))]), 7);
        assert_eq!(r.status, DocStatus::Unverified);
        assert!(r.stale_files.is_empty());
        assert!(r.newest_change.is_some());
    }

    #[test]
    fn no_files_is_no_matches() {
        let mut d = doc(&[], Some((2024, 1, 1)));
        d.unmatched = vec!["src/gone/*.rs".to_string()];
        let r = evaluate(&d, &HashMap::new(), 7);
        assert_eq!(r.status, DocStatus::NoMatches);
        assert_eq!(r.unmatched, vec!["src/gone/*.rs"]);
    }

    #[test]
    fn referenced_files_is_union() {
        let a = doc(&["src/a.rs", "src/b.rs"], None);
        let b = doc(&["src/b.rs", "src/c.rs"], None);
        assert_eq!(
            referenced_files(&[a, b]),
            vec!["src/a.rs", "src/b.rs", "src/c.rs"]
        );
    }

    #[test]
    fn shared_files_are_looked_up_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let write = |rel: &str, content: &str| {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        };
        write("src/a.rs", "");
        write("src/b.rs", "");
        write("src/c.rs", "");
        write(
            "docs/one.md",
            "---\nrelated_code: [src/a.rs, src/b.rs]\nlast_verified: 2024-01-01\n---\n",
        );
        write(
            "docs/two.md",
            "---\nrelated_code: [src/b.rs, src/c.rs]\nlast_verified: 2024-01-01\n---\n",
        );

        let config = Config {
            concurrency: 3,
            ..Config::default()
        };
        let mut calls = Vec::new();
        let report = check_with(dir.path(), &config, CheckOptions::default(), |files, limit| {
            calls.push((files.to_vec(), limit));
            Ok(dates(&[
                ("src/a.rs", Some("2024-01-02T00:00:00Z")),
                ("src/b.rs", Some("2024-03-01T00:00:00Z")),
                ("src/c.rs", None),
            ]))
        })
        .unwrap();

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec!["src/a.rs", "src/b.rs", "src/c.rs"]);
        assert_eq!(calls[0].1, 3);
        assert_eq!(report.summary.stale, 2);
        assert!(report.docs.iter().all(|d| d.stale_files[0].path == "src/b.rs"));
    }

    #[test]
    fn build_report_sorts_and_summarizes() {
        let mut z = doc(&["src/a.rs"], Some((2024, 1, 1)));
        z.path = "docs/z.md".to_string();
        let mut a = doc(&["src/a.rs"], None);
        a.path = "docs/a.md".to_string();
        let scan = Scan {
            tracked: vec![z, a],
            untracked: 4,
            skipped: vec![SkippedDoc {
                path: "docs/bad.md".to_string(),
                reason: "invalid frontmatter: x".to_string(),
            }],
        };
        let report = build_report(
            Path::new("/repo"),
            scan,
            &dates(&[("src/a.rs", Some("2024-05-01T00:00:00Z"))]),
            7,
        );
        assert_eq!(report.docs[0].path, "docs/a.md");
        assert_eq!(report.docs[1].path, "docs/z.md");
        assert_eq!(report.summary.tracked, 2);
        assert_eq!(report.summary.stale, 1);
        assert_eq!(report.summary.unverified, 1);
        assert_eq!(report.summary.untracked, 4);
        assert_eq!(report.summary.skipped, 1);
        assert!(report.has_stale());
    }
}
