use crate::checker::{DocResult, DocStatus};
use crate::config::ReportFormat;
use crate::error::Result;
use crate::scan::SkippedDoc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub tracked: usize,
    pub fresh: usize,
    pub stale: usize,
    pub unverified: usize,
    pub no_matches: usize,
    pub untracked: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub root: String,
    pub threshold_days: u32,
    pub summary: Summary,
    pub docs: Vec<DocResult>,
    #[serde(default)]
    pub skipped: Vec<SkippedDoc>,
}

impl Report {
    pub fn new(
        root: &Path,
        threshold_days: u32,
        generated_at: DateTime<Utc>,
        docs: Vec<DocResult>,
        untracked: usize,
        skipped: Vec<SkippedDoc>,
    ) -> Self {
        let count = |s: DocStatus| docs.iter().filter(|d| d.status == s).count();
        let summary = Summary {
            tracked: docs.len(),
            fresh: count(DocStatus::Fresh),
            stale: count(DocStatus::Stale),
            unverified: count(DocStatus::Unverified),
            no_matches: count(DocStatus::NoMatches),
            untracked,
            skipped: skipped.len(),
        };
        Self {
            generated_at,
            root: root.display().to_string(),
            threshold_days,
            summary,
            docs,
            skipped,
        }
    }

    pub fn has_stale(&self) -> bool {
        self.summary.stale > 0
    }

    pub fn with_status(&self, status: DocStatus) -> impl Iterator<Item = &DocResult> {
        self.docs.iter().filter(move |d| d.status == status)
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => render_json(self),
            ReportFormat::Markdown => Ok(render_markdown(self)),
            ReportFormat::Text => Ok(render_text(self)),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

pub fn render_json(report: &Report) -> Result<String> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

fn md_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

fn doc_label(doc: &DocResult) -> String {
    match &doc.title {
        Some(t) => format!("`{}` ({})", doc.path, md_cell(t)),
        None => format!("`{}`", doc.path),
    }
}

pub fn render_markdown(report: &Report) -> String {
    let s = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "# Documentation Staleness Report\n");
    let _ = writeln!(
        out,
        "Generated {} with a threshold of {} day(s).\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.threshold_days
    );

    out.push_str("| Status | Pages |\n|---|---:|\n");
    for (label, n) in [
        ("Stale", s.stale),
        ("Fresh", s.fresh),
        ("Unverified", s.unverified),
        ("No matching files", s.no_matches),
        ("Untracked", s.untracked),
        ("Skipped", s.skipped),
    ] {
        let _ = writeln!(out, "| {label} | {n} |");
    }
    out.push('\n');

    out.push_str("## Stale documents\n\n");
    if !report.has_stale() {
        out.push_str("No stale documents.\n\n");
    }
    for doc in report.with_status(DocStatus::Stale) {
        let _ = writeln!(out, "### {}\n", doc_label(doc));
        if let Some(v) = doc.last_verified {
            let _ = writeln!(out, "Last verified {v}.\n");
        }
        out.push_str("| File | Changed | Days after |\n|---|---|---:|\n");
        for f in &doc.stale_files {
            let _ = writeln!(
                out,
                "| `{}` | {} | {} |",
                md_cell(&f.path),
                f.modified.format("%Y-%m-%d"),
                f.days_after
            );
        }
        out.push('\n');
    }

    if s.unverified > 0 {
        out.push_str("## Unverified documents\n\n");
        for doc in report.with_status(DocStatus::Unverified) {
            let _ = writeln!(out, "- {}", doc_label(doc));
        }
        out.push('\n');
    }

    if s.no_matches > 0 {
        out.push_str("## Documents with no matching files\n\n");
        for doc in report.with_status(DocStatus::NoMatches) {
            let patterns: Vec<String> = doc
                .unmatched
                .iter()
                .map(|p| format!("`{}`", md_cell(p)))
                .collect();
            let _ = writeln!(out, "- {}: {}", doc_label(doc), patterns.join(", "));
        }
        out.push('\n');
    }

    if !report.skipped.is_empty() {
        out.push_str("## Skipped\n\n");
        for sk in &report.skipped {
            let _ = writeln!(out, "- `{}`: {}", sk.path, md_cell(&sk.reason));
        }
        out.push('\n');
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header.
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<String>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:width$}", c, width = widths.get(i).copied().unwrap_or(0)))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.iter().map(|h| h.to_string()).collect()));
    out.push('\n');
    out.push_str(&line(widths.iter().map(|&w| "-".repeat(w)).collect()));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.clone()));
        out.push('\n');
    }
    out
}

pub fn render_text(report: &Report) -> String {
    let s = &report.summary;
    let mut out = String::new();

    if report.docs.is_empty() {
        out.push_str("No pages declare related_code.\n");
    } else {
        let rows: Vec<Vec<String>> = report
            .docs
            .iter()
            .map(|d| {
                vec![
                    d.status.to_string(),
                    d.path.clone(),
                    d.last_verified
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    d.newest_change
                        .map(|c| c.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    d.files_checked.to_string(),
                ]
            })
            .collect();
        out.push_str(&format_table(
            &["STATUS", "PAGE", "VERIFIED", "NEWEST CHANGE", "FILES"],
            &rows,
        ));
    }

    for doc in report.with_status(DocStatus::Stale) {
        let _ = writeln!(out, "\n{}:", doc.path);
        for f in &doc.stale_files {
            let _ = writeln!(
                out,
                "  {} changed {} ({} day(s) after verification)",
                f.path,
                f.modified.format("%Y-%m-%d"),
                f.days_after
            );
        }
    }

    for sk in &report.skipped {
        let _ = writeln!(out, "\nskipped {}: {}", sk.path, sk.reason);
    }

    let _ = writeln!(
        out,
        "\n{} tracked: {} stale, {} fresh, {} unverified, {} without matches ({} untracked, {} skipped); threshold {} day(s)",
        s.tracked,
        s.stale,
        s.fresh,
        s.unverified,
        s.no_matches,
        s.untracked,
        s.skipped,
        report.threshold_days
    );
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::StaleFile;
    use chrono::{NaiveDate, TimeZone};

    fn sample() -> Report {
        let modified = DateTime::parse_from_rfc3339("2024-03-01T10:00:00+00:00").unwrap();
        let docs = vec![
            DocResult {
                path: "docs/auth.md".to_string(),
                title: Some("Auth | Login".to_string()),
                status: DocStatus::Stale,
                last_verified: NaiveDate::from_ymd_opt(2024, 1, 1),
                files_checked: 2,
                newest_change: Some(modified),
                stale_files: vec![StaleFile {
                    path: "src/auth/login.ts".to_string(),
                    modified,
                    days_after: 60,
                }],
                unmatched: vec![],
            },
            DocResult {
                path: "docs/api.md".to_string(),
                title: None,
                status: DocStatus::Unverified,
                last_verified: None,
                files_checked: 1,
                newest_change: None,
                stale_files: vec![],
                unmatched: vec![],
            },
            DocResult {
                path: "docs/old.md".to_string(),
                title: None,
                status: DocStatus::NoMatches,
                last_verified: NaiveDate::from_ymd_opt(2023, 6, 1),
                files_checked: 0,
                newest_change: None,
                stale_files: vec![],
                unmatched: vec!["src/legacy/*.js".to_string()],
            },
        ];
        Report::new(
            Path::new("/repo"),
            7,
            Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
            docs,
            3,
            vec![SkippedDoc {
                path: "docs/bad.md".to_string(),
                reason: "invalid frontmatter: bad date".to_string(),
            }],
        )
    }

    #[test]
    fn summary_counts() {
        let r = sample();
        assert_eq!(
            r.summary,
            Summary {
                tracked: 3,
                fresh: 0,
                stale: 1,
                unverified: 1,
                no_matches: 1,
                untracked: 3,
                skipped: 1,
            }
        );
        assert!(r.has_stale());
    }

    #[test]
    fn json_shape() {
        let json = render_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["threshold_days"], 7);
        assert_eq!(value["summary"]["stale"], 1);
        assert_eq!(value["docs"][0]["status"], "stale");
        assert_eq!(value["docs"][0]["stale_files"][0]["days_after"], 60);
        assert_eq!(value["docs"][2]["status"], "no_matches");
        assert_eq!(value["skipped"][0]["path"], "docs/bad.md");
        // empty lists are omitted per document
        assert!(value["docs"][1].get("stale_files").is_none());
    }

    #[test]
    fn markdown_sections() {
        let md = render_markdown(&sample());
        assert!(md.starts_with("# Documentation Staleness Report\n"));
        assert!(md.contains("Generated 2024-03-05 12:00 UTC with a threshold of 7 day(s)."));
        assert!(md.contains("| Stale | 1 |"));
        assert!(md.contains("### `docs/auth.md` (Auth \\| Login)"));
        assert!(md.contains("| `src/auth/login.ts` | 2024-03-01 | 60 |"));
        assert!(md.contains("## Unverified documents\n\n- `docs/api.md`"));
        assert!(md.contains("- `docs/old.md`: `src/legacy/*.js`"));
        assert!(md.contains("- `docs/bad.md`: invalid frontmatter: bad date"));
        assert!(md.ends_with('\n') && !md.ends_with("\n\n"));
    }

    #[test]
    fn markdown_without_stale_says_so() {
        let r = Report::new(
            Path::new("/repo"),
            7,
            Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
            vec![],
            0,
            vec![],
        );
        let md = render_markdown(&r);
        assert!(md.contains("No stale documents."));
        assert!(!md.contains("## Unverified"));
        assert!(!md.contains("## Skipped"));
    }

    #[test]
    fn text_lists_stale_files_and_summary() {
        let text = render_text(&sample());
        assert!(text.starts_with("STATUS"));
        assert!(text.contains("docs/auth.md:\n  src/auth/login.ts changed 2024-03-01 (60 day(s) after verification)"));
        assert!(text.contains("skipped docs/bad.md: invalid frontmatter: bad date"));
        assert!(text.contains("3 tracked: 1 stale, 0 fresh, 1 unverified, 1 without matches"));
    }

    #[test]
    fn table_pads_columns() {
        let table = format_table(
            &["A", "LONG HEADER"],
            &[vec!["wide cell".to_string(), "x".to_string()]],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "A          LONG HEADER");
        assert_eq!(lines[1], "---------  -----------");
        assert_eq!(lines[2], "wide cell  x");
    }
}
