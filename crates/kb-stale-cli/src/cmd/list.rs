use super::Outcome;
use crate::output::{print_json, print_table};
use anyhow::Context;
use kb_stale_core::config::Config;
use kb_stale_core::scan;
use std::path::Path;

pub fn run(root: &Path, config_path: Option<&Path>, json: bool) -> anyhow::Result<Outcome> {
    let config = Config::load(root, config_path).context("failed to load config")?;
    let scan = scan::scan_docs(root, &config).context("failed to scan docs")?;

    if json {
        let value = serde_json::json!({
            "tracked": scan.tracked,
            "untracked": scan.untracked,
            "skipped": scan.skipped,
        });
        print_json(&value)?;
        return Ok(Outcome::Clean);
    }

    if scan.tracked.is_empty() {
        println!("No pages declare related_code.");
    } else {
        let rows = scan
            .tracked
            .iter()
            .map(|d| {
                vec![
                    d.path.clone(),
                    d.last_verified
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    d.files.len().to_string(),
                    d.patterns.join(", "),
                ]
            })
            .collect();
        print_table(&["PAGE", "VERIFIED", "FILES", "PATTERNS"], rows);
    }

    for s in &scan.skipped {
        println!("skipped {}: {}", s.path, s.reason);
    }
    Ok(Outcome::Clean)
}
