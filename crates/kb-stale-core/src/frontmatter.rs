//! YAML frontmatter parsing for documentation pages.
//!
//! Only two keys matter to the checker: `related_code` (a glob or list of
//! globs, relative to the repository root) and `last_verified` (an ISO
//! date). Everything else in the block is ignored.

use crate::error::{Result, StaleError};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// DocMeta
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub related_code: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<NaiveDate>,
}

impl DocMeta {
    /// A page participates in staleness checks only when it names related code.
    pub fn is_tracked(&self) -> bool {
        !self.related_code.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedCode {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    #[serde(default)]
    title: Option<serde_yaml::Value>,
    #[serde(default)]
    related_code: Option<RelatedCode>,
    #[serde(default)]
    last_verified: Option<serde_yaml::Value>,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Return the YAML between the opening `---` line and the next `---` line.
///
/// The opening fence must be the very first line of the file (a UTF-8 BOM
/// is tolerated).
pub fn extract_frontmatter(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content.strip_prefix("---")?;
    let rest = if let Some(r) = rest.strip_prefix('\n') {
        r
    } else if let Some(r) = rest.strip_prefix("\r\n") {
        r
    } else {
        return None;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']).trim_end() == "---" {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

static DATE_RE: OnceLock<Regex> = OnceLock::new();

fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:[T ].*)?$").expect("date regex is valid")
    })
}

/// Parse an ISO `YYYY-MM-DD` date; a trailing time part is ignored.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    let caps = date_re()
        .captures(raw)
        .ok_or_else(|| StaleError::InvalidFrontmatter(format!("last_verified '{raw}' is not an ISO date")))?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").map_err(|e| {
        StaleError::InvalidFrontmatter(format!("last_verified '{raw}' is not a valid date: {e}"))
    })
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse the frontmatter of a Markdown page.
///
/// Returns `Ok(None)` when the page has no frontmatter block and
/// `Err(InvalidFrontmatter)` when the block is present but malformed.
pub fn parse_doc_meta(content: &str) -> Result<Option<DocMeta>> {
    let Some(fm) = extract_frontmatter(content) else {
        return Ok(None);
    };
    if fm.trim().is_empty() {
        return Ok(Some(DocMeta::default()));
    }

    let raw: RawMeta = serde_yaml::from_str(fm)
        .map_err(|e| StaleError::InvalidFrontmatter(e.to_string()))?;

    let related_code = match raw.related_code {
        None => Vec::new(),
        Some(RelatedCode::One(s)) => vec![s],
        Some(RelatedCode::Many(v)) => v,
    };
    let related_code: Vec<String> = related_code
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let last_verified = match raw.last_verified {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(s)) => Some(parse_iso_date(&s)?),
        Some(other) => {
            return Err(StaleError::InvalidFrontmatter(format!(
                "last_verified must be an ISO date string, got {other:?}"
            )))
        }
    };

    Ok(Some(DocMeta {
        title: raw.title.as_ref().and_then(scalar_to_string),
        related_code,
        last_verified,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
