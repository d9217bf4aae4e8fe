use crate::error::{Result, StaleError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ReportFormat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "markdown",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = StaleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => Err(StaleError::UnknownFormat(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Directory holding the Markdown pages, relative to the repository root.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,
    /// Root-relative globs of pages to scan.
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Days a related file may change after `last_verified` before the page is stale.
    #[serde(default = "default_threshold_days")]
    pub threshold_days: u32,
    /// Maximum number of concurrent `git log` lookups.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub format: ReportFormat,
}

fn default_version() -> u32 {
    1
}

fn default_docs_dir() -> String {
    paths::DEFAULT_DOCS_DIR.to_string()
}

fn default_include() -> Vec<String> {
    vec!["**/*.md".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/.vitepress/**".to_string(),
    ]
}

fn default_threshold_days() -> u32 {
    7
}

fn default_concurrency() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            docs_dir: default_docs_dir(),
            include: default_include(),
            exclude: default_exclude(),
            threshold_days: default_threshold_days(),
            concurrency: default_concurrency(),
            format: ReportFormat::default(),
        }
    }
}

impl Config {
    /// Load the config for `root`.
    ///
    /// An explicit path must exist. Without one, `<root>/.kb-stale.yaml` is
    /// used when present and built-in defaults otherwise.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => {
                let p = if p.is_absolute() { p.to_path_buf() } else { root.join(p) };
                if !p.exists() {
                    return Err(StaleError::ConfigNotFound(p));
                }
                p
            }
            None => {
                let p = paths::config_path(root);
                if !p.exists() {
                    tracing::debug!("no config at {}, using defaults", p.display());
                    return Ok(Self::default());
                }
                p
            }
        };
        tracing::debug!("loading config from {}", path.display());
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Concurrency limit with a floor of one.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message });
        };

        if self.version != 1 {
            push(
                WarnLevel::Warning,
                format!("unsupported config version {} (expected 1)", self.version),
            );
        }

        if self.docs_dir.split(['/', '\\']).any(|p| p == "..") {
            push(
                WarnLevel::Error,
                format!("docs_dir '{}' must not leave the repository", self.docs_dir),
            );
        }

        if self.include.is_empty() {
            push(
                WarnLevel::Error,
                "include is empty; no pages would be scanned".to_string(),
            );
        }

        for (field, patterns) in [("include", &self.include), ("exclude", &self.exclude)] {
            for pattern in patterns {
                if let Err(e) = glob::Pattern::new(pattern) {
                    push(
                        WarnLevel::Error,
                        format!("invalid glob '{pattern}' in {field}: {e}"),
                    );
                }
            }
        }

        if self.concurrency == 0 {
            push(
                WarnLevel::Error,
                "concurrency must be at least 1".to_string(),
            );
        } else if self.concurrency > 64 {
            push(
                WarnLevel::Warning,
                format!(
                    "concurrency={} spawns many git processes at once (>64 is unusual)",
                    self.concurrency
                ),
            );
        }

        if self.threshold_days > 365 {
            push(
                WarnLevel::Warning,
                format!(
                    "threshold_days={} is over a year; pages will rarely be flagged",
                    self.threshold_days
                ),
            );
        }

        warnings
    }

    pub fn has_errors(warnings: &[ConfigWarning]) -> bool {
        warnings.iter().any(|w| w.level == WarnLevel::Error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
