use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StaleError {
    #[error("not a git repository: {0}")]
    NotAGitRepo(PathBuf),

    #[error("git executable not found on PATH")]
    GitNotFound,

    #[error("git failed: {0}")]
    Git(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid frontmatter: {0}")]
    InvalidFrontmatter(String),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unknown report format '{0}': expected text, json, or markdown")]
    UnknownFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StaleError>;
