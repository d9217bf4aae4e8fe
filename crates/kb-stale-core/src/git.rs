use crate::error::{Result, StaleError};
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tokio::runtime::RuntimeFlavor;
use tokio::sync::Semaphore;

pub type CommitDate = DateTime<FixedOffset>;

// ---------------------------------------------------------------------------
// GitRepo
// ---------------------------------------------------------------------------

/// A git work tree that file-modification dates are read from.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
    git: PathBuf,
}

impl GitRepo {
    /// Locate `git` and confirm `root` is inside a work tree.
    pub fn open(root: &Path) -> Result<Self> {
        let git = which::which("git").map_err(|_| StaleError::GitNotFound)?;
        let output = std::process::Command::new(&git)
            .args(["rev-parse", "--is-inside-work-tree"])
            .current_dir(root)
            .output()?;
        let inside = output.status.success()
            && String::from_utf8_lossy(&output.stdout).trim() == "true";
        if !inside {
            return Err(StaleError::NotAGitRepo(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            git,
        })
    }

    /// Committer date of the last commit touching `path` (root-relative).
    /// Returns `None` for files git has never committed. `path` is matched
    /// literally, so names like `[id].ts` are not treated as globs.
    pub async fn last_modified(&self, path: &str) -> Result<Option<CommitDate>> {
        let output = Command::new(&self.git)
            .args(["--literal-pathspecs", "log", "-1", "--format=%cI", "--"])
            .arg(path)
            .current_dir(&self.root)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StaleError::Git(format!(
                "git log for '{path}' exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_commit_date(&String::from_utf8_lossy(&output.stdout))
    }

    /// Look up every file concurrently, at most `concurrency` git processes
    /// at a time. Failed lookups are logged and recorded as `None`.
    pub async fn last_modified_batch(
        &self,
        files: &[String],
        concurrency: usize,
    ) -> HashMap<String, Option<CommitDate>> {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let repo = Arc::new(self.clone());
        let mut handles = Vec::with_capacity(files.len());

        for file in files {
            let sem = semaphore.clone();
            let repo = repo.clone();
            let file = file.clone();
            handles.push(tokio::spawn(async move {
                let _permit = match sem.acquire().await {
                    Ok(p) => p,
                    Err(_) => return (file, None),
                };
                match repo.last_modified(&file).await {
                    Ok(date) => {
                        if date.is_none() {
                            tracing::debug!("{file} has no commits");
                        }
                        (file, date)
                    }
                    Err(e) => {
                        tracing::warn!("skipping {file}: {e}");
                        (file, None)
                    }
                }
            }));
        }

        let mut dates = HashMap::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok((file, date)) => {
                    dates.insert(file, date);
                }
                Err(e) => tracing::warn!("git lookup task failed: {e}"),
            }
        }
        dates
    }

    /// Blocking wrapper around [`GitRepo::last_modified_batch`] for callers
    /// outside an async context. Inside a current-thread runtime the lookups
    /// run on a separate thread with its own runtime.
    pub fn last_modified_all(
        &self,
        files: &[String],
        concurrency: usize,
    ) -> Result<HashMap<String, Option<CommitDate>>> {
        let run = || -> Result<HashMap<String, Option<CommitDate>>> {
            let rt = tokio::runtime::Runtime::new()?;
            Ok(rt.block_on(self.last_modified_batch(files, concurrency)))
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                Ok(tokio::task::block_in_place(|| {
                    handle.block_on(self.last_modified_batch(files, concurrency))
                }))
            }
            Ok(_) => std::thread::scope(|s| s.spawn(run).join())
                .unwrap_or_else(|_| Err(StaleError::Git("git lookup thread panicked".into()))),
            Err(_) => run(),
        }
    }
}

/// Parse `git log --format=%cI` output. Empty output means no commits.
pub fn parse_commit_date(stdout: &str) -> Result<Option<CommitDate>> {
    let line = stdout.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(line)
        .map(Some)
        .map_err(|e| StaleError::Git(format!("unparseable commit date '{line}': {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
