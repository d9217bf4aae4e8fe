use super::Outcome;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use kb_stale_core::config::{Config, WarnLevel};
use kb_stale_core::{io, paths};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective config (file values merged over defaults)
    Show {
        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Validate the config for common mistakes
    Validate {
        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, config_path: Option<&Path>, subcmd: ConfigSubcommand) -> anyhow::Result<Outcome> {
    match subcmd {
        ConfigSubcommand::Show { json } => show(root, config_path, json),
        ConfigSubcommand::Validate { json } => validate(root, config_path, json),
        ConfigSubcommand::Init { force } => init(root, config_path, force),
    }?;
    Ok(Outcome::Clean)
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root, config_path).context("failed to load config")?;
    if json {
        print_json(&config)?;
    } else {
        print!("{}", serde_yaml::to_string(&config)?);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root, config_path).context("failed to load config")?;
    let mut warnings = config.validate();

    let docs = paths::docs_dir(root, &config.docs_dir);
    if !docs.is_dir() {
        warnings.push(kb_stale_core::config::ConfigWarning {
            level: WarnLevel::Warning,
            message: format!("docs_dir '{}' does not exist", config.docs_dir),
        });
    }

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if Config::has_errors(&warnings) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

const CONFIG_HEADER: &str = "# kb-stale: flags pages whose related_code changed more than\n\
# threshold_days after their last_verified date.\n";

fn target_path(root: &Path, config_path: Option<&Path>) -> PathBuf {
    match config_path {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => root.join(p),
        None => paths::config_path(root),
    }
}

fn init(root: &Path, config_path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = target_path(root, config_path);
    let body = format!("{CONFIG_HEADER}{}", serde_yaml::to_string(&Config::default())?);

    let written = if force {
        io::atomic_write(&path, body.as_bytes())?;
        true
    } else {
        io::write_if_missing(&path, body.as_bytes())?
    };

    if written {
        println!("Wrote {}", path.display());
    } else {
        println!("{} already exists (use --force to overwrite).", path.display());
    }
    Ok(())
}
