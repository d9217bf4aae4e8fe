use super::Outcome;
use anyhow::Context;
use clap::Args;
use kb_stale_core::checker::{self, CheckOptions};
use kb_stale_core::config::{Config, ReportFormat};
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Days a related file may change after last_verified before a page is stale
    #[arg(long, short = 't', value_name = "DAYS")]
    pub threshold: Option<u32>,

    /// Report format: text, json, or markdown (default: from config)
    #[arg(long, short = 'f', value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Write the report to FILE instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(root: &Path, config_path: Option<&Path>, args: CheckArgs) -> anyhow::Result<Outcome> {
    let config = Config::load(root, config_path).context("failed to load config")?;
    let format = args.format.unwrap_or(config.format);

    let report = checker::check(
        root,
        &config,
        CheckOptions {
            threshold_days: args.threshold,
        },
    )
    .context("staleness check failed")?;

    let rendered = report.render(format)?;
    match &args.output {
        Some(path) => {
            kb_stale_core::io::atomic_write(path, rendered.as_bytes())
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            eprintln!("Wrote {format} report to {}", path.display());
        }
        None => print!("{rendered}"),
    }

    if report.has_stale() {
        tracing::info!("{} stale page(s)", report.summary.stale);
        Ok(Outcome::StaleFound)
    } else {
        Ok(Outcome::Clean)
    }
}
