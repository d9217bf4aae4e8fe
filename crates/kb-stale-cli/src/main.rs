mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{check::CheckArgs, config::ConfigSubcommand, Outcome};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "kb-stale",
    about = "Flag documentation pages whose related code changed after they were last verified",
    version,
    propagate_version = true,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Repository root (default: auto-detect from .kb-stale.yaml or .git/)
    #[arg(long, global = true, env = "KB_STALE_ROOT")]
    root: Option<PathBuf>,

    /// Config file; relative paths resolve against the repository root (default: <root>/.kb-stale.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(flatten)]
    check: CheckArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check pages for staleness (the default when no subcommand is given)
    Check(CheckArgs),

    /// List pages that declare related_code
    List {
        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Show, validate, or create the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let config = cli.config.as_deref();

    let result = match cli.command {
        None => cmd::check::run(&root, config, cli.check),
        Some(Commands::Check(args)) => cmd::check::run(&root, config, args),
        Some(Commands::List { json }) => cmd::list::run(&root, config, json),
        Some(Commands::Config { subcommand }) => cmd::config::run(&root, config, subcommand),
    };

    let code = match result {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            Outcome::EXIT_ERROR
        }
    };
    std::process::exit(code);
}
