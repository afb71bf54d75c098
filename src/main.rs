use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scour::scour_config::CliOverrides;
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "scour")]
#[command(
    version,
    about = "Rewrites a repository's entire history to strip oversized or forbidden blobs, then force-republishes it"
)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Auto-confirm both destructive checkpoints (rewrite and publish)
    #[arg(long, global = true)]
    pub yes: bool,

    /// Directory containing scour.toml (defaults to the current directory)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: mirror, back up, rewrite, verify, publish
    Run {
        /// Source repository URL (overrides [source] url)
        #[arg(long)]
        source: Option<String>,

        /// Publish remote name (overrides [source] remote)
        #[arg(long)]
        remote: Option<String>,

        /// Maximum retained blob size in megabytes; 0 disables size stripping
        #[arg(long)]
        max_blob_size: Option<u64>,

        /// Extension to strip everywhere in history (repeatable)
        #[arg(long = "strip-ext")]
        strip_ext: Vec<String>,

        /// Literal repository-relative path to strip (repeatable)
        #[arg(long = "strip-path")]
        strip_path: Vec<String>,

        /// Stop after rewrite + verification; publish nothing
        #[arg(long)]
        rewrite_only: bool,

        /// Parent directory for the timestamped workspace
        #[arg(long)]
        workspace_root: Option<PathBuf>,
    },
    /// Print the rewrite command that `run` would execute, verbatim
    Preview {
        /// Maximum retained blob size in megabytes; 0 disables size stripping
        #[arg(long)]
        max_blob_size: Option<u64>,

        /// Extension to strip everywhere in history (repeatable)
        #[arg(long = "strip-ext")]
        strip_ext: Vec<String>,

        /// Literal repository-relative path to strip (repeatable)
        #[arg(long = "strip-path")]
        strip_path: Vec<String>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default scour.toml file
    Init,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let default_level = if verbose { "scour=debug" } else { "scour=warn" };
    let filter = EnvFilter::try_from_env("SCOUR_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_dir = match cli.config_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Run {
            source,
            remote,
            max_blob_size,
            strip_ext,
            strip_path,
            rewrite_only,
            workspace_root,
        } => {
            let overrides = CliOverrides {
                source_url: source.clone(),
                remote: remote.clone(),
                max_blob_size_mb: *max_blob_size,
                strip_extensions: (!strip_ext.is_empty()).then(|| strip_ext.clone()),
                strip_paths: (!strip_path.is_empty()).then(|| strip_path.clone()),
                auto_confirm: cli.yes,
                rewrite_only: *rewrite_only,
                workspace_root: workspace_root.clone(),
            };
            cmd::cmd_run(&config_dir, &overrides, cli.verbose).await?;
        }
        Commands::Preview {
            max_blob_size,
            strip_ext,
            strip_path,
        } => {
            let overrides = CliOverrides {
                max_blob_size_mb: *max_blob_size,
                strip_extensions: (!strip_ext.is_empty()).then(|| strip_ext.clone()),
                strip_paths: (!strip_path.is_empty()).then(|| strip_path.clone()),
                ..Default::default()
            };
            cmd::cmd_preview(&config_dir, &overrides)?;
        }
        Commands::Config { command } => {
            cmd::cmd_config(&config_dir, command.clone())?;
        }
    }

    Ok(())
}
