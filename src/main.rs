use anyhow::Result;
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, Level};
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gh_mirror::{Config, SyncEngine};

#[derive(Parser)]
#[command(name = "gh-mirror")]
#[command(about = "Clone or update every GitHub repository visible to an API token")]
#[command(version)]
struct Cli {
    /// API token for the user
    #[arg(value_parser = NonEmptyStringValueParser::new())]
    token: String,

    /// Mirror the specified user's repositories instead of the token owner's
    #[arg(short, long)]
    user: Option<String>,

    /// Log progress to stdout
    #[arg(short, long)]
    verbose: bool,

    /// Directory to store repositories in [default: .]
    #[arg(short, long = "output-directory", value_name = "PATH")]
    output_directory: Option<PathBuf>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GitHub API root, e.g. for GitHub Enterprise
    #[arg(long, value_name = "URL")]
    api_root: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Progress goes to stdout only when verbose; warnings and errors always go to stderr
fn init_logging(verbose: bool) {
    let progress_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("off")
    };

    let progress = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .with_filter(filter_fn(|meta| *meta.level() > Level::WARN))
        .with_filter(progress_filter);

    let problems = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(progress)
        .with(problems)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    let settings = config.into_settings(cli.token, cli.user, cli.output_directory, cli.api_root);
    let engine = SyncEngine::from_settings(settings)?;
    let summary = engine.run().await?;

    debug!(
        "Mirrored {} repositories ({} cloned, {} pulled, {} tool failures)",
        summary.total_repositories, summary.cloned, summary.pulled, summary.tool_failures
    );

    Ok(())
}
