//! Bookthrifter
//!
//! Checks every configured wish-list for current prices, records new
//! lows and highs in the price ledger, and keeps a snapshot of each run.

use anyhow::{Context, Result};
use bookthrifter::AgentConfig;
use bookthrifter_cli::{discover_profiles, run_profile, Paths, Profile, RunOptions};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webdriver_client::{Browser, DEFAULT_SERVER_URL};

#[derive(Parser)]
#[command(name = "bookthrifter", version)]
#[command(about = "Track record-low prices on your bookstore wish-list")]
struct Cli {
    /// Run a single profile file instead of every file in ~/.bookthrifter/config
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Browser to request from the WebDriver server
    #[arg(long, default_value_t = Browser::Chrome)]
    browser: Browser,

    /// WebDriver server (chromedriver, geckodriver, or Selenium)
    #[arg(long, env = "BOOKTHRIFTER_WEBDRIVER_URL", default_value = DEFAULT_SERVER_URL)]
    webdriver_url: String,

    /// Where the ledger and snapshots live (default ~/.bookthrifter/data)
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Extract and report without writing the ledger or a snapshot
    #[arg(long)]
    dry_run: bool,

    /// Debug logging for bookthrifter crates
    #[arg(long)]
    verbose: bool,

    /// Show the browser window; implies --verbose
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose || cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "info,bookthrifter=debug,bookthrifter_cli=debug,webdriver_client=debug"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(verbose))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut paths = Paths::from_env()?;
    if let Some(data_dir) = &cli.data_dir {
        paths = paths.with_data_dir(data_dir);
    }

    let profile_paths = match &cli.config {
        Some(path) => vec![path.clone()],
        None => discover_profiles(&paths.config_dir)?,
    };
    if profile_paths.is_empty() {
        tracing::info!(
            "No profiles found. Add a file such as {} containing `email` and `password`.",
            paths.config_dir.join("main.toml").display()
        );
        return Ok(());
    }

    let options = RunOptions {
        browser: cli.browser,
        webdriver_url: cli.webdriver_url,
        headless: !cli.debug,
        dry_run: cli.dry_run,
        paths,
        agent: AgentConfig::default(),
    };

    for path in profile_paths {
        let profile = Profile::load(&path)?;
        let summary = run_profile(&profile, &options)
            .await
            .with_context(|| format!("Run failed for profile {}", profile.name))?;
        tracing::info!(
            profile = %profile.name,
            books = summary.books,
            conditions = summary.conditions,
            skipped = summary.skipped,
            price_changes = summary.changes.len(),
            "Run complete"
        );
    }

    Ok(())
}
