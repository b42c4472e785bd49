//! One monitoring run per profile.

use anyhow::{Context, Result};
use bookthrifter::{
    login, AgentConfig, Credentials, ExtractionAgent, ExtractionOutcome, LedgerFile, PageSession,
    PriceChange, SnapshotStore, WebDriverPage,
};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use webdriver_client::{Browser, Capabilities, WebDriverClient};

use crate::config::{Paths, Profile};

/// Settings shared by every profile in one invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub browser: Browser,
    pub webdriver_url: String,
    pub headless: bool,
    pub dry_run: bool,
    pub paths: Paths,
    pub agent: AgentConfig,
}

/// What a run extracted and persisted.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub books: usize,
    pub conditions: usize,
    pub skipped: usize,
    pub changes: Vec<PriceChange>,
    pub snapshot: Option<PathBuf>,
    /// Book count of the snapshot that was newest before this run
    pub previous_books: Option<usize>,
}

/// Run one profile against a fresh browser session.
pub async fn run_profile(profile: &Profile, options: &RunOptions) -> Result<RunSummary> {
    info!(profile = %profile.name, browser = %options.browser, "Starting run");

    let client = WebDriverClient::new(&options.webdriver_url);
    let capabilities = Capabilities::new(options.browser).headless(options.headless);
    let mut session = WebDriverPage::start(client, &capabilities).await.with_context(|| {
        format!("Failed to start a browser session at {}", options.webdriver_url)
    })?;

    let outcome = extract_with_session(&mut session, &profile.credentials, &options.agent).await?;
    persist_outcome(&outcome, options)
}

/// Log in and extract, then close the session whether or not that worked.
pub async fn extract_with_session<P: PageSession + ?Sized>(
    session: &mut P,
    credentials: &Credentials,
    config: &AgentConfig,
) -> Result<ExtractionOutcome> {
    let result = async {
        login(session, config, credentials).await.context("Login failed")?;
        ExtractionAgent::new(config.clone())
            .run(session)
            .await
            .context("Extraction failed")
    }
    .await;

    if let Err(e) = session.quit().await {
        warn!(error = %e, session = session.name(), "Failed to close browser session");
    }

    result
}

/// Fold the outcome into the ledger and write a snapshot, unless dry-running.
pub fn persist_outcome(outcome: &ExtractionOutcome, options: &RunOptions) -> Result<RunSummary> {
    for issue in &outcome.field_issues {
        debug!(%issue, "Field unavailable");
    }

    let snapshots = SnapshotStore::new(&options.paths.data_dir);
    let previous_books = snapshots
        .load_latest()
        .context("Failed to read the previous snapshot")?
        .map(|books| books.len());
    if let Some(previous) = previous_books {
        info!(previous, current = outcome.books.len(), "Compared with previous snapshot");
    }

    let mut summary = RunSummary {
        books: outcome.books.len(),
        conditions: outcome.condition_count(),
        skipped: outcome.skipped.len(),
        previous_books,
        ..Default::default()
    };

    if options.dry_run {
        info!(books = summary.books, "Dry run: ledger and snapshot left untouched");
        return Ok(summary);
    }

    let ledger = LedgerFile::new(options.paths.ledger_path());
    let (_, changes) = ledger
        .update(&outcome.books)
        .with_context(|| format!("Failed to update {}", ledger.path().display()))?;
    for change in &changes {
        match change {
            PriceChange::NewLow { .. } => info!(%change, "Price drop"),
            _ => debug!(%change, "Ledger change"),
        }
    }

    let snapshot = snapshots.save(&outcome.books).context("Failed to write snapshot")?;
    info!(path = %snapshot.display(), changes = changes.len(), "Saved snapshot");

    summary.changes = changes;
    summary.snapshot = Some(snapshot);
    Ok(summary)
}
