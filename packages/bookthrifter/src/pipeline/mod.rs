//! Extraction pipeline: wish-list → book detail → editions → conditions.
//!
//! The stages run strictly in sequence on one exclusive session:
//!
//! 1. [`wishlist::collect_entries`] reads only title and link of every entry,
//!    so no element handle survives a navigation.
//! 2. [`wishlist::read_book`] visits each link for identifier and authors.
//! 3. [`editions::extract_editions`] visits the all-editions page and reads
//!    every selectable condition.
//!
//! Failure policy: a timeout on a structural anchor ends the run, a broken
//! entry ends only that book, and a missing optional attribute only degrades
//! that field (recorded as a [`FieldIssue`](crate::types::outcome::FieldIssue)).

pub mod editions;
pub mod login;
pub mod wishlist;

use tracing::{info, warn};

use crate::error::{ExtractionError, PageError, Result};
use crate::traits::page::{ElementRef, PageSession};
use crate::types::{
    config::AgentConfig,
    outcome::{ExtractionOutcome, SkippedEntry},
};

pub use editions::{extract_editions, parse_detail_row, EditionsPage};
pub use login::login;
pub use wishlist::{collect_entries, read_book, WishlistEntry};

/// Drives a page session through the whole extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractionAgent {
    config: AgentConfig,
}

impl ExtractionAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Extract the complete current catalog of the wish-list.
    ///
    /// `session` must already be authenticated (see [`login`]).
    pub async fn run<P: PageSession + ?Sized>(&self, session: &mut P) -> Result<ExtractionOutcome> {
        let mut outcome = ExtractionOutcome::default();

        let entries = collect_entries(session, &self.config, &mut outcome.skipped).await?;
        info!(count = entries.len(), "Parsed wish-list entries");

        for entry in entries {
            match self.extract_book(session, &entry, &mut outcome).await {
                Ok(()) => {}
                Err(err) if !err.is_fatal() => {
                    warn!(url = %entry.url, error = %err, "Skipping book");
                    outcome.skipped.push(SkippedEntry {
                        url: entry.url.clone(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            books = outcome.books.len(),
            editions = outcome.edition_count(),
            conditions = outcome.condition_count(),
            skipped = outcome.skipped.len(),
            "Extraction complete"
        );
        Ok(outcome)
    }

    async fn extract_book<P: PageSession + ?Sized>(
        &self,
        session: &mut P,
        entry: &WishlistEntry,
        outcome: &mut ExtractionOutcome,
    ) -> Result<()> {
        let mut book = read_book(session, &self.config.layout, entry).await?;
        info!(uid = book.uid, title = %book.title, author = %book.author, "Reading editions");

        let page = extract_editions(session, &self.config, &book).await?;
        for edition in page.editions {
            book.add_edition(edition);
        }

        outcome.field_issues.extend(page.issues);
        outcome.books.push(book);
        Ok(())
    }
}

/// Wait for a structural anchor; a timeout becomes `NavigationTimeout`.
pub(crate) async fn wait_for_anchor<P: PageSession + ?Sized>(
    session: &mut P,
    config: &AgentConfig,
    url: &str,
    selector: &str,
) -> Result<ElementRef> {
    session
        .wait_for(selector, config.wait_timeout, config.poll_interval)
        .await
        .map_err(|err| match err {
            PageError::Timeout { selector, timeout } => ExtractionError::NavigationTimeout {
                url: url.to_string(),
                selector,
                timeout,
            },
            other => other.into(),
        })
}

/// Turn a missing required element into `MissingElement` for `url`.
pub(crate) fn required<T>(result: std::result::Result<T, PageError>, url: &str) -> Result<T> {
    result.map_err(|err| match err {
        PageError::NoSuchElement { selector } => ExtractionError::MissingElement {
            url: url.to_string(),
            selector,
        },
        other => other.into(),
    })
}
