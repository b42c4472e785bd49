//! Stages 1 and 2: wish-list discovery and per-book detail.

use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, ValidationError};
use crate::pipeline::{required, wait_for_anchor};
use crate::traits::page::PageSession;
use crate::types::{
    catalog::{uid_from_url, Book},
    config::{AgentConfig, SiteLayout},
    outcome::SkippedEntry,
};

/// The two cheap fields needed to revisit a wish-list entry later.
#[derive(Debug, Clone, PartialEq)]
pub struct WishlistEntry {
    pub title: String,
    pub url: String,
}

/// Navigate to the wish-list and collect title and link of every entry.
///
/// Fails with `NavigationTimeout` when the list container never appears.
/// Links are resolved against the wish-list URL. Entries whose link cannot
/// be read or resolved are pushed onto `skipped`.
pub async fn collect_entries<P: PageSession + ?Sized>(
    session: &mut P,
    config: &AgentConfig,
    skipped: &mut Vec<SkippedEntry>,
) -> Result<Vec<WishlistEntry>> {
    let layout = &config.layout;
    // Links may be relative to the list page
    let base = Url::parse(&layout.wishlist_url).map_err(|_| ValidationError::InvalidIdentifier {
        field: "wishlist_url",
        value: layout.wishlist_url.clone(),
    })?;
    session.navigate(&layout.wishlist_url).await?;
    let root = wait_for_anchor(session, config, &layout.wishlist_url, &layout.wishlist_root).await?;

    let items = session.find_all(Some(&root), &layout.wishlist_item).await?;
    debug!(count = items.len(), "Found wish-list items");

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let link = session.find_optional(Some(&item), &layout.wishlist_item_link).await?;
        let Some(link) = link else {
            warn!(selector = %layout.wishlist_item_link, "Wish-list item without a title link");
            skipped.push(SkippedEntry {
                url: layout.wishlist_url.clone(),
                reason: format!("missing `{}`", layout.wishlist_item_link),
            });
            continue;
        };

        let title = session.text(&link).await?.trim().to_string();
        let href = session.attribute(&link, "href").await?.map(|h| h.trim().to_string());
        match href {
            Some(href) if !href.is_empty() && !title.is_empty() => match base.join(&href) {
                Ok(url) => entries.push(WishlistEntry {
                    title,
                    url: url.to_string(),
                }),
                Err(e) => {
                    warn!(title = %title, href = %href, error = %e, "Unusable wish-list link");
                    skipped.push(SkippedEntry {
                        url: href,
                        reason: format!("unresolvable link: {}", e),
                    });
                }
            },
            href => {
                warn!(title = %title, href = ?href, "Wish-list item without title or link");
                skipped.push(SkippedEntry {
                    url: href.unwrap_or_else(|| layout.wishlist_url.clone()),
                    reason: "missing title or link".to_string(),
                });
            }
        }
    }

    Ok(entries)
}

/// Visit one entry's detail page and build its (edition-less) book.
///
/// The identifier comes from the link's last path segment. Authors are the
/// link texts inside the author block, joined with ", ".
pub async fn read_book<P: PageSession + ?Sized>(
    session: &mut P,
    layout: &SiteLayout,
    entry: &WishlistEntry,
) -> Result<Book> {
    let uid = uid_from_url(&entry.url)?;
    session.navigate(&entry.url).await?;

    let authors_block = required(session.find(None, &layout.book_authors).await, &entry.url)?;
    let links = session.find_all(Some(&authors_block), &layout.book_author_link).await?;

    let mut names = Vec::with_capacity(links.len());
    for link in &links {
        let name = session.text(link).await?;
        let name = name.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }

    debug!(uid, authors = names.len(), "Read book detail");
    Ok(Book::new(uid, entry.title.clone(), names.join(", "), entry.url.clone()))
}
