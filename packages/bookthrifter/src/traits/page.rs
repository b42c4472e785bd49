//! Page-automation trait the extraction agent drives.
//!
//! A `PageSession` is one exclusive browser tab. Every method takes
//! `&mut self`: navigating invalidates element handles from the previous
//! page, so two tasks sharing one session is a compile error rather than a
//! race.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bookthrifter::traits::page::PageSession;
//!
//! session.navigate("https://example.com/list/").await?;
//! let root = session.wait_for(".List", timeout, poll).await?;
//! let items = session.find_all(Some(&root), ".Item").await?;
//! ```

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::error::{PageError, PageResult};

/// WebDriver key codes usable with [`PageSession::send_keys`].
pub use webdriver_client::keys;

/// Handle to an element on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Page-automation capability for one browser session.
///
/// Implementations:
/// - `WebDriverPage` - a real browser through a W3C WebDriver server
/// - `MockPage` - scripted in-memory pages for tests
#[async_trait]
pub trait PageSession: Send {
    /// Load `url` in the session, replacing the current page.
    async fn navigate(&mut self, url: &str) -> PageResult<()>;

    async fn current_url(&mut self) -> PageResult<String>;

    /// Elements matching a CSS selector, in document order.
    ///
    /// With `scope`, only descendants of that element are searched.
    async fn find_all(
        &mut self,
        scope: Option<&ElementRef>,
        selector: &str,
    ) -> PageResult<Vec<ElementRef>>;

    /// Rendered text of an element.
    async fn text(&mut self, element: &ElementRef) -> PageResult<String>;

    /// Full text content, including text hidden by styling.
    async fn text_content(&mut self, element: &ElementRef) -> PageResult<String>;

    async fn attribute(&mut self, element: &ElementRef, name: &str) -> PageResult<Option<String>>;

    async fn click(&mut self, element: &ElementRef) -> PageResult<()>;

    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> PageResult<()>;

    /// End the session. Handles are unusable afterwards.
    async fn quit(&mut self) -> PageResult<()> {
        Ok(())
    }

    /// First element matching `selector`, or `NoSuchElement`.
    async fn find(&mut self, scope: Option<&ElementRef>, selector: &str) -> PageResult<ElementRef> {
        self.find_all(scope, selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PageError::NoSuchElement {
                selector: selector.to_string(),
            })
    }

    /// First element matching `selector`, or `None` when nothing matches.
    async fn find_optional(
        &mut self,
        scope: Option<&ElementRef>,
        selector: &str,
    ) -> PageResult<Option<ElementRef>> {
        Ok(self.find_all(scope, selector).await?.into_iter().next())
    }

    /// Poll for `selector` until it is present or `timeout` elapses.
    ///
    /// The wait blocks the run; it is not cancellable.
    async fn wait_for(
        &mut self,
        selector: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> PageResult<ElementRef> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(element) = self.find_optional(None, selector).await? {
                return Ok(element);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PageError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Session name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
