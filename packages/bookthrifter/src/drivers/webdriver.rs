//! Browser sessions over the W3C WebDriver protocol.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use webdriver_client::{Capabilities, ElementId, SessionId, WebDriverClient, WebDriverError};

use crate::error::{PageError, PageResult};
use crate::traits::page::{ElementRef, PageSession};

/// One browser session driven through a WebDriver server
/// (chromedriver, geckodriver, or a Selenium grid).
pub struct WebDriverPage {
    client: WebDriverClient,
    session: Option<SessionId>,
    name: String,
}

impl WebDriverPage {
    /// Open a new browser session with `capabilities`.
    pub async fn start(client: WebDriverClient, capabilities: &Capabilities) -> PageResult<Self> {
        let session = client.new_session(capabilities).await.map_err(|e| map_error(e, ""))?;
        info!(
            session = %session,
            browser = %capabilities.browser,
            headless = capabilities.headless,
            "Started browser session"
        );
        Ok(Self {
            name: format!("webdriver:{}", capabilities.browser),
            client,
            session: Some(session),
        })
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    fn session(&self) -> PageResult<&SessionId> {
        self.session.as_ref().ok_or_else(|| {
            PageError::Driver("browser session already closed".into())
        })
    }
}

fn element_id(element: &ElementRef) -> ElementId {
    ElementId(element.id().to_string())
}

/// Keep missing and stale elements distinguishable for the pipeline.
fn map_error(err: WebDriverError, subject: &str) -> PageError {
    match err {
        WebDriverError::NoSuchElement { .. } => PageError::NoSuchElement {
            selector: subject.to_string(),
        },
        WebDriverError::StaleElement { .. } => PageError::StaleElement {
            element: subject.to_string(),
        },
        other => PageError::Driver(Box::new(other)),
    }
}

#[async_trait]
impl PageSession for WebDriverPage {
    async fn navigate(&mut self, url: &str) -> PageResult<()> {
        debug!(url = %url, "Navigating");
        let session = self.session()?;
        self.client.navigate(session, url).await.map_err(|e| map_error(e, url))
    }

    async fn current_url(&mut self) -> PageResult<String> {
        let session = self.session()?;
        self.client.current_url(session).await.map_err(|e| map_error(e, ""))
    }

    async fn find_all(
        &mut self,
        scope: Option<&ElementRef>,
        selector: &str,
    ) -> PageResult<Vec<ElementRef>> {
        let session = self.session()?;
        let found = match scope {
            Some(scope) => self
                .client
                .find_elements_from(session, &element_id(scope), selector)
                .await
                .map_err(|e| match e {
                    WebDriverError::StaleElement { .. } => map_error(e, scope.id()),
                    other => map_error(other, selector),
                })?,
            None => self
                .client
                .find_elements(session, selector)
                .await
                .map_err(|e| map_error(e, selector))?,
        };
        Ok(found.into_iter().map(|id| ElementRef::new(id.0)).collect())
    }

    async fn text(&mut self, element: &ElementRef) -> PageResult<String> {
        let session = self.session()?;
        self.client
            .element_text(session, &element_id(element))
            .await
            .map_err(|e| map_error(e, element.id()))
    }

    async fn text_content(&mut self, element: &ElementRef) -> PageResult<String> {
        let session = self.session()?;
        let value = self
            .client
            .element_property(session, &element_id(element), "textContent")
            .await
            .map_err(|e| map_error(e, element.id()))?;
        Ok(match value {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    async fn attribute(&mut self, element: &ElementRef, name: &str) -> PageResult<Option<String>> {
        let session = self.session()?;
        self.client
            .element_attribute(session, &element_id(element), name)
            .await
            .map_err(|e| map_error(e, element.id()))
    }

    async fn click(&mut self, element: &ElementRef) -> PageResult<()> {
        let session = self.session()?;
        self.client
            .element_click(session, &element_id(element))
            .await
            .map_err(|e| map_error(e, element.id()))
    }

    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> PageResult<()> {
        let session = self.session()?;
        self.client
            .element_send_keys(session, &element_id(element), text)
            .await
            .map_err(|e| map_error(e, element.id()))
    }

    /// Delete the browser session. Calling it again is a no-op.
    async fn quit(&mut self) -> PageResult<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        info!(session = %session, "Closing browser session");
        self.client.delete_session(&session).await.map_err(|e| map_error(e, ""))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
