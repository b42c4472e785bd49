//! Pure W3C WebDriver REST client.
//!
//! A minimal client for a WebDriver server (chromedriver, geckodriver,
//! Selenium). Supports session lifecycle, navigation, CSS element lookup and
//! the handful of element interactions a scraper needs.
//!
//! # Example
//!
//! ```rust,ignore
//! use webdriver_client::{Browser, Capabilities, WebDriverClient};
//!
//! let client = WebDriverClient::new("http://localhost:4444");
//! let session = client.new_session(&Capabilities::new(Browser::Chrome)).await?;
//! client.navigate(&session, "https://example.com").await?;
//! let headings = client.find_elements(&session, "h1").await?;
//! client.delete_session(&session).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{Result, WebDriverError};
pub use types::{keys, Browser, Capabilities, ElementId, SessionId};

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use types::{Locator, NewSessionValue, WireError, WireResponse};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:4444";

#[derive(Clone)]
pub struct WebDriverClient {
    client: reqwest::Client,
    base_url: String,
}

impl WebDriverClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a browser session.
    pub async fn new_session(&self, capabilities: &Capabilities) -> Result<SessionId> {
        let url = format!("{}/session", self.base_url);
        let value: NewSessionValue = self
            .send(self.client.post(&url).json(&capabilities.to_request_body()))
            .await?;

        tracing::debug!(
            session_id = %value.session_id,
            browser = %capabilities.browser,
            "WebDriver session started"
        );
        Ok(SessionId(value.session_id))
    }

    /// End a browser session, closing every window it owns.
    pub async fn delete_session(&self, session: &SessionId) -> Result<()> {
        let url = format!("{}/session/{}", self.base_url, session);
        let _: Value = self.send(self.client.delete(&url)).await?;
        tracing::debug!(session_id = %session, "WebDriver session deleted");
        Ok(())
    }

    /// Navigate the session's current window. Returns once the page has loaded.
    pub async fn navigate(&self, session: &SessionId, target: &str) -> Result<()> {
        let url = format!("{}/session/{}/url", self.base_url, session);
        let _: Value = self
            .send(self.client.post(&url).json(&json!({ "url": target })))
            .await?;
        Ok(())
    }

    pub async fn current_url(&self, session: &SessionId) -> Result<String> {
        let url = format!("{}/session/{}/url", self.base_url, session);
        self.send(self.client.get(&url)).await
    }

    /// All elements in the document matching a CSS selector.
    pub async fn find_elements(
        &self,
        session: &SessionId,
        selector: &str,
    ) -> Result<Vec<ElementId>> {
        let url = format!("{}/session/{}/elements", self.base_url, session);
        self.send(self.client.post(&url).json(&Locator::css(selector)))
            .await
    }

    /// All descendants of `element` matching a CSS selector.
    pub async fn find_elements_from(
        &self,
        session: &SessionId,
        element: &ElementId,
        selector: &str,
    ) -> Result<Vec<ElementId>> {
        let url = format!(
            "{}/session/{}/element/{}/elements",
            self.base_url, session, element
        );
        self.send(self.client.post(&url).json(&Locator::css(selector)))
            .await
    }

    /// Rendered (visible) text of an element.
    pub async fn element_text(&self, session: &SessionId, element: &ElementId) -> Result<String> {
        let url = format!(
            "{}/session/{}/element/{}/text",
            self.base_url, session, element
        );
        self.send(self.client.get(&url)).await
    }

    pub async fn element_attribute(
        &self,
        session: &SessionId,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>> {
        let url = format!(
            "{}/session/{}/element/{}/attribute/{}",
            self.base_url, session, element, name
        );
        self.send(self.client.get(&url)).await
    }

    /// DOM property of an element, e.g. `textContent` (includes hidden text).
    pub async fn element_property(
        &self,
        session: &SessionId,
        element: &ElementId,
        name: &str,
    ) -> Result<Value> {
        let url = format!(
            "{}/session/{}/element/{}/property/{}",
            self.base_url, session, element, name
        );
        self.send(self.client.get(&url)).await
    }

    pub async fn element_click(&self, session: &SessionId, element: &ElementId) -> Result<()> {
        let url = format!(
            "{}/session/{}/element/{}/click",
            self.base_url, session, element
        );
        let _: Value = self.send(self.client.post(&url).json(&json!({}))).await?;
        Ok(())
    }

    pub async fn element_send_keys(
        &self,
        session: &SessionId,
        element: &ElementId,
        text: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/session/{}/element/{}/value",
            self.base_url, session, element
        );
        let _: Value = self
            .send(self.client.post(&url).json(&json!({ "text": text })))
            .await?;
        Ok(())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        decode_response(status, &body)
    }
}

/// Decode a WebDriver response body, turning error bodies into typed errors.
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    if (200..300).contains(&status) {
        let resp: WireResponse<T> = serde_json::from_str(body)?;
        return Ok(resp.value);
    }

    match serde_json::from_str::<WireResponse<WireError>>(body) {
        Ok(resp) => Err(WebDriverError::from_wire(
            status,
            resp.value.error,
            resp.value.message,
        )),
        Err(_) => Err(WebDriverError::Api {
            status,
            error: "unknown error".to_string(),
            message: body.to_string(),
        }),
    }
}
