use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Key under which W3C WebDriver returns element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Special key codes for `element_send_keys`.
pub mod keys {
    pub const ENTER: &str = "\u{E007}";
}

/// Identifier of a live browser session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque element reference, valid only until the page navigates away.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "WireElement", into = "WireElement")]
pub struct ElementId(pub String);

/// Wire form of an element reference: `{"element-6066-...": "<id>"}`.
#[derive(Serialize, Deserialize)]
struct WireElement {
    #[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
    id: String,
}

impl From<WireElement> for ElementId {
    fn from(wire: WireElement) -> Self {
        ElementId(wire.id)
    }
}

impl From<ElementId> for WireElement {
    fn from(element: ElementId) -> Self {
        WireElement { id: element.0 }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Browsers the client knows how to request capabilities for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Browser::Chrome),
            "firefox" | "gecko" => Ok(Browser::Firefox),
            other => Err(format!("unsupported browser: {}", other)),
        }
    }
}

/// Capabilities sent with a new-session request.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub browser: Browser,
    pub headless: bool,
    pub args: Vec<String>,
}

impl Capabilities {
    pub fn new(browser: Browser) -> Self {
        Self {
            browser,
            headless: true,
            args: Vec::new(),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Render the `{"capabilities": {"alwaysMatch": ...}}` request body.
    pub fn to_request_body(&self) -> Value {
        let mut args = self.args.clone();
        let (options_key, headless_arg) = match self.browser {
            Browser::Chrome => ("goog:chromeOptions", "--headless=new"),
            Browser::Firefox => ("moz:firefoxOptions", "-headless"),
        };
        if self.headless {
            args.push(headless_arg.to_string());
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": self.browser.as_str(),
                    options_key: { "args": args },
                }
            }
        })
    }
}

/// Envelope every WebDriver response is wrapped in.
#[derive(Debug, Clone, Deserialize)]
pub struct WireResponse<T> {
    pub value: T,
}

/// `value` of a successful new-session response.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSessionValue {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub capabilities: Value,
}

/// `value` of an error response.
#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// Body of a find-element(s) request.
#[derive(Debug, Clone, Serialize)]
pub struct Locator<'a> {
    pub using: &'a str,
    pub value: &'a str,
}

impl<'a> Locator<'a> {
    pub fn css(selector: &'a str) -> Self {
        Self {
            using: "css selector",
            value: selector,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_is_w3c_key_code() {
        assert_eq!(keys::ENTER, "\u{E007}");
        assert_eq!(keys::ENTER.chars().count(), 1);
    }

    #[test]
    fn test_chrome_headless_capabilities() {
        let body = Capabilities::new(Browser::Chrome).to_request_body();
        let always = &body["capabilities"]["alwaysMatch"];
        assert_eq!(always["browserName"], "chrome");
        assert_eq!(always["goog:chromeOptions"]["args"][0], "--headless=new");
    }

    #[test]
    fn test_firefox_headed_capabilities() {
        let body = Capabilities::new(Browser::Firefox)
            .headless(false)
            .with_arg("-private")
            .to_request_body();
        let args = &body["capabilities"]["alwaysMatch"]["moz:firefoxOptions"]["args"];
        assert_eq!(args.as_array().map(Vec::len), Some(1));
        assert_eq!(args[0], "-private");
    }

    #[test]
    fn test_browser_from_str() {
        assert_eq!("Chrome".parse::<Browser>(), Ok(Browser::Chrome));
        assert_eq!("firefox".parse::<Browser>(), Ok(Browser::Firefox));
        assert!("safari".parse::<Browser>().is_err());
    }

    #[test]
    fn test_element_id_wire_shape() {
        let raw = format!(r#"[{{"{}": "abc-1"}}]"#, ELEMENT_KEY);
        let ids: Vec<ElementId> = serde_json::from_str(&raw).unwrap();
        assert_eq!(ids, vec![ElementId("abc-1".into())]);
    }
}
