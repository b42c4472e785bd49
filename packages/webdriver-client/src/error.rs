use thiserror::Error;

/// Errors returned by the WebDriver client.
#[derive(Debug, Error)]
pub enum WebDriverError {
    /// Transport-level failure talking to the WebDriver server
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// `no such element`: the selector matched nothing
    #[error("no such element: {message}")]
    NoSuchElement { message: String },

    /// `stale element reference`: the element belongs to a page that is gone
    #[error("stale element reference: {message}")]
    StaleElement { message: String },

    /// `invalid session id`: the browser session no longer exists
    #[error("invalid session: {message}")]
    InvalidSession { message: String },

    /// Any other error reported by the server
    #[error("WebDriver error {status} ({error}): {message}")]
    Api {
        status: u16,
        error: String,
        message: String,
    },
}

impl WebDriverError {
    /// Map a W3C error code (the `error` field of an error body) to a variant.
    pub fn from_wire(status: u16, error: String, message: String) -> Self {
        match error.as_str() {
            "no such element" => Self::NoSuchElement { message },
            "stale element reference" => Self::StaleElement { message },
            "invalid session id" => Self::InvalidSession { message },
            _ => Self::Api {
                status,
                error,
                message,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, WebDriverError>;
