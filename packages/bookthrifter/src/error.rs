//! Typed errors for the bookthrifter library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell a
//! fatal navigation timeout from an entity that merely failed validation.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while extracting the catalog.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A structural page anchor never appeared. Fatal to the run.
    #[error("timed out after {timeout:?} waiting for `{selector}` on {url}")]
    NavigationTimeout {
        url: String,
        selector: String,
        timeout: Duration,
    },

    /// A required element of one entity was absent. Aborts that entity.
    #[error("missing required element `{selector}` on {url}")]
    MissingElement { url: String, selector: String },

    /// Malformed identifier or field. Aborts that entity.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Page automation failed for a reason other than a missing element
    #[error("page error: {0}")]
    Page(#[from] PageError),

    /// Ledger or snapshot could not be read or written
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl ExtractionError {
    /// Whether this error ends the whole run rather than one entity.
    pub fn is_fatal(&self) -> bool {
        match self {
            ExtractionError::NavigationTimeout { .. } | ExtractionError::Persistence(_) => true,
            ExtractionError::Page(err) => !err.is_entity_level(),
            ExtractionError::MissingElement { .. } | ExtractionError::Validation(_) => false,
        }
    }
}

/// Errors raised while constructing or reconstructing catalog entities.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The unique key is not a usable identifier
    #[error("invalid identifier for `{field}`: {value}")]
    InvalidIdentifier { field: &'static str, value: String },

    /// A required field is absent
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    /// A field is present but has the wrong shape
    #[error("invalid value for `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// A value of one entity kind was supplied where another was required
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors from the page-automation layer.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("no element matches `{selector}`")]
    NoSuchElement { selector: String },

    /// The element handle belongs to a page that has since been navigated away from
    #[error("stale element reference: {element}")]
    StaleElement { element: String },

    #[error("timed out after {timeout:?} waiting for `{selector}`")]
    Timeout { selector: String, timeout: Duration },

    #[error("driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PageError {
    /// Missing or stale elements are local to the entity being read.
    pub fn is_entity_level(&self) -> bool {
        matches!(
            self,
            PageError::NoSuchElement { .. } | PageError::StaleElement { .. }
        )
    }
}

/// Errors reading or writing the ledger and snapshot files.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A stored ledger pair or snapshot entity violates the data model
    #[error("invalid record `{key}` in {path}: {reason}")]
    InvalidRecord {
        path: PathBuf,
        key: String,
        reason: String,
    },

    #[error("could not lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PersistenceError::Json {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for page-automation operations.
pub type PageResult<T> = std::result::Result<T, PageError>;

/// Result type alias for catalog construction.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Result type alias for ledger and snapshot persistence.
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;
