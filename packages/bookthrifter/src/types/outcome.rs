//! Results of an extraction run, including why optional fields are unknown.

use std::fmt;

use crate::types::catalog::Book;

/// Outcome of reading one optional attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome<T> {
    /// The attribute was read and parsed
    Value(T),
    /// The page does not show the attribute
    Unknown,
    /// The attribute is present but could not be read or parsed
    Failed(String),
}

impl<T> FieldOutcome<T> {
    pub fn value(self) -> Option<T> {
        match self {
            FieldOutcome::Value(v) => Some(v),
            FieldOutcome::Unknown | FieldOutcome::Failed(_) => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, FieldOutcome::Value(_))
    }

    /// Chain a parse step onto a successfully read value.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> FieldOutcome<U>) -> FieldOutcome<U> {
        match self {
            FieldOutcome::Value(v) => f(v),
            FieldOutcome::Unknown => FieldOutcome::Unknown,
            FieldOutcome::Failed(reason) => FieldOutcome::Failed(reason),
        }
    }

    /// Failure reason; `None` for values and for plain unknowns.
    pub fn reason(&self) -> Option<&str> {
        match self {
            FieldOutcome::Failed(reason) => Some(reason),
            FieldOutcome::Value(_) | FieldOutcome::Unknown => None,
        }
    }

    /// Keep a value; otherwise try `fallback`, remembering the first failure
    /// reason if the fallback finds nothing either.
    pub fn or_else(self, fallback: impl FnOnce() -> FieldOutcome<T>) -> FieldOutcome<T> {
        match self {
            FieldOutcome::Value(v) => FieldOutcome::Value(v),
            FieldOutcome::Unknown => fallback(),
            FieldOutcome::Failed(reason) => match fallback() {
                FieldOutcome::Unknown => FieldOutcome::Failed(reason),
                other => other,
            },
        }
    }
}

/// An optional field that degraded to unknown, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub uid: u64,
    /// ISBN of the edition (0 when unknown)
    pub isbn: u64,
    /// Condition label, when the issue belongs to one condition
    pub condition: Option<String>,
    pub field: &'static str,
    /// `None` when the page simply does not show the field
    pub reason: Option<String>,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "book {} isbn {}", self.uid, self.isbn)?;
        if let Some(condition) = &self.condition {
            write!(f, " [{}]", condition)?;
        }
        match &self.reason {
            Some(reason) => write!(f, ": {} failed: {}", self.field, reason),
            None => write!(f, ": {} unknown", self.field),
        }
    }
}

/// A wish-list entry that could not be extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// Detail link, or the wish-list URL when the link itself was unreadable
    pub url: String,
    pub reason: String,
}

/// Everything one extraction run produced.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    /// Books in wish-list order
    pub books: Vec<Book>,
    pub skipped: Vec<SkippedEntry>,
    pub field_issues: Vec<FieldIssue>,
}

impl ExtractionOutcome {
    pub fn edition_count(&self) -> usize {
        self.books.iter().map(|b| b.editions.len()).sum()
    }

    pub fn condition_count(&self) -> usize {
        self.books.iter().map(Book::condition_count).sum()
    }

    /// Issues recorded for one field name, e.g. `"available"`.
    pub fn issues_for(&self, field: &str) -> impl Iterator<Item = &FieldIssue> {
        let field = field.to_string();
        self.field_issues.iter().filter(move |i| i.field == field)
    }
}
