//! Catalog model: Book → Edition → Condition.
//!
//! The plain-data form (`to_value`) carries a `"type"` tag on every object.
//! Snapshots written before the tag existed are still readable: untagged
//! objects are classified by shape (see [`EntityKind::of`]).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use crate::error::{ValidationError, ValidationResult};

/// Name of the discriminator field written by `to_value`.
pub const TYPE_TAG: &str = "type";

/// The three entity kinds of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Book,
    Edition,
    Condition,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Book => "book",
            EntityKind::Edition => "edition",
            EntityKind::Condition => "condition",
        }
    }

    /// Classify a plain-data object.
    ///
    /// An explicit `"type"` tag wins. Without one, the legacy shape rules
    /// apply in this order: an `isbn` field makes an Edition, a `name` field
    /// (the condition label) makes a Condition, anything else is a Book.
    /// Returns `None` for non-objects and unrecognized tags.
    pub fn of(value: &Value) -> Option<EntityKind> {
        let object = value.as_object()?;
        match object.get(TYPE_TAG) {
            Some(Value::String(tag)) => match tag.as_str() {
                "book" => Some(EntityKind::Book),
                "edition" => Some(EntityKind::Edition),
                "condition" => Some(EntityKind::Condition),
                _ => None,
            },
            Some(_) => None,
            None if object.contains_key("isbn") => Some(EntityKind::Edition),
            None if object.contains_key("name") => Some(EntityKind::Condition),
            None => Some(EntityKind::Book),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock indicator: a count, or descriptive text such as "low-stock".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Availability {
    Count(u32),
    Note(String),
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Count(n) => write!(f, "{}", n),
            Availability::Note(note) => f.write_str(note),
        }
    }
}

/// A purchasable grade of one edition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Grade label, e.g. "Good"
    pub name: String,

    /// Current sale price; the field of record for the ledger
    #[serde(deserialize_with = "de_price")]
    pub thrift_price: f64,

    #[serde(default)]
    pub available: Option<Availability>,

    /// Struck-through list price, when the page advertises a markdown
    #[serde(default, deserialize_with = "de_opt_price")]
    pub list_price: Option<f64>,
}

impl Condition {
    /// Fails with `InvalidField` when the price is NaN or infinite.
    pub fn new(name: impl Into<String>, thrift_price: f64) -> ValidationResult<Self> {
        Ok(Self {
            name: name.into(),
            thrift_price: finite_price("thrift_price", thrift_price)?,
            available: None,
            list_price: None,
        })
    }

    pub fn with_available(mut self, available: Availability) -> Self {
        self.available = Some(available);
        self
    }

    pub fn with_list_price(mut self, list_price: f64) -> ValidationResult<Self> {
        self.list_price = Some(finite_price("list_price", list_price)?);
        Ok(self)
    }

    pub fn to_value(&self) -> Value {
        json!({
            TYPE_TAG: EntityKind::Condition.as_str(),
            "name": self.name,
            "thrift_price": self.thrift_price,
            "available": self.available,
            "list_price": self.list_price,
        })
    }

    pub fn from_value(value: Value) -> ValidationResult<Self> {
        let map = into_entity_map(value, EntityKind::Condition)?;
        deserialize_fields(map, EntityKind::Condition)
    }
}

/// A published form of a book. ISBNs use 0 as the "unknown" sentinel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Edition {
    #[serde(default)]
    pub isbn: u64,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub isbn13: u64,
    #[serde(default)]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Edition {
    pub fn new(isbn: u64, isbn13: u64) -> Self {
        Self {
            isbn,
            isbn13,
            ..Default::default()
        }
    }

    pub fn with_form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }

    pub fn with_pub_date(mut self, pub_date: impl Into<String>) -> Self {
        self.pub_date = Some(pub_date.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Ledger key for this edition: the decimal ISBN, `"0"` when unknown.
    pub fn ledger_key(&self) -> String {
        self.isbn.to_string()
    }

    pub fn to_value(&self) -> Value {
        json!({
            TYPE_TAG: EntityKind::Edition.as_str(),
            "isbn": self.isbn,
            "form": self.form,
            "isbn13": self.isbn13,
            "pub_date": self.pub_date,
            "language": self.language,
            "publisher": self.publisher,
            "conditions": self.conditions.iter().map(Condition::to_value).collect::<Vec<_>>(),
        })
    }

    pub fn from_value(value: Value) -> ValidationResult<Self> {
        let mut map = into_entity_map(value, EntityKind::Edition)?;
        let conditions = take_children(&mut map, "conditions", Condition::from_value)?;
        let mut edition: Edition = deserialize_fields(map, EntityKind::Edition)?;
        edition.conditions = conditions;
        Ok(edition)
    }
}

/// One wish-list entry with the editions discovered for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Stable catalog key
    pub uid: u64,
    pub title: String,
    /// Display string, multiple authors joined with ", "
    pub author: String,
    pub url: String,
    #[serde(default)]
    pub editions: Vec<Edition>,
}

impl Book {
    pub fn new(
        uid: u64,
        title: impl Into<String>,
        author: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            uid,
            title: title.into(),
            author: author.into(),
            url: url.into(),
            editions: Vec::new(),
        }
    }

    /// Build a book whose identifier is the last path segment of `url`.
    pub fn from_url(
        url: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> ValidationResult<Self> {
        let url = url.into();
        let uid = uid_from_url(&url)?;
        Ok(Self::new(uid, title, author, url))
    }

    pub fn add_edition(&mut self, edition: Edition) {
        self.editions.push(edition);
    }

    pub fn with_edition(mut self, edition: Edition) -> Self {
        self.add_edition(edition);
        self
    }

    /// Book URL with the fragment and trailing slash removed, then `suffix` appended.
    pub fn editions_url(&self, suffix: &str) -> String {
        let base = self.url.split('#').next().unwrap_or_default();
        format!("{}/{}", base.trim_end_matches('/'), suffix.trim_start_matches('/'))
    }

    pub fn condition_count(&self) -> usize {
        self.editions.iter().map(|e| e.conditions.len()).sum()
    }

    pub fn to_value(&self) -> Value {
        json!({
            TYPE_TAG: EntityKind::Book.as_str(),
            "uid": self.uid,
            "title": self.title,
            "author": self.author,
            "url": self.url,
            "editions": self.editions.iter().map(Edition::to_value).collect::<Vec<_>>(),
        })
    }

    pub fn from_value(value: Value) -> ValidationResult<Self> {
        let mut map = into_entity_map(value, EntityKind::Book)?;
        let uid = match map.get("uid") {
            None | Some(Value::Null) => return Err(ValidationError::MissingField { field: "uid" }),
            Some(Value::Number(n)) => n.as_u64().ok_or_else(|| ValidationError::InvalidIdentifier {
                field: "uid",
                value: n.to_string(),
            })?,
            Some(Value::String(s)) => parse_uid(s)?,
            Some(other) => {
                return Err(ValidationError::InvalidIdentifier {
                    field: "uid",
                    value: other.to_string(),
                })
            }
        };
        map.insert("uid".to_string(), Value::from(uid));

        let editions = take_children(&mut map, "editions", Edition::from_value)?;
        let mut book: Book = deserialize_fields(map, EntityKind::Book)?;
        book.editions = editions;
        Ok(book)
    }
}

/// Serialize a whole catalog as a JSON array of tagged books.
pub fn catalog_to_value(books: &[Book]) -> Value {
    Value::Array(books.iter().map(Book::to_value).collect())
}

/// Reconstruct a catalog from a JSON array of (tagged or legacy) books.
pub fn catalog_from_value(value: Value) -> ValidationResult<Vec<Book>> {
    match value {
        Value::Array(items) => items.into_iter().map(Book::from_value).collect(),
        other => Err(ValidationError::InvalidField {
            field: "catalog",
            reason: format!("expected an array of books, found {}", json_type_name(&other)),
        }),
    }
}

/// Parse a catalog identifier.
pub fn parse_uid(raw: &str) -> ValidationResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ValidationError::InvalidIdentifier {
            field: "uid",
            value: raw.to_string(),
        })
}

/// Identifier from the last non-empty path segment of a detail URL,
/// e.g. `https://host/w/dune_frank-herbert/250099/#edition=1` → 250099.
pub fn uid_from_url(raw: &str) -> ValidationResult<u64> {
    let parsed = url::Url::parse(raw).map_err(|_| ValidationError::InvalidIdentifier {
        field: "url",
        value: raw.to_string(),
    })?;
    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| ValidationError::InvalidIdentifier {
            field: "uid",
            value: raw.to_string(),
        })?;
    parse_uid(segment)
}

/// First price in `text`, ignoring currency symbols and thousands separators.
pub fn parse_price(text: &str) -> Option<f64> {
    let mut start = text.find(|c: char| c.is_ascii_digit())?;
    if start > 0 && text[..start].ends_with('.') {
        start -= 1;
    }
    let number: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    number
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
}

/// JSON has no encoding for NaN or infinity.
fn finite_price(field: &'static str, price: f64) -> ValidationResult<f64> {
    if price.is_finite() {
        Ok(price)
    } else {
        Err(ValidationError::InvalidField {
            field,
            reason: format!("price must be finite, got {price}"),
        })
    }
}

fn into_entity_map(value: Value, expected: EntityKind) -> ValidationResult<Map<String, Value>> {
    match EntityKind::of(&value) {
        Some(kind) if kind == expected => {}
        Some(kind) => {
            return Err(ValidationError::TypeMismatch {
                expected: expected.as_str(),
                found: kind.as_str(),
            })
        }
        None => {
            return Err(ValidationError::TypeMismatch {
                expected: expected.as_str(),
                found: json_type_name(&value),
            })
        }
    }

    match value {
        Value::Object(mut map) => {
            map.remove(TYPE_TAG);
            Ok(map)
        }
        _ => Err(ValidationError::TypeMismatch {
            expected: expected.as_str(),
            found: json_type_name(&value),
        }),
    }
}

fn take_children<T>(
    map: &mut Map<String, Value>,
    field: &'static str,
    parse: impl Fn(Value) -> ValidationResult<T>,
) -> ValidationResult<Vec<T>> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.into_iter().map(parse).collect(),
        Some(other) => Err(ValidationError::InvalidField {
            field,
            reason: format!("expected an array, found {}", json_type_name(&other)),
        }),
    }
}

fn deserialize_fields<T: serde::de::DeserializeOwned>(
    map: Map<String, Value>,
    kind: EntityKind,
) -> ValidationResult<T> {
    serde_json::from_value(Value::Object(map)).map_err(|e| ValidationError::InvalidField {
        field: kind.as_str(),
        reason: e.to_string(),
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "unrecognized object",
    }
}

/// Prices written by older snapshots may be strings such as "$12.50".
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

impl RawPrice {
    fn into_price<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            RawPrice::Number(n) => Ok(n),
            RawPrice::Text(text) => {
                parse_price(&text).ok_or_else(|| E::custom(format!("unparseable price: {text:?}")))
            }
        }
    }
}

fn de_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    RawPrice::deserialize(deserializer)?.into_price()
}

fn de_opt_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<RawPrice>::deserialize(deserializer)? {
        Some(raw) => raw.into_price().map(Some),
        None => Ok(None),
    }
}
