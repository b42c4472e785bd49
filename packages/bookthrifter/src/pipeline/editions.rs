//! Stage 3: editions and their selectable conditions.
//!
//! Edition details are read generically: every detail row is split on its
//! first colon into a normalized key and a value, so reordered or added rows
//! do not break extraction. Per-condition attributes other than the thrift
//! price are best-effort and degrade to a [`FieldOutcome`].

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::pipeline::wait_for_anchor;
use crate::traits::page::{ElementRef, PageSession};
use crate::types::{
    catalog::{parse_price, Availability, Book, Condition, Edition},
    config::{AgentConfig, SiteLayout},
    outcome::{FieldIssue, FieldOutcome},
};

/// Editions read from one all-editions page.
#[derive(Debug, Clone, Default)]
pub struct EditionsPage {
    pub editions: Vec<Edition>,
    pub issues: Vec<FieldIssue>,
}

/// Raw per-condition reading before the required price is checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionReading {
    pub name: String,
    pub thrift_price: FieldOutcome<f64>,
    pub available: FieldOutcome<Availability>,
    pub list_price: FieldOutcome<f64>,
}

/// Read every edition of `book`, in page order.
///
/// Fails with `NavigationTimeout` when the editions header never appears.
/// Edition blocks without a condition control are skipped.
pub async fn extract_editions<P: PageSession + ?Sized>(
    session: &mut P,
    config: &AgentConfig,
    book: &Book,
) -> Result<EditionsPage> {
    let layout = &config.layout;
    let url = book.editions_url(&layout.editions_suffix);
    debug!(uid = book.uid, url = %url, "Visiting editions page");

    session.navigate(&url).await?;
    wait_for_anchor(session, config, &url, &layout.editions_header).await?;

    let mut page = EditionsPage::default();
    let blocks = session.find_all(None, &layout.edition_block).await?;

    for block in blocks {
        let details = read_details(session, layout, &block).await?;

        let select = session.find_optional(Some(&block), &layout.condition_select).await?;
        let Some(select) = select else {
            debug!(
                uid = book.uid,
                isbn = ?details.get("isbn"),
                "Edition has no condition control, skipping"
            );
            continue;
        };

        let mut edition = edition_from_details(&details, book.uid, &mut page.issues);
        let options = session.find_all(Some(&select), &layout.condition_option).await?;

        for option in options {
            let reading = read_condition(session, layout, &block, &option).await?;
            if let Some(condition) =
                accept_reading(reading, book.uid, edition.isbn, &mut page.issues)
            {
                edition.conditions.push(condition);
            }
        }

        page.editions.push(edition);
    }

    Ok(page)
}

/// Split a detail row on its first colon into a normalized `(key, value)`.
///
/// The key is trimmed, lower-cased and has spaces replaced by underscores;
/// the value is trimmed. Rows without a colon or without a key yield `None`.
pub fn parse_detail_row(text: &str) -> Option<(String, String)> {
    let (key, value) = text.split_once(':')?;
    let key = key.trim().to_lowercase().replace(' ', "_");
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim().to_string()))
}

/// Condition label from option text such as "Good $5.89".
pub fn condition_label(option_text: &str) -> String {
    option_text
        .split(" $")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Primary quantity format: the count is the first word, e.g. "3 Available".
pub fn parse_quantity_count(text: &str) -> FieldOutcome<Availability> {
    match text.split_whitespace().next() {
        None => FieldOutcome::Unknown,
        Some(first) => match first.parse::<u32>() {
            Ok(count) => FieldOutcome::Value(Availability::Count(count)),
            Err(_) => FieldOutcome::Failed(format!("unexpected quantity text: {:?}", text.trim())),
        },
    }
}

/// Fallback quantity format: a low-stock notice such as "Hurry, only 2 left!".
/// Any number in it is the count; otherwise the notice itself is kept.
pub fn parse_quantity_notice(text: &str) -> FieldOutcome<Availability> {
    let text = text.trim();
    if text.is_empty() {
        return FieldOutcome::Unknown;
    }
    let count = text
        .split_whitespace()
        .find_map(|word| word.trim_matches(|c: char| !c.is_ascii_digit()).parse::<u32>().ok());
    match count {
        Some(count) => FieldOutcome::Value(Availability::Count(count)),
        None => FieldOutcome::Value(Availability::Note(text.to_string())),
    }
}

fn parse_price_field(text: String) -> FieldOutcome<f64> {
    match parse_price(&text) {
        Some(price) => FieldOutcome::Value(price),
        None => FieldOutcome::Failed(format!("unparseable price: {:?}", text.trim())),
    }
}

fn parse_isbn(details: &HashMap<String, String>, key: &'static str) -> FieldOutcome<u64> {
    let Some(raw) = details.get(key) else {
        return FieldOutcome::Unknown;
    };
    let digits: String = raw.chars().filter(|c| !matches!(c, '-' | ' ')).collect();
    match digits.parse::<u64>() {
        Ok(isbn) => FieldOutcome::Value(isbn),
        Err(_) => FieldOutcome::Failed(format!("not numeric: {:?}", raw)),
    }
}

fn edition_from_details(
    details: &HashMap<String, String>,
    uid: u64,
    issues: &mut Vec<FieldIssue>,
) -> Edition {
    let isbn = parse_isbn(details, "isbn");
    let isbn13 = parse_isbn(details, "isbn13");
    let isbn_value = isbn.clone().value().unwrap_or(0);

    for (field, outcome) in [("isbn", &isbn), ("isbn13", &isbn13)] {
        if !outcome.is_value() {
            issues.push(FieldIssue {
                uid,
                isbn: isbn_value,
                condition: None,
                field,
                reason: outcome.reason().map(str::to_string),
            });
        }
    }

    Edition {
        isbn: isbn_value,
        form: details.get("format").cloned(),
        isbn13: isbn13.value().unwrap_or(0),
        pub_date: details.get("release_date").cloned(),
        language: details.get("language").cloned(),
        publisher: details.get("publisher").cloned(),
        conditions: Vec::new(),
    }
}

async fn read_details<P: PageSession + ?Sized>(
    session: &mut P,
    layout: &SiteLayout,
    block: &ElementRef,
) -> Result<HashMap<String, String>> {
    let rows = session.find_all(Some(block), &layout.edition_detail_row).await?;
    let mut details = HashMap::with_capacity(rows.len());
    for row in &rows {
        let text = session.text_content(row).await?;
        if let Some((key, value)) = parse_detail_row(&text) {
            details.insert(key, value);
        }
    }
    Ok(details)
}

/// Select one condition option and read its attributes.
///
/// Only selecting the option can fail the reading; every attribute read
/// afterwards degrades independently.
async fn read_condition<P: PageSession + ?Sized>(
    session: &mut P,
    layout: &SiteLayout,
    block: &ElementRef,
    option: &ElementRef,
) -> Result<ConditionReading> {
    let name = condition_label(&session.text(option).await?);
    session.click(option).await?;

    let thrift_price = read_optional_text(session, block, &layout.thrift_price)
        .await
        .and_then(parse_price_field);

    let primary = read_optional_text(session, block, &layout.quantity_primary)
        .await
        .and_then(|text| parse_quantity_count(&text));
    let available = if primary.is_value() {
        primary
    } else {
        let fallback = read_optional_text(session, block, &layout.quantity_fallback)
            .await
            .and_then(|text| parse_quantity_notice(&text));
        primary.or_else(|| fallback)
    };

    let list_price = read_optional_text(session, block, &layout.list_price)
        .await
        .and_then(parse_price_field);

    Ok(ConditionReading {
        name,
        thrift_price,
        available,
        list_price,
    })
}

async fn read_optional_text<P: PageSession + ?Sized>(
    session: &mut P,
    scope: &ElementRef,
    selector: &str,
) -> FieldOutcome<String> {
    match session.find_optional(Some(scope), selector).await {
        Ok(Some(element)) => match session.text(&element).await {
            Ok(text) => FieldOutcome::Value(text),
            Err(err) => FieldOutcome::Failed(err.to_string()),
        },
        Ok(None) => FieldOutcome::Unknown,
        Err(err) => FieldOutcome::Failed(err.to_string()),
    }
}

/// Build the condition when the thrift price was read; record every
/// attribute that degraded.
fn accept_reading(
    reading: ConditionReading,
    uid: u64,
    isbn: u64,
    issues: &mut Vec<FieldIssue>,
) -> Option<Condition> {
    let mut issue = |field: &'static str, reason: Option<&str>| {
        issues.push(FieldIssue {
            uid,
            isbn,
            condition: Some(reading.name.clone()),
            field,
            reason: reason.map(str::to_string),
        });
    };

    if !reading.available.is_value() {
        issue("available", reading.available.reason());
    }
    if !reading.list_price.is_value() {
        issue("list_price", reading.list_price.reason());
    }

    let Some(thrift_price) = reading.thrift_price.clone().value() else {
        warn!(
            uid,
            isbn,
            condition = %reading.name,
            reason = ?reading.thrift_price.reason(),
            "Dropping condition without a thrift price"
        );
        issue("thrift_price", reading.thrift_price.reason());
        return None;
    };

    Some(Condition {
        name: reading.name,
        thrift_price,
        available: reading.available.value(),
        list_price: reading.list_price.value(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detail_row_splits_on_first_colon() {
        assert_eq!(
            parse_detail_row("  Release Date: 08/15/1990 "),
            Some(("release_date".to_string(), "08/15/1990".to_string()))
        );
        assert_eq!(
            parse_detail_row("Edition: Deluxe: Annotated"),
            Some(("edition".to_string(), "Deluxe: Annotated".to_string()))
        );
        assert_eq!(parse_detail_row(""), None);
        assert_eq!(parse_detail_row("no colon here"), None);
        assert_eq!(parse_detail_row(": orphan"), None);
    }

    #[test]
    fn test_condition_label() {
        assert_eq!(condition_label("Good $5.89"), "Good");
        assert_eq!(condition_label("Like New"), "Like New");
    }

    #[test]
    fn test_parse_quantity_count() {
        assert_eq!(
            parse_quantity_count("3 Available"),
            FieldOutcome::Value(Availability::Count(3))
        );
        assert!(matches!(parse_quantity_count("Few left"), FieldOutcome::Failed(_)));
        assert_eq!(parse_quantity_count("   "), FieldOutcome::Unknown);
    }

    #[test]
    fn test_parse_quantity_notice() {
        assert_eq!(
            parse_quantity_notice("Hurry, only 2 left!"),
            FieldOutcome::Value(Availability::Count(2))
        );
        assert_eq!(
            parse_quantity_notice("Low stock"),
            FieldOutcome::Value(Availability::Note("Low stock".into()))
        );
    }

    #[test]
    fn test_missing_isbns_default_to_zero() {
        let mut issues = Vec::new();
        let details = HashMap::from([("format".to_string(), "Paperback".to_string())]);
        let edition = edition_from_details(&details, 9, &mut issues);

        assert_eq!(edition.isbn, 0);
        assert_eq!(edition.isbn13, 0);
        assert_eq!(edition.form.as_deref(), Some("Paperback"));
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.reason.is_none()));
    }

    #[test]
    fn test_isbn10_with_check_letter_fails_softly() {
        let mut issues = Vec::new();
        let details = HashMap::from([
            ("isbn".to_string(), "080442957X".to_string()),
            ("isbn13".to_string(), "978-0804429573".to_string()),
        ]);
        let edition = edition_from_details(&details, 9, &mut issues);

        assert_eq!(edition.isbn, 0);
        assert_eq!(edition.isbn13, 9780804429573);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "isbn");
        assert!(issues[0].reason.is_some());
    }

    #[test]
    fn test_reading_without_price_is_dropped() {
        let mut issues = Vec::new();
        let reading = ConditionReading {
            name: "Good".into(),
            thrift_price: FieldOutcome::Unknown,
            available: FieldOutcome::Value(Availability::Count(1)),
            list_price: FieldOutcome::Value(9.0),
        };
        assert!(accept_reading(reading, 1, 111, &mut issues).is_none());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "thrift_price");
    }

    #[test]
    fn test_reading_with_degraded_fields_is_kept() {
        let mut issues = Vec::new();
        let reading = ConditionReading {
            name: "Acceptable".into(),
            thrift_price: FieldOutcome::Value(4.49),
            available: FieldOutcome::Failed("stale element reference: 2:14".into()),
            list_price: FieldOutcome::Unknown,
        };
        let condition = accept_reading(reading, 1, 111, &mut issues).unwrap();

        assert_eq!(condition, Condition::new("Acceptable", 4.49).unwrap());
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field, "available");
        assert!(issues[0].reason.as_deref().unwrap().contains("stale"));
        assert_eq!(issues[1].reason, None);
    }
}
