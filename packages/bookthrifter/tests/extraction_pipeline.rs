//! Integration tests for the extraction pipeline against scripted pages.
//!
//! Every page is built from the default site layout's selectors, so these
//! tests also pin down which selectors each stage relies on.

use std::time::Duration;

use bookthrifter::{
    login,
    testing::{ClickEffect, MockElement, MockPage, MockPageCall},
    traits::page::keys,
    AgentConfig, Availability, Condition, Credentials, ExtractionAgent, ExtractionError, SiteLayout,
};

const DUNE_URL: &str = "https://www.thriftbooks.com/w/dune_frank-herbert/250099/";
const EMMA_URL: &str = "https://www.thriftbooks.com/w/emma_jane-austen/246742/#edition=2389711";

fn config() -> AgentConfig {
    AgentConfig::default()
        .with_wait_timeout(Duration::from_millis(40))
        .with_poll_interval(Duration::from_millis(5))
}

fn layout() -> SiteLayout {
    SiteLayout::thriftbooks()
}

/// How a condition's stock is shown once it is selected.
enum Stock {
    Count(&'static str),
    Notice(&'static str),
    Hidden,
}

struct Grade {
    label: &'static str,
    price: &'static str,
    stock: Stock,
    list_price: Option<&'static str>,
}

fn grade(label: &'static str, price: &'static str) -> Grade {
    Grade {
        label,
        price,
        stock: Stock::Count("1 Available"),
        list_price: None,
    }
}

fn wishlist(entries: &[(&str, &str)]) -> Vec<MockElement> {
    let l = layout();
    let items = entries.iter().map(|(title, url)| {
        MockElement::new(&l.wishlist_item).with_child(
            MockElement::new(&l.wishlist_item_link)
                .with_text(*title)
                .with_attribute("href", *url),
        )
    });
    vec![MockElement::new(&l.wishlist_root).with_children(items)]
}

fn book_page(authors: &[&str]) -> Vec<MockElement> {
    let l = layout();
    vec![MockElement::new(&l.book_authors)
        .with_children(authors.iter().map(|a| MockElement::new(&l.book_author_link).with_text(*a)))]
}

/// One edition block. `key` keeps click targets unique per block.
fn edition_block(key: &str, details: &[&str], grades: Option<Vec<Grade>>) -> MockElement {
    let l = layout();
    let price_key = format!("{key}-price");
    let qty_key = format!("{key}-qty");
    let notice_key = format!("{key}-notice");
    let list_key = format!("{key}-list");

    let rows = details
        .iter()
        .map(|d| MockElement::new(&l.edition_detail_row).with_text_content(*d));
    let mut block = MockElement::new(&l.edition_block).with_children(rows);

    let Some(grades) = grades else {
        return block;
    };

    let options = grades.into_iter().map(|g| {
        let mut option = MockElement::new(&l.condition_option)
            .with_text(format!("{} ${}", g.label, g.price.trim_start_matches('$')))
            .on_click(ClickEffect::SetText {
                key: price_key.clone(),
                text: g.price.to_string(),
            });
        option = match g.stock {
            Stock::Count(text) => option
                .on_click(ClickEffect::Show { key: qty_key.clone() })
                .on_click(ClickEffect::SetText {
                    key: qty_key.clone(),
                    text: text.to_string(),
                })
                .on_click(ClickEffect::Hide { key: notice_key.clone() }),
            Stock::Notice(text) => option
                .on_click(ClickEffect::Hide { key: qty_key.clone() })
                .on_click(ClickEffect::Show { key: notice_key.clone() })
                .on_click(ClickEffect::SetText {
                    key: notice_key.clone(),
                    text: text.to_string(),
                }),
            Stock::Hidden => option
                .on_click(ClickEffect::Hide { key: qty_key.clone() })
                .on_click(ClickEffect::Hide { key: notice_key.clone() }),
        };
        match g.list_price {
            Some(text) => option
                .on_click(ClickEffect::Show { key: list_key.clone() })
                .on_click(ClickEffect::SetText {
                    key: list_key.clone(),
                    text: text.to_string(),
                }),
            None => option.on_click(ClickEffect::Hide { key: list_key.clone() }),
        }
    });

    block = block
        .with_child(MockElement::new(&l.condition_select).with_children(options))
        .with_child(MockElement::new(&l.thrift_price).with_key(price_key))
        .with_child(MockElement::new(&l.quantity_primary).with_key(qty_key))
        .with_child(MockElement::new(&l.quantity_fallback).with_key(notice_key).hidden())
        .with_child(MockElement::new(&l.list_price).with_key(list_key).hidden());
    block
}

fn editions_page(blocks: Vec<MockElement>) -> Vec<MockElement> {
    let l = layout();
    let mut page = vec![MockElement::new(&l.editions_header).with_text("All Editions")];
    page.extend(blocks);
    page
}

fn dune_editions() -> Vec<MockElement> {
    editions_page(vec![
        edition_block(
            "dune-mass",
            &[
                "Format: Mass Market Paperback",
                "ISBN: 0441013597",
                "ISBN13: 9780441013593",
                "Release Date: August 2005",
                "Publisher: Ace Books",
                "Language: English",
            ],
            Some(vec![
                Grade {
                    list_price: Some("$10.99"),
                    ..grade("Good", "$5.89")
                },
                Grade {
                    stock: Stock::Notice("Only 1 left"),
                    ..grade("Acceptable", "$4.49")
                },
            ]),
        ),
        edition_block(
            "dune-audio",
            &["Format: Audio CD", "ISBN: 1427201439"],
            None,
        ),
    ])
}

fn bookstore() -> MockPage {
    let dune_editions_url = "https://www.thriftbooks.com/w/dune_frank-herbert/250099/all-editions/";
    let emma_editions_url = "https://www.thriftbooks.com/w/emma_jane-austen/246742/all-editions/";

    MockPage::new()
        .with_page(&layout().wishlist_url, wishlist(&[("Dune", DUNE_URL), ("Emma", EMMA_URL)]))
        .with_page(DUNE_URL, book_page(&["Frank Herbert"]))
        .with_page(dune_editions_url, dune_editions())
        .with_page(EMMA_URL, book_page(&["Jane Austen", "  ", "Fiona Stafford"]))
        .with_page(
            emma_editions_url,
            editions_page(vec![edition_block(
                "emma-pb",
                &["ISBN13: 978-0141439587", "Format: Paperback"],
                Some(vec![grade("Very Good", "$6.19")]),
            )]),
        )
}

#[tokio::test]
async fn test_full_run_preserves_page_order() {
    let mut page = bookstore();
    let outcome = ExtractionAgent::new(config()).run(&mut page).await.unwrap();

    assert!(outcome.skipped.is_empty());
    assert_eq!(outcome.books.len(), 2);

    let dune = &outcome.books[0];
    assert_eq!(dune.uid, 250099);
    assert_eq!(dune.title, "Dune");
    assert_eq!(dune.author, "Frank Herbert");
    assert_eq!(dune.editions.len(), 1, "edition without a condition control is skipped");

    let mass = &dune.editions[0];
    assert_eq!(mass.isbn, 441013597);
    assert_eq!(mass.isbn13, 9780441013593);
    assert_eq!(mass.form.as_deref(), Some("Mass Market Paperback"));
    assert_eq!(mass.pub_date.as_deref(), Some("August 2005"));
    assert_eq!(mass.publisher.as_deref(), Some("Ace Books"));
    assert_eq!(mass.language.as_deref(), Some("English"));
    assert_eq!(
        mass.conditions,
        vec![
            Condition::new("Good", 5.89)
                .unwrap()
                .with_available(Availability::Count(1))
                .with_list_price(10.99)
                .unwrap(),
            Condition::new("Acceptable", 4.49)
                .unwrap()
                .with_available(Availability::Count(1)),
        ]
    );

    let emma = &outcome.books[1];
    assert_eq!(emma.uid, 246742);
    assert_eq!(emma.author, "Jane Austen, Fiona Stafford");
    assert_eq!(emma.editions[0].isbn, 0);
    assert_eq!(emma.editions[0].isbn13, 9780141439587);
    assert_eq!(emma.editions[0].ledger_key(), "0");
}

#[tokio::test]
async fn test_visits_detail_and_editions_pages_in_turn() {
    let mut page = bookstore();
    ExtractionAgent::new(config()).run(&mut page).await.unwrap();

    assert_eq!(
        page.visited(),
        vec![
            "https://www.thriftbooks.com/list/",
            DUNE_URL,
            "https://www.thriftbooks.com/w/dune_frank-herbert/250099/all-editions/",
            EMMA_URL,
            "https://www.thriftbooks.com/w/emma_jane-austen/246742/all-editions/",
        ]
    );
}

#[tokio::test]
async fn test_wishlist_timeout_is_fatal() {
    let mut page = MockPage::new();
    let err = ExtractionAgent::new(config()).run(&mut page).await.unwrap_err();

    assert!(err.is_fatal());
    match err {
        ExtractionError::NavigationTimeout { url, selector, .. } => {
            assert_eq!(url, "https://www.thriftbooks.com/list/");
            assert_eq!(selector, layout().wishlist_root);
        }
        other => panic!("expected NavigationTimeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_editions_header_timeout_is_fatal() {
    let mut page = MockPage::new()
        .with_page(&layout().wishlist_url, wishlist(&[("Dune", DUNE_URL)]))
        .with_page(DUNE_URL, book_page(&["Frank Herbert"]));

    let err = ExtractionAgent::new(config()).run(&mut page).await.unwrap_err();
    assert!(matches!(
        err,
        ExtractionError::NavigationTimeout { ref selector, .. }
            if *selector == layout().editions_header
    ));
}

#[tokio::test]
async fn test_book_without_authors_is_skipped() {
    let mut page = bookstore().with_page(DUNE_URL, vec![MockElement::new(".Unrelated")]);
    let outcome = ExtractionAgent::new(config()).run(&mut page).await.unwrap();

    assert_eq!(outcome.books.len(), 1);
    assert_eq!(outcome.books[0].title, "Emma");
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].url, DUNE_URL);
    assert!(outcome.skipped[0].reason.contains(&layout().book_authors));
}

#[tokio::test]
async fn test_unparseable_uid_skips_without_visiting() {
    let bad = "https://www.thriftbooks.com/w/some-book/not-a-number/";
    let mut page = bookstore().with_page(
        &layout().wishlist_url,
        wishlist(&[("Broken", bad), ("Dune", DUNE_URL)]),
    );
    let outcome = ExtractionAgent::new(config()).run(&mut page).await.unwrap();

    assert_eq!(outcome.books.len(), 1);
    assert_eq!(outcome.skipped[0].url, bad);
    assert!(!page.visited().contains(&bad));
}

#[tokio::test]
async fn test_relative_links_resolve_against_wishlist() {
    let mut page = bookstore().with_page(
        &layout().wishlist_url,
        wishlist(&[("Dune", "/w/dune_frank-herbert/250099/")]),
    );
    let outcome = ExtractionAgent::new(config()).run(&mut page).await.unwrap();

    assert!(outcome.skipped.is_empty());
    assert_eq!(outcome.books.len(), 1);
    assert_eq!(outcome.books[0].uid, 250099);
    assert_eq!(outcome.books[0].url, DUNE_URL);
    assert_eq!(outcome.books[0].editions.len(), 1);
    assert!(page.visited().contains(&DUNE_URL));
}

#[tokio::test]
async fn test_entries_without_links_are_skipped() {
    let l = layout();
    let list = vec![MockElement::new(&l.wishlist_root).with_children([
        MockElement::new(&l.wishlist_item).with_text("no link at all"),
        MockElement::new(&l.wishlist_item)
            .with_child(MockElement::new(&l.wishlist_item_link).with_text("No href")),
    ])];
    let mut page = MockPage::new().with_page(&l.wishlist_url, list);

    let outcome = ExtractionAgent::new(config()).run(&mut page).await.unwrap();
    assert!(outcome.books.is_empty());
    assert_eq!(outcome.skipped.len(), 2);
}

#[tokio::test]
async fn test_availability_notice_and_missing_fields() {
    let l = layout();
    let editions = editions_page(vec![edition_block(
        "e",
        &["ISBN: 111"],
        Some(vec![
            Grade {
                stock: Stock::Notice("Low stock"),
                ..grade("Good", "$3.00")
            },
            Grade {
                stock: Stock::Hidden,
                ..grade("Acceptable", "$2.50")
            },
            grade("Like New", "Sold out"),
        ]),
    )]);
    let mut page = MockPage::new()
        .with_page(&l.wishlist_url, wishlist(&[("Dune", DUNE_URL)]))
        .with_page(DUNE_URL, book_page(&["Frank Herbert"]))
        .with_page(format!("{}all-editions/", DUNE_URL), editions);

    let outcome = ExtractionAgent::new(config()).run(&mut page).await.unwrap();
    let conditions = &outcome.books[0].editions[0].conditions;

    assert_eq!(conditions.len(), 2, "condition without a price is dropped");
    assert_eq!(conditions[0].available, Some(Availability::Note("Low stock".into())));
    assert_eq!(conditions[1].available, None);

    let dropped: Vec<_> = outcome.issues_for("thrift_price").collect();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].condition.as_deref(), Some("Like New"));
    assert!(dropped[0].reason.as_deref().unwrap_or_default().contains("Sold out"));

    let unknown_stock: Vec<_> = outcome.issues_for("available").collect();
    assert_eq!(unknown_stock.len(), 1);
    assert_eq!(unknown_stock[0].condition.as_deref(), Some("Acceptable"));
    assert_eq!(unknown_stock[0].reason, None);

    // isbn13 row is absent on this edition
    assert_eq!(outcome.issues_for("isbn13").count(), 1);
}

#[tokio::test]
async fn test_unreadable_quantity_is_a_failed_field() {
    let l = layout();
    let block = MockElement::new(&l.edition_block)
        .with_child(MockElement::new(&l.edition_detail_row).with_text_content("ISBN: 42"))
        .with_child(
            MockElement::new(&l.condition_select)
                .with_child(MockElement::new(&l.condition_option).with_text("Good $1.00")),
        )
        .with_child(MockElement::new(&l.thrift_price).with_text("$1.00"))
        .with_child(MockElement::new(&l.quantity_primary).failing_reads());
    let mut page = MockPage::new()
        .with_page(&l.wishlist_url, wishlist(&[("Dune", DUNE_URL)]))
        .with_page(DUNE_URL, book_page(&["Frank Herbert"]))
        .with_page(format!("{}all-editions/", DUNE_URL), editions_page(vec![block]));

    let outcome = ExtractionAgent::new(config()).run(&mut page).await.unwrap();
    let condition = &outcome.books[0].editions[0].conditions[0];
    assert_eq!(condition.thrift_price, 1.0);
    assert_eq!(condition.available, None);

    let issue = outcome.issues_for("available").next().unwrap();
    assert!(issue.reason.as_deref().unwrap().contains("stale"));
}

#[tokio::test]
async fn test_login_fills_form_and_waits_for_anchor() {
    let l = layout();
    let mut page = MockPage::new().with_page(
        &l.login_url,
        vec![
            MockElement::new(&l.login_email),
            MockElement::new(&l.login_password),
            MockElement::new(&l.login_success),
        ],
    );
    let creds = Credentials::new("reader@example.com", "hunter2");

    login(&mut page, &config(), &creds).await.unwrap();

    let typed: Vec<_> = page
        .calls()
        .iter()
        .filter_map(|c| match c {
            MockPageCall::SendKeys { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(typed, vec!["reader@example.com", "hunter2", keys::ENTER]);
}

#[tokio::test]
async fn test_login_without_success_anchor_times_out() {
    let l = layout();
    let mut page = MockPage::new().with_page(
        &l.login_url,
        vec![MockElement::new(&l.login_email), MockElement::new(&l.login_password)],
    );
    let creds = Credentials::new("reader@example.com", "wrong");

    let err = login(&mut page, &config(), &creds).await.unwrap_err();
    assert!(matches!(err, ExtractionError::NavigationTimeout { .. }));
}

#[tokio::test]
async fn test_login_without_form_is_missing_element() {
    let mut page = MockPage::new();
    let creds = Credentials::new("reader@example.com", "pw");

    let err = login(&mut page, &config(), &creds).await.unwrap_err();
    assert!(matches!(
        err,
        ExtractionError::MissingElement { ref selector, .. } if *selector == layout().login_email
    ));
}
