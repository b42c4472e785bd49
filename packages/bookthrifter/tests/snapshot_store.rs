//! Snapshot directory: saving, ordering, and legacy files.

use chrono::NaiveDate;
use std::fs;

use bookthrifter::{Availability, Book, Condition, Edition, SnapshotStore};

fn catalog() -> Vec<Book> {
    vec![Book::new(250099, "Dune", "Frank Herbert", "https://www.thriftbooks.com/w/dune/250099/")
        .with_edition(
            Edition::new(441013597, 9780441013593)
                .with_form("Mass Market Paperback")
                .with_publisher("Ace Books")
                .with_condition(
                    Condition::new("Good", 5.89)
                        .unwrap()
                        .with_available(Availability::Note("low-stock".into()))
                        .with_list_price(10.99)
                        .unwrap(),
                ),
        )]
}

#[test]
fn test_empty_directory_has_no_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    assert!(SnapshotStore::new(dir.path()).load_latest().unwrap().is_none());
    assert!(SnapshotStore::new(dir.path().join("missing")).load_latest().unwrap().is_none());
}

#[test]
fn test_save_then_load_latest_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    let path = store.save(&catalog()).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("scrape-") && name.ends_with(".json"));

    assert_eq!(store.load_latest().unwrap(), Some(catalog()));
}

#[test]
fn test_newest_name_wins_over_file_times() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

    // Written second, but stamped earlier.
    store.save_at(&catalog(), day.and_hms_opt(12, 0, 0).unwrap()).unwrap();
    store.save_at(&[], day.and_hms_opt(8, 0, 0).unwrap()).unwrap();
    fs::write(dir.path().join("record_prices.json"), "{}").unwrap();
    fs::write(dir.path().join("scrape-unreadable.json"), "[]").unwrap();

    assert_eq!(store.load_latest().unwrap(), Some(catalog()));
}

#[test]
fn test_legacy_untagged_snapshot_loads() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = r#"[
        {
            "uid": "250099",
            "title": "Dune",
            "author": "Frank Herbert",
            "url": "https://www.thriftbooks.com/w/dune/250099/",
            "editions": [
                {
                    "isbn": 441013597,
                    "form": "Mass Market Paperback",
                    "isbn13": 9780441013593,
                    "pub_date": null,
                    "language": null,
                    "publisher": "Ace Books",
                    "conditions": [
                        {
                            "name": "Good",
                            "thrift_price": "$5.89",
                            "available": "low-stock",
                            "list_price": 10.99
                        }
                    ]
                }
            ]
        }
    ]"#;
    fs::write(dir.path().join("scrape-2023-11-02_07-30-00.json"), legacy).unwrap();

    let loaded = SnapshotStore::new(dir.path()).load_latest().unwrap().unwrap();
    assert_eq!(loaded, catalog());
}

#[test]
fn test_malformed_snapshot_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scrape-2023-11-02_07-30-00.json");
    fs::write(path, r#"[{"title": "no uid"}]"#).unwrap();

    assert!(SnapshotStore::new(dir.path()).load_latest().is_err());
}
