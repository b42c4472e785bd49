//! Wish-list price monitor.
//!
//! Reads a bookstore wish-list through a browser session, producing an
//! ordered catalog of Book → Edition → Condition, and folds every observed
//! price into a durable record-low/record-high ledger.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bookthrifter::{login, AgentConfig, Credentials, ExtractionAgent, LedgerFile, SnapshotStore};
//!
//! let config = AgentConfig::default();
//! login(&mut session, &config, &Credentials::new(email, password)).await?;
//!
//! let outcome = ExtractionAgent::new(config).run(&mut session).await?;
//! let (_ledger, changes) = LedgerFile::new(ledger_path).update(&outcome.books)?;
//! SnapshotStore::new(data_dir).save(&outcome.books)?;
//! ```
//!
//! # Modules
//!
//! - [`types`] - Catalog model, site layout, extraction outcomes
//! - [`traits`] - The `PageSession` seam over page automation
//! - [`pipeline`] - Login and the three extraction stages
//! - [`ledger`] - Pure min/max price merge
//! - [`stores`] - Ledger file and snapshot directory
//! - [`drivers`] - WebDriver-backed `PageSession`
//! - [`security`] - Credentials kept out of logs
//! - [`testing`] - Scripted `MockPage` for tests

pub mod drivers;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ExtractionError, PageError, PersistenceError, ValidationError};
pub use traits::page::{ElementRef, PageSession};
pub use types::{
    catalog::{
        catalog_from_value, catalog_to_value, Availability, Book, Condition, Edition, EntityKind,
    },
    config::{AgentConfig, SiteLayout},
    outcome::{ExtractionOutcome, FieldIssue, FieldOutcome, SkippedEntry},
};

pub use drivers::WebDriverPage;
pub use ledger::{merge, merge_with_changes, PriceChange, PriceLedger, PriceRange};
pub use pipeline::{login, ExtractionAgent};
pub use security::{Credentials, SecretString};
pub use stores::{LedgerFile, SnapshotStore};
pub use testing::{MockElement, MockPage};
