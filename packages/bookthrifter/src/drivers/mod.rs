//! `PageSession` implementations backed by a real browser.

pub mod webdriver;

pub use webdriver::WebDriverPage;
