//! Configuration types for the extraction agent.

use std::time::Duration;

/// Every URL and CSS selector the agent depends on.
///
/// A different retailer layout plugs in by supplying a different
/// `SiteLayout`; the extraction state machine itself does not change.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    pub login_url: String,
    pub wishlist_url: String,
    /// Appended to a book URL (fragment and trailing slash removed)
    pub editions_suffix: String,

    // Login
    pub login_email: String,
    pub login_password: String,
    pub login_success: String,

    // Wish-list
    pub wishlist_root: String,
    pub wishlist_item: String,
    pub wishlist_item_link: String,

    // Book detail
    pub book_authors: String,
    pub book_author_link: String,

    // Editions
    pub editions_header: String,
    pub edition_block: String,
    pub edition_detail_row: String,
    pub condition_select: String,
    pub condition_option: String,
    pub thrift_price: String,
    pub quantity_primary: String,
    pub quantity_fallback: String,
    pub list_price: String,
}

impl SiteLayout {
    /// Layout of thriftbooks.com as of the last verified run.
    pub fn thriftbooks() -> Self {
        Self {
            login_url: "https://www.thriftbooks.com/account/login/".into(),
            wishlist_url: "https://www.thriftbooks.com/list/".into(),
            editions_suffix: "all-editions/".into(),

            login_email: "#ExistingAccount_EmailAddress".into(),
            login_password: "#ExistingAccount_Password".into(),
            login_success: ".HomepageContentBlocks-Container".into(),

            wishlist_root: ".WishList-Root".into(),
            wishlist_item: ".WishList-ListItem".into(),
            wishlist_item_link: ".WishList-ItemTitle a".into(),

            book_authors: ".WorkMeta-authors".into(),
            book_author_link: "a".into(),

            editions_header: ".AllEditionsHeader".into(),
            edition_block: ".AllEditionsItem-work".into(),
            edition_detail_row: ".AllEditionsItem-details-item".into(),
            condition_select: ".AllEditions-selectCondition".into(),
            condition_option: "option".into(),
            thrift_price: ".AllEditionsItem-amount".into(),
            quantity_primary: ".AllEditionsItem-quantity".into(),
            quantity_fallback: ".AllEditionsItem-quantity-available.AllEditions-redFont".into(),
            list_price: ".AllEditionsItem-savings-list-price s".into(),
        }
    }
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self::thriftbooks()
    }
}

/// Configuration for one extraction run.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub layout: SiteLayout,

    /// Bound on every wait for a structural anchor
    pub wait_timeout: Duration,

    /// Delay between presence checks while waiting
    pub poll_interval: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            layout: SiteLayout::default(),
            wait_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl AgentConfig {
    pub fn new(layout: SiteLayout) -> Self {
        Self {
            layout,
            ..Default::default()
        }
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
