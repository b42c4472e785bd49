//! Testing utilities including a scripted page session.
//!
//! `MockPage` serves in-memory documents keyed by URL, so the extraction
//! pipeline can be exercised without a browser or a network.
//!
//! ```rust,ignore
//! use bookthrifter::testing::{MockElement, MockPage};
//!
//! let mut page = MockPage::new().with_page(
//!     "https://example.com/list/",
//!     vec![MockElement::new(".List").with_child(MockElement::new(".Item").with_text("One"))],
//! );
//! ```

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{PageError, PageResult};
use crate::traits::page::{ElementRef, PageSession};

/// Mutation applied to the current document when an element is clicked.
#[derive(Debug, Clone)]
pub enum ClickEffect {
    /// Replace the text of the element tagged `key`
    SetText { key: String, text: String },
    /// Make the element tagged `key` unmatchable
    Hide { key: String },
    /// Make the element tagged `key` matchable again
    Show { key: String },
}

/// One node of a scripted document.
///
/// Selectors match literally: an element matches a CSS selector when that
/// exact string was registered with [`MockElement::new`] or
/// [`MockElement::also_matches`].
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    selectors: Vec<String>,
    key: Option<String>,
    text: String,
    text_content: Option<String>,
    attributes: HashMap<String, String>,
    children: Vec<MockElement>,
    hidden: bool,
    fail_reads: bool,
    on_click: Vec<ClickEffect>,
}

impl MockElement {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selectors: vec![selector.into()],
            ..Default::default()
        }
    }

    pub fn also_matches(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    /// Tag the element so click effects can target it.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Text content that differs from the rendered text.
    pub fn with_text_content(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: MockElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = MockElement>) -> Self {
        self.children.extend(children);
        self
    }

    /// Start hidden, as if not rendered.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Reading this element's text fails with a stale reference.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click.push(effect);
        self
    }

    fn matches(&self, selector: &str) -> bool {
        !self.hidden && self.selectors.iter().any(|s| s == selector)
    }

    fn node(&self, path: &[usize]) -> Option<&MockElement> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self.children.get(*first)?.node(rest),
        }
    }

    fn keyed_mut(&mut self, key: &str) -> Option<&mut MockElement> {
        if self.key.as_deref() == Some(key) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.keyed_mut(key))
    }

    /// Paths of matching descendants, in document order. Hidden elements
    /// hide their subtree.
    fn collect(&self, selector: &str, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        for (i, child) in self.children.iter().enumerate() {
            if child.hidden {
                continue;
            }
            path.push(i);
            if child.matches(selector) {
                out.push(path.clone());
            }
            child.collect(selector, path, out);
            path.pop();
        }
    }
}

/// Record of a call made to the mock page.
#[derive(Debug, Clone, PartialEq)]
pub enum MockPageCall {
    Navigate { url: String },
    FindAll { selector: String },
    Click { element: String },
    SendKeys { element: String, text: String },
    Quit,
}

/// A scripted `PageSession`.
///
/// Every navigation loads a fresh copy of the page for that URL (unknown
/// URLs load an empty document) and invalidates all earlier handles.
#[derive(Debug, Default)]
pub struct MockPage {
    pages: HashMap<String, Vec<MockElement>>,
    current_url: String,
    document: MockElement,
    generation: u64,
    handles: Vec<Vec<usize>>,
    calls: Vec<MockPageCall>,
    quit: bool,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the top-level elements served at `url`.
    pub fn with_page(mut self, url: impl Into<String>, elements: Vec<MockElement>) -> Self {
        self.pages.insert(url.into(), elements);
        self
    }

    pub fn calls(&self) -> &[MockPageCall] {
        &self.calls
    }

    /// URLs navigated to, in order.
    pub fn visited(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MockPageCall::Navigate { url } => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn is_quit(&self) -> bool {
        self.quit
    }

    fn handle(&mut self, path: Vec<usize>) -> ElementRef {
        self.handles.push(path);
        ElementRef::new(format!("{}:{}", self.generation, self.handles.len() - 1))
    }

    fn path_of(&self, element: &ElementRef) -> PageResult<&[usize]> {
        let stale = || PageError::StaleElement {
            element: element.id().to_string(),
        };
        let (generation, index) = element.id().split_once(':').ok_or_else(stale)?;
        if generation.parse::<u64>().ok() != Some(self.generation) {
            return Err(stale());
        }
        index
            .parse::<usize>()
            .ok()
            .and_then(|i| self.handles.get(i))
            .map(Vec::as_slice)
            .ok_or_else(stale)
    }

    fn resolve(&self, element: &ElementRef) -> PageResult<&MockElement> {
        let path = self.path_of(element)?;
        self.document.node(path).ok_or_else(|| PageError::StaleElement {
            element: element.id().to_string(),
        })
    }

    fn readable(&self, element: &ElementRef) -> PageResult<&MockElement> {
        let node = self.resolve(element)?;
        if node.fail_reads || node.hidden {
            return Err(PageError::StaleElement {
                element: element.id().to_string(),
            });
        }
        Ok(node)
    }
}

#[async_trait]
impl PageSession for MockPage {
    async fn navigate(&mut self, url: &str) -> PageResult<()> {
        if self.quit {
            return Err(PageError::Driver("session closed".into()));
        }
        self.calls.push(MockPageCall::Navigate { url: url.to_string() });
        self.current_url = url.to_string();
        let elements = self.pages.get(url).cloned().unwrap_or_default();
        self.document = MockElement::default().with_children(elements);
        self.generation += 1;
        self.handles.clear();
        Ok(())
    }

    async fn current_url(&mut self) -> PageResult<String> {
        Ok(self.current_url.clone())
    }

    async fn find_all(
        &mut self,
        scope: Option<&ElementRef>,
        selector: &str,
    ) -> PageResult<Vec<ElementRef>> {
        self.calls.push(MockPageCall::FindAll {
            selector: selector.to_string(),
        });

        let base = match scope {
            Some(scope) => self.path_of(scope)?.to_vec(),
            None => Vec::new(),
        };
        let mut found = Vec::new();
        let mut path = base.clone();
        if let Some(root) = self.document.node(&base) {
            root.collect(selector, &mut path, &mut found);
        }
        Ok(found.into_iter().map(|p| self.handle(p)).collect())
    }

    async fn text(&mut self, element: &ElementRef) -> PageResult<String> {
        Ok(self.readable(element)?.text.clone())
    }

    async fn text_content(&mut self, element: &ElementRef) -> PageResult<String> {
        let node = self.readable(element)?;
        Ok(node.text_content.clone().unwrap_or_else(|| node.text.clone()))
    }

    async fn attribute(&mut self, element: &ElementRef, name: &str) -> PageResult<Option<String>> {
        Ok(self.resolve(element)?.attributes.get(name).cloned())
    }

    async fn click(&mut self, element: &ElementRef) -> PageResult<()> {
        self.calls.push(MockPageCall::Click {
            element: element.id().to_string(),
        });
        let effects = self.resolve(element)?.on_click.clone();
        for effect in effects {
            match effect {
                ClickEffect::SetText { key, text } => {
                    if let Some(target) = self.document.keyed_mut(&key) {
                        target.text = text;
                    }
                }
                ClickEffect::Hide { key } => {
                    if let Some(target) = self.document.keyed_mut(&key) {
                        target.hidden = true;
                    }
                }
                ClickEffect::Show { key } => {
                    if let Some(target) = self.document.keyed_mut(&key) {
                        target.hidden = false;
                    }
                }
            }
        }
        Ok(())
    }

    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> PageResult<()> {
        self.resolve(element)?;
        self.calls.push(MockPageCall::SendKeys {
            element: element.id().to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn quit(&mut self) -> PageResult<()> {
        self.calls.push(MockPageCall::Quit);
        self.quit = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
