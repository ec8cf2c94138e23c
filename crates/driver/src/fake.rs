//! In-memory fake browser.
//!
//! A declarative site model implementing the [`Browser`]/[`Page`]
//! capabilities without any engine underneath. Used by the test suites
//! of the exploration crates and by the CLI demo mode until a real CDP
//! adapter is wired in.
//!
//! References are resolved with the same synthesis the production
//! pipeline uses, so a spec element with id `pricing` is addressable as
//! `#pricing` from every layer.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use webscout_core_types::ElementSnapshot;
use webscout_locator::best_reference;

use crate::errors::{DriverError, DriverResult};
use crate::page::{Browser, Page, WaitPolicy};

/// Declarative model of one fake page.
#[derive(Clone, Debug, Default)]
pub struct FakePageSpec {
    pub title: String,
    pub nav: Vec<ElementSnapshot>,
    pub interactive: Vec<ElementSnapshot>,
    pub body_text: String,
    pub dom: String,
    /// reference -> URL the page navigates to when that element is
    /// clicked.
    pub on_click: HashMap<String, String>,
    /// reference -> URL the page navigates to when Enter is pressed on
    /// that element.
    pub on_enter: HashMap<String, String>,
    /// Exact selector-group string -> reference returned by
    /// `query_first`. The fake resolves selector groups by literal
    /// lookup rather than interpreting CSS.
    pub selector_hits: HashMap<String, String>,
}

impl FakePageSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_nav(mut self, element: ElementSnapshot) -> Self {
        self.nav.push(element);
        self
    }

    pub fn with_interactive(mut self, element: ElementSnapshot) -> Self {
        self.interactive.push(element);
        self
    }

    pub fn with_body_text(mut self, text: impl Into<String>) -> Self {
        self.body_text = text.into();
        self
    }

    pub fn with_click_navigation(
        mut self,
        reference: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        self.on_click.insert(reference.into(), url.into());
        self
    }

    pub fn with_enter_navigation(
        mut self,
        reference: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        self.on_enter.insert(reference.into(), url.into());
        self
    }

    pub fn with_selector_hit(
        mut self,
        selectors: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        self.selector_hits.insert(selectors.into(), reference.into());
        self
    }

    fn elements(&self) -> impl Iterator<Item = &ElementSnapshot> {
        self.nav.iter().chain(self.interactive.iter())
    }
}

/// A site the fake browser can navigate.
#[derive(Clone, Debug, Default)]
pub struct FakeSite {
    pages: HashMap<String, FakePageSpec>,
    fail_navigation: HashSet<String>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, spec: FakePageSpec) -> Self {
        self.pages.insert(url.into(), spec);
        self
    }

    /// Navigation to this URL fails even though a plan may contain it.
    pub fn with_failing_url(mut self, url: impl Into<String>) -> Self {
        self.fail_navigation.insert(url.into());
        self
    }

    fn spec(&self, url: &str) -> Option<&FakePageSpec> {
        self.pages.get(url)
    }
}

/// Convenience element constructors for site specs and tests.
pub fn anchor(text: &str, href: &str) -> ElementSnapshot {
    ElementSnapshot {
        text: Some(text.to_string()),
        href: Some(href.to_string()),
        ..ElementSnapshot::new("a")
    }
}

pub fn anchor_with_id(id: &str, text: &str, href: &str) -> ElementSnapshot {
    ElementSnapshot {
        id: Some(id.to_string()),
        ..anchor(text, href)
    }
}

pub fn button(id: &str, text: &str) -> ElementSnapshot {
    ElementSnapshot {
        id: Some(id.to_string()),
        text: Some(text.to_string()),
        ..ElementSnapshot::new("button")
    }
}

pub fn text_input(id: &str, input_type: &str, name: &str, placeholder: &str) -> ElementSnapshot {
    ElementSnapshot {
        id: Some(id.to_string()),
        input_type: Some(input_type.to_string()),
        name: Some(name.to_string()),
        placeholder: Some(placeholder.to_string()),
        has_click_handler: true,
        ..ElementSnapshot::new("input")
    }
}

/// Everything a fake page did, for test assertions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PageAction {
    Goto(String),
    Click(String),
    Fill(String, String),
    Press(String, String),
    Select(String, String),
    Screenshot(PathBuf),
}

#[derive(Debug)]
struct PageInner {
    url: Mutex<String>,
    actions: Mutex<Vec<PageAction>>,
    closed: AtomicBool,
}

/// One open fake page. Cloning shares the underlying state so tests can
/// keep a handle while the code under test owns the boxed trait object.
#[derive(Clone, Debug)]
pub struct FakePage {
    site: Arc<FakeSite>,
    inner: Arc<PageInner>,
}

impl FakePage {
    fn new(site: Arc<FakeSite>) -> Self {
        Self {
            site,
            inner: Arc::new(PageInner {
                url: Mutex::new("about:blank".to_string()),
                actions: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Recorded actions, in execution order.
    pub fn actions(&self) -> Vec<PageAction> {
        self.inner.actions.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn record(&self, action: PageAction) {
        self.inner.actions.lock().push(action);
    }

    fn current_spec(&self) -> Option<FakePageSpec> {
        self.site.spec(&self.inner.url.lock().clone()).cloned()
    }

    fn find_element(&self, reference: &str) -> Option<ElementSnapshot> {
        let spec = self.current_spec()?;
        let found = spec
            .elements()
            .find(|el| best_reference(el) == reference)
            .cloned();
        found
    }

    fn reference_exists(&self, reference: &str) -> bool {
        if self.find_element(reference).is_some() {
            return true;
        }
        self.current_spec()
            .map(|spec| {
                spec.on_click.contains_key(reference)
                    || spec.selector_hits.values().any(|hit| hit == reference)
            })
            .unwrap_or(false)
    }

    fn navigate_to(&self, url: &str) {
        *self.inner.url.lock() = url.to_string();
    }
}

#[async_trait]
impl Page for FakePage {
    fn url(&self) -> String {
        self.inner.url.lock().clone()
    }

    async fn goto(&self, url: &str, _wait: WaitPolicy, _timeout: Duration) -> DriverResult<()> {
        self.record(PageAction::Goto(url.to_string()));
        if self.site.fail_navigation.contains(url) {
            return Err(DriverError::navigation(url, "connection refused"));
        }
        if self.site.spec(url).is_none() {
            return Err(DriverError::navigation(url, "no such page in fake site"));
        }
        self.navigate_to(url);
        Ok(())
    }

    async fn wait_settled(&self, _timeout: Duration) -> DriverResult<()> {
        Ok(())
    }

    async fn click(&self, reference: &str, _timeout: Duration) -> DriverResult<()> {
        self.record(PageAction::Click(reference.to_string()));
        let Some(spec) = self.current_spec() else {
            return Err(DriverError::ElementNotFound(reference.to_string()));
        };
        if let Some(target) = spec.on_click.get(reference) {
            debug!(reference, target = %target, "fake click navigates");
            self.navigate_to(target);
            return Ok(());
        }
        if self.find_element(reference).is_some()
            || spec.selector_hits.values().any(|hit| hit == reference)
        {
            return Ok(());
        }
        Err(DriverError::ElementNotFound(reference.to_string()))
    }

    async fn fill(&self, reference: &str, value: &str) -> DriverResult<()> {
        self.record(PageAction::Fill(reference.to_string(), value.to_string()));
        if self.find_element(reference).is_none() {
            return Err(DriverError::ElementNotFound(reference.to_string()));
        }
        Ok(())
    }

    async fn press(&self, reference: &str, key: &str) -> DriverResult<()> {
        self.record(PageAction::Press(reference.to_string(), key.to_string()));
        if key == "Enter" {
            if let Some(spec) = self.current_spec() {
                if let Some(target) = spec.on_enter.get(reference) {
                    self.navigate_to(target);
                }
            }
        }
        Ok(())
    }

    async fn select_option(&self, reference: &str, value: &str) -> DriverResult<()> {
        self.record(PageAction::Select(reference.to_string(), value.to_string()));
        Ok(())
    }

    async fn wait_for_visible(&self, reference: &str, timeout: Duration) -> DriverResult<()> {
        if self.reference_exists(reference) {
            Ok(())
        } else {
            Err(DriverError::timeout(
                format!("wait for '{reference}'"),
                timeout.as_millis() as u64,
            ))
        }
    }

    async fn screenshot(&self, path: &Path) -> DriverResult<()> {
        self.record(PageAction::Screenshot(path.to_path_buf()));
        std::fs::write(path, b"fake-screenshot")?;
        Ok(())
    }

    async fn body_text(&self, budget: usize) -> DriverResult<String> {
        let text = self
            .current_spec()
            .map(|spec| spec.body_text)
            .unwrap_or_default();
        Ok(text.chars().take(budget).collect())
    }

    async fn dom_snapshot(&self) -> DriverResult<String> {
        let spec = self.current_spec().unwrap_or_default();
        if spec.dom.is_empty() {
            Ok(format!(
                "<html><title>{}</title><body>{}</body></html>",
                spec.title, spec.body_text
            ))
        } else {
            Ok(spec.dom)
        }
    }

    async fn interactive_elements(&self) -> DriverResult<Vec<ElementSnapshot>> {
        Ok(self
            .current_spec()
            .map(|spec| spec.interactive)
            .unwrap_or_default())
    }

    async fn navigation_elements(&self) -> DriverResult<Vec<ElementSnapshot>> {
        Ok(self.current_spec().map(|spec| spec.nav).unwrap_or_default())
    }

    async fn element(&self, reference: &str) -> DriverResult<Option<ElementSnapshot>> {
        Ok(self.find_element(reference))
    }

    async fn query_first(&self, selectors: &str) -> DriverResult<Option<String>> {
        Ok(self
            .current_spec()
            .and_then(|spec| spec.selector_hits.get(selectors).cloned()))
    }

    async fn close(&self) -> DriverResult<()> {
        self.inner.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct BrowserState {
    pages_opened: AtomicUsize,
    closed: AtomicBool,
    last_page: Mutex<Option<FakePage>>,
}

/// The fake session. Hand a clone of the same `FakeBrowser` to code
/// under test and keep one for assertions.
#[derive(Clone, Debug)]
pub struct FakeBrowser {
    site: Arc<FakeSite>,
    state: Arc<BrowserState>,
}

impl FakeBrowser {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            state: Arc::new(BrowserState::default()),
        }
    }

    /// Number of pages opened over the browser's lifetime.
    pub fn pages_opened(&self) -> usize {
        self.state.pages_opened.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Handle to the most recently opened page, for assertions.
    pub fn last_page(&self) -> Option<FakePage> {
        self.state.last_page.lock().clone()
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_page(&self) -> DriverResult<Box<dyn Page>> {
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(DriverError::Session("browser already closed".to_string()));
        }
        let page = FakePage::new(Arc::clone(&self.site));
        self.state.pages_opened.fetch_add(1, Ordering::SeqCst);
        *self.state.last_page.lock() = Some(page.clone());
        Ok(Box::new(page))
    }

    async fn close(&self) -> DriverResult<()> {
        self.state.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> FakeSite {
        FakeSite::new()
            .with_page(
                "https://shop.test/",
                FakePageSpec::new("Home")
                    .with_nav(anchor_with_id("nav-pricing", "Pricing", "/pricing"))
                    .with_interactive(button("buy", "Buy now"))
                    .with_click_navigation("#buy", "https://shop.test/checkout")
                    .with_body_text("Welcome to the shop"),
            )
            .with_page("https://shop.test/checkout", FakePageSpec::new("Checkout"))
            .with_failing_url("https://shop.test/broken")
    }

    #[tokio::test]
    async fn goto_and_click_track_navigation() {
        let browser = FakeBrowser::new(site());
        let page = browser.new_page().await.expect("page");

        page.goto(
            "https://shop.test/",
            WaitPolicy::NetworkIdle,
            Duration::from_secs(5),
        )
        .await
        .expect("goto");
        assert_eq!(page.url(), "https://shop.test/");

        page.click("#buy", Duration::from_secs(1)).await.expect("click");
        assert_eq!(page.url(), "https://shop.test/checkout");
    }

    #[tokio::test]
    async fn failing_url_surfaces_navigation_error() {
        let browser = FakeBrowser::new(site());
        let page = browser.new_page().await.expect("page");

        let err = page
            .goto(
                "https://shop.test/broken",
                WaitPolicy::DomContentLoaded,
                Duration::from_secs(5),
            )
            .await
            .expect_err("should fail");
        assert!(matches!(err, DriverError::Navigation { .. }));
    }

    #[tokio::test]
    async fn elements_resolve_by_synthesized_reference() {
        let browser = FakeBrowser::new(site());
        let page = browser.new_page().await.expect("page");
        page.goto(
            "https://shop.test/",
            WaitPolicy::NetworkIdle,
            Duration::from_secs(5),
        )
        .await
        .expect("goto");

        let found = page.element("#nav-pricing").await.expect("query");
        assert_eq!(found.expect("element").text.as_deref(), Some("Pricing"));

        let missing = page.element("#nope").await.expect("query");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn last_page_shares_state_with_boxed_handle() {
        let browser = FakeBrowser::new(site());
        let page = browser.new_page().await.expect("page");
        page.goto(
            "https://shop.test/",
            WaitPolicy::NetworkIdle,
            Duration::from_secs(5),
        )
        .await
        .expect("goto");

        let handle = browser.last_page().expect("handle");
        assert_eq!(handle.url(), "https://shop.test/");
        assert_eq!(
            handle.actions(),
            vec![PageAction::Goto("https://shop.test/".to_string())]
        );
        assert_eq!(browser.pages_opened(), 1);
    }
}
