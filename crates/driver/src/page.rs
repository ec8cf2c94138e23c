//! The `Browser` / `Page` capability contract.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use webscout_core_types::ElementSnapshot;

use crate::errors::DriverResult;

/// How long to wait after a navigation before considering it done.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaitPolicy {
    /// The document parsed; subresources may still be loading.
    DomContentLoaded,
    /// No network activity for a short window.
    NetworkIdle,
}

/// An authenticated browser session capable of opening pages.
///
/// One session is active per exploration run; all page operations on it
/// are awaited sequentially.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn new_page(&self) -> DriverResult<Box<dyn Page>>;

    /// Tear the session down. Idempotent.
    async fn close(&self) -> DriverResult<()>;
}

/// A single open page.
///
/// All element addressing goes through reference strings (see the
/// locator crate); the driver is responsible for resolving them against
/// the live DOM.
#[async_trait]
pub trait Page: Send + Sync {
    /// The page's current URL.
    fn url(&self) -> String;

    async fn goto(&self, url: &str, wait: WaitPolicy, timeout: Duration) -> DriverResult<()>;

    /// Wait for in-flight network/rendering activity to quiet down.
    async fn wait_settled(&self, timeout: Duration) -> DriverResult<()>;

    async fn click(&self, reference: &str, timeout: Duration) -> DriverResult<()>;

    async fn fill(&self, reference: &str, value: &str) -> DriverResult<()>;

    /// Press a key with the referenced element focused.
    async fn press(&self, reference: &str, key: &str) -> DriverResult<()>;

    async fn select_option(&self, reference: &str, value: &str) -> DriverResult<()>;

    /// Block until the referenced element is present and visible.
    async fn wait_for_visible(&self, reference: &str, timeout: Duration) -> DriverResult<()>;

    async fn screenshot(&self, path: &Path) -> DriverResult<()>;

    /// Visible body text, truncated to `budget` characters.
    async fn body_text(&self, budget: usize) -> DriverResult<String>;

    /// A serialized snapshot of the current DOM, suitable for hashing.
    async fn dom_snapshot(&self) -> DriverResult<String>;

    /// Elements matching the interactive predicate: anchors with an
    /// href, buttons, button/link roles, elements with a click handler.
    async fn interactive_elements(&self) -> DriverResult<Vec<ElementSnapshot>>;

    /// Elements matching the navigation predicate: anchors inside nav
    /// landmarks, navigation roles, or sidebar test ids.
    async fn navigation_elements(&self) -> DriverResult<Vec<ElementSnapshot>>;

    /// Snapshot of the first element matching a reference, if any.
    async fn element(&self, reference: &str) -> DriverResult<Option<ElementSnapshot>>;

    /// Reference of the first element matching a raw selector group,
    /// if any. Used for page-obstruction heuristics.
    async fn query_first(&self, selectors: &str) -> DriverResult<Option<String>>;

    /// Close this page. Idempotent.
    async fn close(&self) -> DriverResult<()>;
}
