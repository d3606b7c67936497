//! Page capabilities consumed by the farm core.
//!
//! The core never talks to a browser directly; it drives a [`PageDriver`]
//! obtained from a [`SessionProvider`]. The production implementation in
//! [`chrome`] sits on top of the `eoka` browser stack, tests substitute
//! scripted drivers.

pub mod chrome;
pub mod launch;

use async_trait::async_trait;

/// Failure classes a page interaction can produce.
///
/// The supervision layer dispatches on these, so adapters must map their
/// backend's errors into the closest class rather than collapsing
/// everything into [`PageError::Other`].
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// The element did not show up within the bounded wait.
    #[error("element '{selector}' did not appear within {timeout_ms}ms")]
    NotFound { selector: String, timeout_ms: u64 },

    /// The element is simply not part of the page.
    #[error("element '{0}' is absent from the page")]
    Missing(String),

    /// The element exists but cannot be interacted with right now.
    #[error("element '{0}' is not interactable")]
    NotInteractable(String),

    /// Another element (usually an overlay) swallowed the click.
    #[error("click on '{0}' was intercepted by another element")]
    Obstructed(String),

    /// A previously resolved element reference went stale.
    #[error("reference to '{0}' went stale")]
    Stale(String),

    /// The browser window or tab is gone.
    #[error("browser window was closed")]
    WindowClosed,

    /// Network-level failure talking to the browser.
    #[error("browser connection lost: {0}")]
    Connection(String),

    /// Anything the adapter could not classify.
    #[error("{0}")]
    Other(String),
}

/// One live page session. All waits are bounded; no call blocks forever.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Wait until the selector matches at least one element.
    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<(), PageError>;

    /// Click the first element matching the selector.
    async fn click(&self, selector: &str) -> Result<(), PageError>;

    /// Click the element if it is present; absence is not an error.
    async fn try_click(&self, selector: &str) -> Result<bool, PageError>;

    /// Click the n-th element matching the selector.
    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), PageError>;

    /// Number of elements currently matching the selector.
    async fn count(&self, selector: &str) -> Result<usize, PageError>;

    /// Trimmed text content of the first matching element.
    async fn text(&self, selector: &str) -> Result<String, PageError>;

    /// Run a script on the page for its side effect.
    async fn execute(&self, js: &str) -> Result<(), PageError>;

    /// Reload the page, keeping the session alive.
    async fn reload(&self) -> Result<(), PageError>;

    /// Tear the session down. Consumes the driver so it happens once.
    async fn close(self: Box<Self>) -> Result<(), PageError>;
}

/// Opens page sessions. The url handed in is already platform-substituted;
/// providers never see raw launch references.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open(&self, url: &str, headless: bool) -> Result<Box<dyn PageDriver>, PageError>;
}
