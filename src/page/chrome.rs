//! Production [`SessionProvider`]/[`PageDriver`] backed by the `eoka`
//! browser stack.

use async_trait::async_trait;
use eoka::{Browser, Page, StealthConfig};
use tracing::debug;

use super::{PageDriver, PageError, SessionProvider};

// Narrow phone-shaped viewport the mini app lays out for.
const VIEWPORT_WIDTH: u32 = 300;
const VIEWPORT_HEIGHT: u32 = 800;

/// Opens Chrome sessions, one browser process per account session.
#[derive(Debug, Default)]
pub struct ChromeProvider;

impl ChromeProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionProvider for ChromeProvider {
    async fn open(&self, url: &str, headless: bool) -> Result<Box<dyn PageDriver>, PageError> {
        let stealth = StealthConfig {
            headless,
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            ..Default::default()
        };

        debug!("launching browser (headless: {headless})");
        let browser = Browser::launch_with_config(stealth)
            .await
            .map_err(|e| PageError::Connection(e.to_string()))?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                return Err(PageError::Connection(e.to_string()));
            }
        };
        if let Err(e) = page.goto(url).await {
            let _ = browser.close().await;
            return Err(PageError::Connection(e.to_string()));
        }

        Ok(Box::new(ChromeSession { browser, page }))
    }
}

/// One live Chrome session: the browser process plus its single page.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
}

/// Map a browser error onto the classification taxonomy, falling back to
/// [`PageError::Other`] when nothing structural is recognizable.
fn browser_err(selector: &str, err: eoka::Error) -> PageError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("closed") && (lower.contains("window") || lower.contains("target") || lower.contains("browser") || lower.contains("session")) {
        return PageError::WindowClosed;
    }
    if lower.contains("connection") || lower.contains("websocket") || lower.contains("channel") {
        return PageError::Connection(msg);
    }
    if lower.contains("stale") {
        return PageError::Stale(selector.to_string());
    }
    if lower.contains("intercept") || lower.contains("obscur") {
        return PageError::Obstructed(selector.to_string());
    }
    if lower.contains("not interactable") || lower.contains("not clickable") {
        return PageError::NotInteractable(selector.to_string());
    }
    PageError::Other(msg)
}

fn selector_json(selector: &str) -> String {
    serde_json::to_string(selector).unwrap()
}

#[async_trait]
impl PageDriver for ChromeSession {
    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<(), PageError> {
        self.page
            .wait_for(selector, timeout_ms)
            .await
            .map(|_| ())
            .map_err(|e| match browser_err(selector, e) {
                PageError::Other(_) => PageError::NotFound {
                    selector: selector.to_string(),
                    timeout_ms,
                },
                structural => structural,
            })
    }

    async fn click(&self, selector: &str) -> Result<(), PageError> {
        self.page
            .click(selector)
            .await
            .map_err(|e| browser_err(selector, e))
    }

    async fn try_click(&self, selector: &str) -> Result<bool, PageError> {
        match self.page.try_click(selector).await {
            Ok(clicked) => Ok(clicked),
            Err(e) => match browser_err(selector, e) {
                structural @ (PageError::WindowClosed | PageError::Connection(_)) => {
                    Err(structural)
                }
                _ => Ok(false),
            },
        }
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), PageError> {
        let js = format!(
            r#"(() => {{
                const els = document.querySelectorAll({sel});
                const el = els[{index}];
                if (!el) return false;
                el.scrollIntoView({{block: 'center'}});
                el.click();
                return true;
            }})()"#,
            sel = selector_json(selector),
        );
        let clicked: bool = self
            .page
            .evaluate(&js)
            .await
            .map_err(|e| browser_err(selector, e))?;
        if clicked {
            Ok(())
        } else {
            Err(PageError::Missing(selector.to_string()))
        }
    }

    async fn count(&self, selector: &str) -> Result<usize, PageError> {
        let js = format!(
            "document.querySelectorAll({}).length",
            selector_json(selector)
        );
        let n: usize = self
            .page
            .evaluate(&js)
            .await
            .map_err(|e| browser_err(selector, e))?;
        Ok(n)
    }

    async fn text(&self, selector: &str) -> Result<String, PageError> {
        let js = format!(
            "document.querySelector({})?.textContent ?? null",
            selector_json(selector)
        );
        let text: Option<String> = self
            .page
            .evaluate(&js)
            .await
            .map_err(|e| browser_err(selector, e))?;
        text.map(|t| t.trim().to_string())
            .ok_or_else(|| PageError::Missing(selector.to_string()))
    }

    async fn execute(&self, js: &str) -> Result<(), PageError> {
        let _ = self
            .page
            .execute(js)
            .await
            .map_err(|e| browser_err("script", e))?;
        Ok(())
    }

    async fn reload(&self) -> Result<(), PageError> {
        self.page
            .reload()
            .await
            .map_err(|e| browser_err("page", e))
    }

    async fn close(self: Box<Self>) -> Result<(), PageError> {
        let session = *self;
        session
            .browser
            .close()
            .await
            .map_err(|e| PageError::Connection(e.to_string()))?;
        Ok(())
    }
}
