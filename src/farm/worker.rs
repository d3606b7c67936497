//! The per-account worker: one browser session, one control loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::energy::{EnergyReading, NextStep};
use super::supervisor::{Recovery, Supervisor, MAX_ATTEMPTS};
use crate::config::WorkerSettings;
use crate::page::launch::LaunchReference;
use crate::page::{PageDriver, PageError, SessionProvider};
use crate::Error;

/// Class names of the mini-app UI. Page-specific and subject to upstream
/// redesigns; kept in one place.
mod selectors {
    /// Frame marker that signals the mini app finished its first load.
    pub const APP_FRAME: &str = ".payment-verification";
    pub const USER_INFO: &str = "a.user-info p";
    pub const TAP_BUTTON: &str = ".user-tap-button.button";
    pub const ENERGY_LABEL: &str = "div.user-tap-energy p";
    /// Confirm button of the income/level-up bottom sheet.
    pub const POPUP_CONFIRM: &str = ".bottom-sheet-button.button.button-primary.button-large";
    pub const POPUP_CLOSE: &str = ".bottom-sheet-close";
    pub const NAV_BAR_ITEM: &str = ".app-bar-item.no-select";
    pub const BOOST_MENU: &str = ".user-tap-boost";
    pub const BOOST_ITEM: &str = ".boost-column .boost-item";
    pub const REWARDS_TAB: &str = ".user-attraction-item";
    pub const REWARD_ITEM: &str = ".earn-column .earn-item";
}

/// Outbound domains reward tasks try to open; never follow them.
const BLOCKED_DOMAINS: [&str; 6] = [
    "youtu.be",
    "youtube.com",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
];

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Extra allowance on top of the per-wait timeout for the first load.
const HANDSHAKE_GRACE: Duration = Duration::from_secs(30);

/// Stop requests must be observed within this interval, however long the
/// current wait is.
const STOP_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Settle delay after scrolling before the page is read again.
const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// How often an empty energy label is re-read before it counts as gone.
const ENERGY_READ_ATTEMPTS: u32 = 15;

/// Why a step inside the loop did not finish.
enum StepError {
    Page(PageError),
    /// The stop flag was observed mid-step.
    Interrupted,
}

impl From<PageError> for StepError {
    fn from(err: PageError) -> Self {
        StepError::Page(err)
    }
}

/// Drives one account's session until stopped or broken. Owns the session
/// exclusively; nothing is shared with sibling workers except the stop
/// flag handed out to the controller.
pub struct AccountWorker {
    name: String,
    launch: LaunchReference,
    settings: WorkerSettings,
    provider: Arc<dyn SessionProvider>,
    stop: Arc<AtomicBool>,
}

impl AccountWorker {
    pub fn new(
        name: String,
        launch: LaunchReference,
        settings: WorkerSettings,
        provider: Arc<dyn SessionProvider>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            name,
            launch,
            settings,
            provider,
            stop,
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn timeout_ms(&self) -> u64 {
        self.settings.timeout.as_millis() as u64
    }

    /// Run the account until stopped or broken. Whatever the exit path,
    /// an opened session is closed exactly once.
    pub async fn run(self) {
        let page = match self.initialize().await {
            Ok(page) => page,
            Err(err) => {
                error!("[{}] session init failed: {err}", self.name);
                return;
            }
        };

        self.farm_loop(&*page).await;

        if let Err(err) = page.close().await {
            warn!("[{}] session teardown reported: {err}", self.name);
        }
        info!("[{}] worker stopped", self.name);
    }

    /// Rewrite the launch reference, open the session, wait out the first
    /// load. A reference without a platform marker fails before any
    /// session is opened; a handshake failure closes the session it
    /// opened.
    async fn initialize(&self) -> crate::Result<Box<dyn PageDriver>> {
        let url = self.launch.platform_url(self.settings.platform)?;
        let page = self
            .provider
            .open(&url, self.settings.headless)
            .await
            .map_err(|err| Error::SessionInit(err.to_string()))?;
        if let Err(err) = self.handshake(&*page).await {
            let _ = page.close().await;
            return Err(Error::SessionInit(err.to_string()));
        }
        Ok(page)
    }

    /// Wait for the mini app's first stable load signal and report who is
    /// signed in.
    async fn handshake(&self, page: &dyn PageDriver) -> Result<(), PageError> {
        let budget_ms = (self.settings.timeout + HANDSHAKE_GRACE).as_millis() as u64;
        page.wait_for(selectors::APP_FRAME, budget_ms).await?;
        page.wait_for(selectors::USER_INFO, budget_ms).await?;
        let username = page.text(selectors::USER_INFO).await?;
        info!("[{}] signed in as {}", self.name, username.trim());
        Ok(())
    }

    async fn reinitialize(&self, page: &dyn PageDriver) -> Result<(), PageError> {
        page.reload().await?;
        self.handshake(page).await
    }

    async fn farm_loop(&self, page: &dyn PageDriver) {
        let mut supervisor = Supervisor::new(MAX_ATTEMPTS);
        let mut next_claim = Instant::now();

        while !self.stop_requested() {
            match self.cycle(page, &mut next_claim).await {
                Ok(()) => supervisor.reset(),
                Err(StepError::Interrupted) => break,
                Err(StepError::Page(err)) => match supervisor.classify(&err) {
                    Recovery::Dismiss => {
                        debug!("[{}] dismissing overlay after: {err}", self.name);
                        self.dismiss_popups(page).await;
                    }
                    Recovery::Retry => {
                        warn!(
                            "[{}] retrying (attempt {}): {err}",
                            self.name,
                            supervisor.attempts()
                        );
                    }
                    Recovery::Skip => {
                        info!("[{}] skipping unavailable element: {err}", self.name);
                    }
                    Recovery::Reinitialize => {
                        warn!("[{}] reinitializing session after: {err}", self.name);
                        if let Err(reinit_err) = self.reinitialize(page).await {
                            error!("[{}] reinitialization failed: {reinit_err}", self.name);
                            break;
                        }
                    }
                    Recovery::Stop => {
                        warn!("[{}] session lost, stopping: {err}", self.name);
                        self.stop.store(true, Ordering::Relaxed);
                    }
                    Recovery::Abort => {
                        error!("[{}] unrecoverable failure: {err}", self.name);
                        break;
                    }
                },
            }
        }
    }

    /// One pass of the control loop: shed popups, maybe claim, read the
    /// gauge, then tap or wait.
    async fn cycle(&self, page: &dyn PageDriver, next_claim: &mut Instant) -> Result<(), StepError> {
        self.dismiss_popups(page).await;

        if self.settings.claim_daily_rewards && Instant::now() >= *next_claim {
            // Window advances whatever the outcome; one attempt per window.
            *next_claim = Instant::now() + self.settings.claim_interval;
            self.claim_rewards(page).await?;
        }

        let energy = self.read_energy(page).await?;
        info!("[{}] energy {}/{}", self.name, energy.current, energy.max);

        match energy.next_step() {
            NextStep::Tap => self.tap_burst(page).await?,
            NextStep::Wait(wait) => {
                debug!(
                    "[{}] waiting {:.1}s for energy",
                    self.name,
                    wait.as_secs_f64()
                );
                let _ = self.interruptible_sleep(wait).await;
            }
        }
        Ok(())
    }

    /// Best-effort dismissal of the income/level-up sheet and similar
    /// overlays.
    async fn dismiss_popups(&self, page: &dyn PageDriver) {
        let _ = page.try_click(selectors::POPUP_CONFIRM).await;
        let _ = page.try_click(selectors::POPUP_CLOSE).await;
    }

    /// The label is rewritten by the page and can be transiently empty,
    /// so re-read it a few times before treating it as gone.
    async fn read_energy(&self, page: &dyn PageDriver) -> Result<EnergyReading, StepError> {
        page.execute(SCROLL_TO_BOTTOM_JS).await?;
        self.settle().await?;
        page.wait_for(selectors::ENERGY_LABEL, self.timeout_ms()).await?;

        for _ in 0..ENERGY_READ_ATTEMPTS {
            if self.stop_requested() {
                return Err(StepError::Interrupted);
            }
            let text = page.text(selectors::ENERGY_LABEL).await?;
            if let Some(reading) = EnergyReading::parse(&text) {
                return Ok(reading);
            }
            debug!("[{}] energy label not readable yet", self.name);
            tokio::time::sleep(SETTLE_DELAY).await;
        }
        Err(StepError::Page(PageError::NotFound {
            selector: selectors::ENERGY_LABEL.to_string(),
            timeout_ms: self.timeout_ms(),
        }))
    }

    /// Click the tap button up to the configured budget, shedding popups
    /// in place so a single stolen click never aborts the burst. With
    /// boosts enabled, a successful boost buys another burst.
    async fn tap_burst(&self, page: &dyn PageDriver) -> Result<(), StepError> {
        page.execute(SCROLL_TO_BOTTOM_JS).await?;
        self.settle().await?;
        page.wait_for(selectors::TAP_BUTTON, self.timeout_ms()).await?;

        loop {
            info!("[{}] tap burst started", self.name);
            for _ in 0..self.settings.tap_budget {
                if self.stop_requested() {
                    return Err(StepError::Interrupted);
                }
                match page.click(selectors::TAP_BUTTON).await {
                    Ok(()) => {}
                    Err(PageError::Obstructed(_)) | Err(PageError::NotInteractable(_)) => {
                        self.dismiss_popups(page).await;
                    }
                    Err(err) => return Err(err.into()),
                }
                let delay = {
                    let mut rng = rand::thread_rng();
                    rng.gen_range(10..=100)
                };
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            info!("[{}] tap burst finished", self.name);

            if self.settings.use_energy_boosts && self.apply_energy_boost(page).await? {
                continue;
            }
            return Ok(());
        }
    }

    /// Returns true when a boost was applied and another burst is worth
    /// running. No boost available is the normal case, not an error.
    async fn apply_energy_boost(&self, page: &dyn PageDriver) -> Result<bool, StepError> {
        page.execute(SCROLL_TO_BOTTOM_JS).await?;
        self.settle().await?;

        match self.boost_sequence(page).await {
            Ok(()) => {
                info!("[{}] energy boost applied", self.name);
                Ok(true)
            }
            Err(err @ (PageError::WindowClosed | PageError::Connection(_))) => {
                Err(StepError::Page(err))
            }
            Err(_) => {
                debug!("[{}] no energy boost available", self.name);
                self.go_home(page).await;
                Ok(false)
            }
        }
    }

    async fn boost_sequence(&self, page: &dyn PageDriver) -> Result<(), PageError> {
        let timeout_ms = self.timeout_ms();
        page.wait_for(selectors::BOOST_MENU, timeout_ms).await?;
        page.click(selectors::BOOST_MENU).await?;
        page.wait_for(selectors::BOOST_ITEM, timeout_ms).await?;
        page.click_nth(selectors::BOOST_ITEM, 0).await?;
        page.wait_for(selectors::POPUP_CONFIRM, timeout_ms).await?;
        page.click(selectors::POPUP_CONFIRM).await?;
        Ok(())
    }

    /// One pass over the daily reward surfaces. The home navigation in
    /// the tail runs regardless of how the pass itself went.
    async fn claim_rewards(&self, page: &dyn PageDriver) -> Result<(), StepError> {
        let outcome = self.claim_pass(page).await;
        self.go_home(page).await;
        info!("[{}] daily reward pass finished", self.name);
        outcome
    }

    async fn claim_pass(&self, page: &dyn PageDriver) -> Result<(), StepError> {
        page.wait_for(selectors::REWARDS_TAB, self.timeout_ms()).await?;
        page.click_nth(selectors::REWARDS_TAB, 0).await?;

        // Reward tasks embed outbound links; neuter window.open first.
        page.execute(&block_navigation_js(&BLOCKED_DOMAINS)).await?;
        page.execute(SCROLL_TO_BOTTOM_JS).await?;
        self.settle().await?;

        let items = page.count(selectors::REWARD_ITEM).await?;
        debug!("[{}] {items} reward items", self.name);
        for index in 0..items {
            if self.stop_requested() {
                return Err(StepError::Interrupted);
            }
            match page.click_nth(selectors::REWARD_ITEM, index).await {
                Ok(()) => {}
                Err(PageError::Obstructed(_)) => {
                    page.execute(SCROLL_TO_BOTTOM_JS).await?;
                    self.settle().await?;
                    page.click_nth(selectors::REWARD_ITEM, index).await?;
                }
                Err(err) => return Err(err.into()),
            }
            self.try_wait_click(page, selectors::POPUP_CONFIRM).await?;
            self.try_wait_click(page, selectors::POPUP_CLOSE).await?;
        }
        Ok(())
    }

    /// Click the selector if it shows up within the timeout; absence or a
    /// stolen click is fine, structural loss is not.
    async fn try_wait_click(
        &self,
        page: &dyn PageDriver,
        selector: &str,
    ) -> Result<bool, StepError> {
        match page.wait_for(selector, self.timeout_ms()).await {
            Ok(()) => {}
            Err(PageError::NotFound { .. }) | Err(PageError::Missing(_)) => return Ok(false),
            Err(err) => return Err(err.into()),
        }
        match page.click(selector).await {
            Ok(()) => Ok(true),
            Err(err @ (PageError::WindowClosed | PageError::Connection(_))) => {
                Err(StepError::Page(err))
            }
            Err(_) => Ok(false),
        }
    }

    /// Best-effort return to the home surface (first bar button).
    async fn go_home(&self, page: &dyn PageDriver) {
        if let Err(err) = page.click_nth(selectors::NAV_BAR_ITEM, 0).await {
            debug!("[{}] could not return home: {err}", self.name);
        }
    }

    async fn settle(&self) -> Result<(), StepError> {
        if self.interruptible_sleep(SETTLE_DELAY).await {
            return Err(StepError::Interrupted);
        }
        Ok(())
    }

    /// Sleep in short slices so a stop request is observed within
    /// [`STOP_POLL_INTERVAL`] however long the total is. Returns whether
    /// stop was requested.
    async fn interruptible_sleep(&self, total: Duration) -> bool {
        let mut remaining = total;
        while remaining > Duration::ZERO {
            if self.stop_requested() {
                return true;
            }
            let slice = remaining.min(STOP_POLL_INTERVAL);
            tokio::time::sleep(slice).await;
            remaining -= slice;
        }
        self.stop_requested()
    }
}

/// Override `window.open` so clicks on reward tasks cannot navigate out
/// to the listed domains.
fn block_navigation_js(domains: &[&str]) -> String {
    let list = serde_json::to_string(domains).unwrap();
    format!(
        r#"(function() {{
    var originalOpen = window.open;
    window.open = function(url, name, specs) {{
        var blocked = {list};
        for (var i = 0; i < blocked.length; i++) {{
            if (url && url.includes(blocked[i])) {{
                console.log('blocked attempt to open ' + url);
                return null;
            }}
        }}
        return originalOpen.apply(this, arguments);
    }};
}})();"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocker_script_embeds_every_domain() {
        let js = block_navigation_js(&BLOCKED_DOMAINS);
        for domain in BLOCKED_DOMAINS {
            assert!(js.contains(domain));
        }
        assert!(js.contains("window.open"));
    }
}
