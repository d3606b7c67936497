use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Claim passes may run at most this often / at least this often.
pub const MIN_CLAIM_INTERVAL_HOURS: u64 = 2;
pub const MAX_CLAIM_INTERVAL_HOURS: u64 = 12;

const DEFAULT_CLAIM_INTERVAL_HOURS: u64 = 12;

fn default_claim_interval_hours() -> u64 {
    DEFAULT_CLAIM_INTERVAL_HOURS
}

/// Target device profile substituted into each account's launch reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Android,
    AndroidX,
    Ios,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Android => "android",
            Platform::AndroidX => "android_x",
            Platform::Ios => "ios",
        })
    }
}

/// One farmed account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountEntry {
    /// Display name, unique within a farm run.
    pub name: String,
    /// Deep link captured from the messaging client.
    pub launch_reference: String,
}

/// Browser options forwarded to the session provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowserOptions {
    #[serde(default)]
    pub headless: bool,
}

/// Top-level farm configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct FarmConfig {
    pub platform: Option<Platform>,

    /// Ceiling for every bounded page wait.
    pub timeout_seconds: Option<u64>,

    /// Maximum clicks per tap burst.
    pub tap_budget: Option<u32>,

    #[serde(default)]
    pub claim_daily_rewards: bool,

    #[serde(default)]
    pub use_energy_boosts: bool,

    /// Hours between reward-claim passes.
    #[serde(default = "default_claim_interval_hours")]
    pub claim_interval_hours: u64,

    #[serde(default)]
    pub browser: BrowserOptions,

    #[serde(default)]
    pub accounts: Vec<AccountEntry>,
}

impl FarmConfig {
    /// Load and validate a config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse and validate a config from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: FarmConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.worker_settings().map(|_| ())
    }

    /// Check every required field and produce the per-worker settings.
    /// Each missing or invalid field reports its own error.
    pub fn worker_settings(&self) -> Result<WorkerSettings> {
        let platform = self
            .platform
            .ok_or_else(|| Error::Config("platform is required".into()))?;

        let timeout_seconds = self
            .timeout_seconds
            .ok_or_else(|| Error::Config("timeout_seconds is required".into()))?;
        if timeout_seconds == 0 {
            return Err(Error::Config("timeout_seconds must be positive".into()));
        }

        let tap_budget = self
            .tap_budget
            .ok_or_else(|| Error::Config("tap_budget is required".into()))?;
        if tap_budget == 0 {
            return Err(Error::Config("tap_budget must be positive".into()));
        }

        if !(MIN_CLAIM_INTERVAL_HOURS..=MAX_CLAIM_INTERVAL_HOURS)
            .contains(&self.claim_interval_hours)
        {
            return Err(Error::Config(format!(
                "claim_interval_hours must be between {MIN_CLAIM_INTERVAL_HOURS} and {MAX_CLAIM_INTERVAL_HOURS}"
            )));
        }

        if self.accounts.is_empty() {
            return Err(Error::Config("at least one account is required".into()));
        }
        let mut seen = HashSet::new();
        for account in &self.accounts {
            if account.name.trim().is_empty() {
                return Err(Error::Config("account name must not be empty".into()));
            }
            if account.launch_reference.trim().is_empty() {
                return Err(Error::Config(format!(
                    "account '{}' has an empty launch_reference",
                    account.name
                )));
            }
            if !seen.insert(account.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate account name '{}'",
                    account.name
                )));
            }
        }

        Ok(WorkerSettings {
            platform,
            timeout: Duration::from_secs(timeout_seconds),
            tap_budget,
            claim_daily_rewards: self.claim_daily_rewards,
            use_energy_boosts: self.use_energy_boosts,
            claim_interval: Duration::from_secs(self.claim_interval_hours * 60 * 60),
            headless: self.browser.headless,
        })
    }
}

/// Behavior knobs for one worker, extracted from a validated config.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub platform: Platform,
    pub timeout: Duration,
    pub tap_budget: u32,
    pub claim_daily_rewards: bool,
    pub use_energy_boosts: bool,
    pub claim_interval: Duration,
    pub headless: bool,
}
