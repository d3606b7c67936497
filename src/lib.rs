//! # tapfarm
//!
//! Multi-account browser automation for tap-to-earn mini apps. Each
//! configured account gets its own browser session and worker; workers
//! tap while the in-page energy gauge allows it, wait out regeneration,
//! collect daily rewards, and recover from the usual page noise on their
//! own.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tapfarm::page::chrome::ChromeProvider;
//! use tapfarm::{Farm, FarmConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> tapfarm::Result<()> {
//! let config = FarmConfig::load("farm.yaml")?;
//! let mut farm = Farm::new(Arc::new(ChromeProvider::new()));
//! farm.activate(&config)?;
//! tokio::signal::ctrl_c().await?;
//! farm.deactivate().await;
//! # Ok(())
//! # }
//! ```

mod config;
pub mod farm;
pub mod page;

pub use config::{AccountEntry, BrowserOptions, FarmConfig, Platform, WorkerSettings};
pub use farm::{Farm, FarmStatus};
pub use page::{PageDriver, PageError, SessionProvider};

/// Result type for tapfarm operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or farm activation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session init failed: {0}")]
    SessionInit(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const LAUNCH: &str = "https://game.example/clicker#tgWebAppPlatform=web";

    fn minimal_yaml() -> String {
        format!(
            r#"
platform: android
timeout_seconds: 10
tap_budget: 500
accounts:
  - name: alice
    launch_reference: "{LAUNCH}"
"#
        )
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = FarmConfig::parse(&minimal_yaml()).unwrap();
        assert_eq!(config.platform, Some(Platform::Android));
        assert_eq!(config.timeout_seconds, Some(10));
        assert_eq!(config.tap_budget, Some(500));
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].name, "alice");
    }

    #[test]
    fn test_default_values() {
        let config = FarmConfig::parse(&minimal_yaml()).unwrap();
        assert!(!config.claim_daily_rewards);
        assert!(!config.use_energy_boosts);
        assert_eq!(config.claim_interval_hours, 12);
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_parse_browser_config() {
        let yaml = format!(
            r#"
platform: android_x
timeout_seconds: 5
tap_budget: 100
browser:
  headless: true
accounts:
  - name: alice
    launch_reference: "{LAUNCH}"
"#
        );
        let config = FarmConfig::parse(&yaml).unwrap();
        assert_eq!(config.platform, Some(Platform::AndroidX));
        assert!(config.browser.headless);
    }

    #[test]
    fn test_worker_settings_extraction() {
        let yaml = format!(
            r#"
platform: ios
timeout_seconds: 7
tap_budget: 250
claim_daily_rewards: true
claim_interval_hours: 2
accounts:
  - name: alice
    launch_reference: "{LAUNCH}"
"#
        );
        let settings = FarmConfig::parse(&yaml).unwrap().worker_settings().unwrap();
        assert_eq!(settings.platform, Platform::Ios);
        assert_eq!(settings.timeout, Duration::from_secs(7));
        assert_eq!(settings.tap_budget, 250);
        assert!(settings.claim_daily_rewards);
        assert_eq!(settings.claim_interval, Duration::from_secs(2 * 60 * 60));
    }

    #[test]
    fn test_validation_missing_platform() {
        let yaml = format!(
            r#"
timeout_seconds: 10
tap_budget: 500
accounts:
  - name: alice
    launch_reference: "{LAUNCH}"
"#
        );
        let err = FarmConfig::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("platform is required"));
    }

    #[test]
    fn test_validation_missing_timeout() {
        let yaml = format!(
            r#"
platform: android
tap_budget: 500
accounts:
  - name: alice
    launch_reference: "{LAUNCH}"
"#
        );
        let err = FarmConfig::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("timeout_seconds is required"));
    }

    #[test]
    fn test_validation_zero_timeout() {
        let yaml = minimal_yaml().replace("timeout_seconds: 10", "timeout_seconds: 0");
        let err = FarmConfig::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("timeout_seconds must be positive"));
    }

    #[test]
    fn test_validation_missing_tap_budget() {
        let yaml = format!(
            r#"
platform: android
timeout_seconds: 10
accounts:
  - name: alice
    launch_reference: "{LAUNCH}"
"#
        );
        let err = FarmConfig::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("tap_budget is required"));
    }

    #[test]
    fn test_validation_zero_tap_budget() {
        let yaml = minimal_yaml().replace("tap_budget: 500", "tap_budget: 0");
        let err = FarmConfig::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("tap_budget must be positive"));
    }

    #[test]
    fn test_validation_no_accounts() {
        let yaml = r#"
platform: android
timeout_seconds: 10
tap_budget: 500
"#;
        let err = FarmConfig::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("at least one account"));
    }

    #[test]
    fn test_validation_duplicate_account_names() {
        let yaml = format!(
            r#"
platform: android
timeout_seconds: 10
tap_budget: 500
accounts:
  - name: alice
    launch_reference: "{LAUNCH}"
  - name: alice
    launch_reference: "{LAUNCH}"
"#
        );
        let err = FarmConfig::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate account name"));
    }

    #[test]
    fn test_validation_empty_launch_reference() {
        let yaml = r#"
platform: android
timeout_seconds: 10
tap_budget: 500
accounts:
  - name: alice
    launch_reference: ""
"#;
        let err = FarmConfig::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("empty launch_reference"));
    }

    #[test]
    fn test_validation_claim_interval_out_of_range() {
        let below = minimal_yaml() + "claim_interval_hours: 1\n";
        assert!(FarmConfig::parse(&below)
            .unwrap_err()
            .to_string()
            .contains("claim_interval_hours"));

        let above = minimal_yaml() + "claim_interval_hours: 24\n";
        assert!(FarmConfig::parse(&above)
            .unwrap_err()
            .to_string()
            .contains("claim_interval_hours"));
    }

    #[test]
    fn test_unknown_platform_is_a_parse_error() {
        let yaml = minimal_yaml().replace("platform: android", "platform: windows");
        let err = FarmConfig::parse(&yaml).unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_load_example_config() {
        let config = FarmConfig::load("configs/farm.yaml").unwrap();
        assert_eq!(config.platform, Some(Platform::Android));
        assert!(!config.accounts.is_empty());
    }
}
