//! Launch reference handling.
//!
//! An account's launch reference is the deep link captured from the
//! messaging client, sometimes pasted with its surrounding `src="..."`
//! attribute. Before a session opens, the embedded platform marker is
//! rewritten to the platform the farm is configured for; a reference
//! without a recognized marker is rejected up front.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::Platform;
use crate::{Error, Result};

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"src=["']?([^"'>\s]+)["']?|([^"'>\s]+)"#).unwrap())
}

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"tgWebAppPlatform=(web|ios|android|android_x)").unwrap())
}

/// An account's raw session-bootstrap string.
#[derive(Debug, Clone)]
pub struct LaunchReference {
    raw: String,
}

impl LaunchReference {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The bootstrap url with the platform marker rewritten to `platform`.
    ///
    /// Fails when the reference holds no url or the url carries no
    /// recognized platform marker. No session is opened before this
    /// succeeds.
    pub fn platform_url(&self, platform: Platform) -> Result<String> {
        let url = extract_url(&self.raw)
            .ok_or_else(|| Error::SessionInit("launch reference holds no url".into()))?;
        if !marker_re().is_match(url) {
            return Err(Error::SessionInit(format!(
                "launch reference has no platform marker: {url}"
            )));
        }
        let replacement = format!("tgWebAppPlatform={platform}");
        Ok(marker_re().replace_all(url, replacement.as_str()).into_owned())
    }
}

/// Pull the url out of a reference that may be wrapped in an `src=`
/// attribute; otherwise the first non-whitespace token is taken.
fn extract_url(raw: &str) -> Option<&str> {
    let caps = url_re().captures(raw)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}
