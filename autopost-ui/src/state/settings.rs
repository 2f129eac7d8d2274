//! UI Settings
//!
//! Confirmation and reconnect settings for the browser front-end. Defaults
//! are shared with the native config; operators can override them per
//! browser through localStorage.

use autopost_console::realtime::{
    backoff_ms, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_BASE_DELAY_MS,
    DEFAULT_RECONNECT_MAX_DELAY_MS,
};
use autopost_console::controller::DEFAULT_CONFIRM_TIMEOUT_SECS;
use autopost_console::DashboardConfig;

pub const CONFIRM_TIMEOUT_KEY: &str = "autopost_confirm_timeout_secs";
pub const MAX_RECONNECT_ATTEMPTS_KEY: &str = "autopost_max_reconnect_attempts";
pub const RECONNECT_BASE_DELAY_KEY: &str = "autopost_reconnect_base_delay_ms";
pub const RECONNECT_MAX_DELAY_KEY: &str = "autopost_reconnect_max_delay_ms";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiSettings {
    pub confirm_timeout_secs: i64,
    pub max_reconnect_attempts: u32,
    pub reconnect_base_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: DEFAULT_CONFIRM_TIMEOUT_SECS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_base_delay_ms: DEFAULT_RECONNECT_BASE_DELAY_MS,
            reconnect_max_delay_ms: DEFAULT_RECONNECT_MAX_DELAY_MS,
        }
    }
}

impl UiSettings {
    /// Defaults with this browser's localStorage overrides
    pub fn load() -> Self {
        let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
        Self::from_lookup(|key| storage.as_ref()?.get_item(key).ok().flatten())
    }

    /// Defaults with overrides read through `lookup`.
    /// Unparsable or zero timeouts are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(secs) = parse_positive(lookup(CONFIRM_TIMEOUT_KEY)) {
            settings.confirm_timeout_secs = secs;
        }
        let attempts = lookup(MAX_RECONNECT_ATTEMPTS_KEY).and_then(|v| v.trim().parse().ok());
        if let Some(attempts) = attempts {
            settings.max_reconnect_attempts = attempts;
        }
        if let Some(ms) = parse_positive(lookup(RECONNECT_BASE_DELAY_KEY)) {
            settings.reconnect_base_delay_ms = ms;
        }
        if let Some(ms) = parse_positive(lookup(RECONNECT_MAX_DELAY_KEY)) {
            settings.reconnect_max_delay_ms = ms;
        }
        settings
    }

    pub fn dashboard(&self) -> DashboardConfig {
        DashboardConfig {
            confirmation_timeout: chrono::Duration::seconds(self.confirm_timeout_secs),
        }
    }

    /// Delay before reconnect attempt `attempts` (0-based), in milliseconds
    pub fn reconnect_delay(&self, attempts: u32) -> u32 {
        let ms = backoff_ms(
            attempts,
            self.reconnect_base_delay_ms,
            self.reconnect_max_delay_ms,
        );
        u32::try_from(ms).unwrap_or(u32::MAX)
    }
}

fn parse_positive<T>(raw: Option<String>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    raw?.trim().parse().ok().filter(|v: &T| *v > T::default())
}
