//! Studio Configuration
//!
//! Timing constants and service address, with environment overrides.

use std::time::Duration;

use crate::backend::{Mode, DEFAULT_BASE_URL};

/// Studio configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudioConfig {
    /// Generation service base address
    pub base_url: String,
    /// Mode selected when the studio starts
    pub default_mode: Mode,
    /// How long "Animation ready!" stays up before the session returns to idle
    pub success_display: Duration,
    /// How long a failure status stays up before the session returns to idle
    pub failure_display: Duration,
    /// Delay between revealing an entry and emphasizing it
    pub highlight_settle: Duration,
    /// How long the emphasis lasts
    pub highlight_duration: Duration,
    /// Capacity of the studio -> view message channel
    pub message_capacity: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_mode: Mode::Standard,
            success_display: Duration::from_millis(2000),
            failure_display: Duration::from_millis(3000),
            highlight_settle: Duration::from_millis(300),
            highlight_duration: Duration::from_millis(2000),
            message_capacity: 100,
        }
    }
}

impl StudioConfig {
    /// Create configuration from environment variables
    ///
    /// - `VOICEMATION_BASE_URL`: service address
    /// - `VOICEMATION_IN_DEPTH`: "1" or "true" to start in extended mode
    /// - `VOICEMATION_SUCCESS_DISPLAY_MS`, `VOICEMATION_FAILURE_DISPLAY_MS`
    /// - `VOICEMATION_HIGHLIGHT_SETTLE_MS`, `VOICEMATION_HIGHLIGHT_MS`
    /// - `VOICEMATION_CHANNEL_CAPACITY`
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("VOICEMATION_BASE_URL").unwrap_or(defaults.base_url),
            default_mode: std::env::var("VOICEMATION_IN_DEPTH")
                .map(|v| {
                    if v == "1" || v.eq_ignore_ascii_case("true") {
                        Mode::Extended
                    } else {
                        Mode::Standard
                    }
                })
                .unwrap_or(defaults.default_mode),
            success_display: env_millis("VOICEMATION_SUCCESS_DISPLAY_MS")
                .unwrap_or(defaults.success_display),
            failure_display: env_millis("VOICEMATION_FAILURE_DISPLAY_MS")
                .unwrap_or(defaults.failure_display),
            highlight_settle: env_millis("VOICEMATION_HIGHLIGHT_SETTLE_MS")
                .unwrap_or(defaults.highlight_settle),
            highlight_duration: env_millis("VOICEMATION_HIGHLIGHT_MS")
                .unwrap_or(defaults.highlight_duration),
            message_capacity: std::env::var("VOICEMATION_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.message_capacity),
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_millis)
}
