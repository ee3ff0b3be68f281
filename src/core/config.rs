//! Engine configuration with documented constants
//!
//! All tunable values are collected here with explanations of their purpose
//! and how they interact with each other.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::error::{ReflexError, Result};

/// Window used by the coordination bridge's "recently active" query.
///
/// Fixed by contract with external collaborators: a key press within the
/// last 200ms counts as activity regardless of the configured cooldown.
pub const RECENT_ACTIVITY_WINDOW_MS: u64 = 200;

/// Configuration for the automation engine
///
/// Durations are stored as milliseconds so the struct round-trips through
/// TOML without custom serde plumbing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === INPUT PACING ===
    /// Minimum gap between two physical key presses (ms)
    ///
    /// This is the single cooldown clock shared across every effect kind.
    /// While it has not elapsed, press-key effects report they cannot apply
    /// yet and no press is realized even if a rule requests one.
    pub key_cooldown_ms: u64,

    /// Default dwell for hover protocols (ms)
    ///
    /// How long the pointer must sit on its target before a hover effect
    /// counts as settled. Individual effects may carry their own dwell;
    /// this value seeds constructors that do not.
    pub hover_dwell_ms: u64,

    // === HISTORY ===
    /// How long applied-effect history entries are retained (seconds)
    ///
    /// Entries older than this are pruned on every insert. The history is
    /// a diagnostic surface, not durable state.
    pub history_retention_secs: u64,

    /// Hard cap on retained history entries
    ///
    /// Guards against a pathological rule applying an effect every tick
    /// within the retention window.
    pub history_max_entries: usize,

    // === GATING ===
    /// Run the pipeline even while the host's escape state is active
    ///
    /// Off by default: an open escape menu normally means the player has
    /// stepped away and automation must stop.
    pub run_in_escape_state: bool,

    /// Evaluate rules and report would-be effects without applying them
    ///
    /// Inspect mode rebuilds the frame and runs rule evaluation for
    /// introspection, but nothing is enqueued and no backend is touched.
    pub inspect_only: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_cooldown_ms: 250,
            hover_dwell_ms: 120,
            history_retention_secs: 60,
            history_max_entries: 256,
            run_in_escape_state: false,
            inspect_only: false,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_cooldown(&self) -> Duration {
        Duration::from_millis(self.key_cooldown_ms)
    }

    pub fn hover_dwell(&self) -> Duration {
        Duration::from_millis(self.hover_dwell_ms)
    }

    pub fn history_retention(&self) -> Duration {
        Duration::from_secs(self.history_retention_secs)
    }

    /// Parse a config from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.key_cooldown_ms == 0 {
            return Err(ReflexError::InvalidConfig(
                "key_cooldown_ms must be positive".into(),
            ));
        }

        // The activity window is a lower bound on meaningful retention:
        // history shorter than it cannot answer "what just happened".
        if self.history_retention_secs * 1000 < RECENT_ACTIVITY_WINDOW_MS {
            return Err(ReflexError::InvalidConfig(format!(
                "history_retention_secs ({}) must cover the {}ms activity window",
                self.history_retention_secs, RECENT_ACTIVITY_WINDOW_MS
            )));
        }

        if self.history_max_entries == 0 {
            return Err(ReflexError::InvalidConfig(
                "history_max_entries must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_cooldown_rejected() {
        let config = EngineConfig {
            key_cooldown_ms: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_applies_defaults() {
        let config = EngineConfig::from_toml("key_cooldown_ms = 100\n").unwrap();
        assert_eq!(config.key_cooldown_ms, 100);
        assert_eq!(config.history_max_entries, 256);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        assert!(EngineConfig::from_toml("key_cooldown_ms = 0\n").is_err());
    }
}
