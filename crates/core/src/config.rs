use std::env;

use serde::{Deserialize, Serialize};

/// Default refresh interval: one hour.
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    match profiled_env_opt(profile, key) {
        Some(v) => match v.parse::<u64>() {
            Ok(n) if n > 0 => n,
            _ => {
                tracing::warn!(key, value = %v, default, "ignoring invalid positive integer");
                default
            }
        },
        None => default,
    }
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => {
                tracing::warn!(key, value = %v, default, "ignoring invalid boolean");
                default
            }
        },
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `RESYNC_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("RESYNC_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            schedule: ScheduleConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() {
            "default"
        } else {
            &self.profile
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  schedule:    interval={}s, enabled={}",
            self.schedule.interval_secs,
            self.schedule.enabled
        );
    }
}

// ── Refresh schedule ──────────────────────────────────────────

/// Defaults a refresh schedule starts from, and falls back to when its
/// persisted state is missing or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Refresh interval in seconds. Always positive.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Whether periodic refresh is enabled.
    #[serde(default)]
    pub enabled: bool,
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            enabled: false,
        }
    }
}

impl ScheduleConfig {
    /// Read from `RESYNC_REFRESH_INTERVAL_SECS` and `RESYNC_REFRESH_ENABLED`.
    pub fn from_env() -> Self {
        let profile = env_or("RESYNC_PROFILE", "").to_uppercase();
        Self::from_env_profiled(&profile)
    }

    fn from_env_profiled(p: &str) -> Self {
        Self {
            interval_secs: profiled_env_u64(
                p,
                "RESYNC_REFRESH_INTERVAL_SECS",
                DEFAULT_INTERVAL_SECS,
            ),
            enabled: profiled_env_bool(p, "RESYNC_REFRESH_ENABLED", false),
        }
    }
}
