use chrono::Local;

use crate::event::RefreshEvent;

use super::core::{RefreshSchedule, lock};

/// Schedule text while periodic refresh is off.
pub const DISABLED_TEXT: &str = "disabled";

/// Last-refresh text when nothing has completed yet.
pub const NEVER_TEXT: &str = "Never";

impl RefreshSchedule {
    /// "disabled", or the interval as text ("30 minutes", "2 hours").
    pub fn schedule_as_string(&self) -> String {
        let state = lock(&self.state);
        schedule_text(state.enabled, state.interval_secs)
    }
}

pub(super) fn schedule_text(enabled: bool, interval_secs: u64) -> String {
    if enabled {
        interval_as_string(interval_secs)
    } else {
        DISABLED_TEXT.to_string()
    }
}

/// Whole minutes below an hour, whole hours above. Anything up to a minute
/// reads as "1 minute".
pub fn interval_as_string(interval_secs: u64) -> String {
    let minutes = interval_secs.max(60) / 60;
    if minutes >= 60 {
        plural(minutes / 60, "hour")
    } else {
        plural(minutes, "minute")
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// When the event finished and what it found, e.g.
/// `2024-05-01 14:30 (3 changes found)`.
pub fn refresh_event_as_string(event: Option<&RefreshEvent>) -> String {
    let Some(event) = event else {
        return NEVER_TEXT.to_string();
    };
    let mut text = match event.stop_time() {
        Some(stop) => stop.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => NEVER_TEXT.to_string(),
    };
    match event.changes().len() {
        0 => text.push_str(" (no changes found)"),
        1 => text.push_str(" (1 change found)"),
        n => text.push_str(&format!(" ({} changes found)", n)),
    }
    text
}
