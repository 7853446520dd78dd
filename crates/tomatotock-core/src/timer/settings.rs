use serde::{Deserialize, Serialize};

use super::phase::Durations;

/// Immutable configuration snapshot read by the session engine.
///
/// A settings change replaces the whole value through
/// [`SessionEngine::apply_settings`](super::SessionEngine::apply_settings);
/// nothing mutates a snapshot in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub durations: Durations,
    /// Completed work units that make the next rest a long one.
    pub long_break_interval: u32,
    pub pause_after_work: bool,
    pub enable_completion_sound: bool,
    pub enable_ticking_sound: bool,
    pub enable_notifications: bool,
    pub enable_stats: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            durations: Durations::default(),
            long_break_interval: 4,
            pause_after_work: false,
            enable_completion_sound: true,
            enable_ticking_sound: true,
            enable_notifications: true,
            enable_stats: false,
        }
    }
}

impl Settings {
    /// Default flags with the given durations (seconds).
    pub fn with_durations(work: u32, short_rest: u32, long_rest: u32) -> Self {
        Self {
            durations: Durations {
                work,
                short_rest,
                long_rest,
            },
            ..Self::default()
        }
    }
}
