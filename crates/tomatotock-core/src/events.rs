use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// What external observers (tray, overlay, console) see of the session.
///
/// `phase` is reported as `Idle` whenever the session is paused, including
/// the pause that follows a work unit when auto-advance is disabled.
/// `paused_in` keeps the interrupted phase for views that label pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBroadcast {
    pub phase: Phase,
    pub remaining_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_in: Option<Phase>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCue {
    Start,
    Tick,
    Complete,
}

/// Notification intent. Keys are resolved to text by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title_key: String,
    pub body_key: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl NotificationRequest {
    pub fn new(title_key: &str, body_key: &str) -> Self {
        Self {
            title_key: title_key.to_string(),
            body_key: body_key.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    WorkUnit,
}

/// One statistics record. `at` serializes as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRecord {
    pub kind: StatKind,
    pub at: DateTime<Utc>,
}

impl StatRecord {
    pub fn work_unit(at: DateTime<Utc>) -> Self {
        Self {
            kind: StatKind::WorkUnit,
            at,
        }
    }
}

/// Every outbound signal the engine emits, as one serializable value.
/// Used by [`Recorder`](crate::sinks::Recorder) and the CLI's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    StateChanged {
        phase: Phase,
        remaining_seconds: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        paused_in: Option<Phase>,
    },
    SoundRequested {
        cue: SoundCue,
        looped: bool,
    },
    SoundStopped,
    NotificationRequested {
        title_key: String,
        body_key: String,
        params: BTreeMap<String, String>,
    },
    StatisticRecorded {
        kind: StatKind,
        at: DateTime<Utc>,
    },
}

impl From<StateBroadcast> for Event {
    fn from(b: StateBroadcast) -> Self {
        Event::StateChanged {
            phase: b.phase,
            remaining_seconds: b.remaining_seconds,
            paused_in: b.paused_in,
        }
    }
}

impl From<NotificationRequest> for Event {
    fn from(n: NotificationRequest) -> Self {
        Event::NotificationRequested {
            title_key: n.title_key,
            body_key: n.body_key,
            params: n.params,
        }
    }
}

impl From<StatRecord> for Event {
    fn from(r: StatRecord) -> Self {
        Event::StatisticRecorded {
            kind: r.kind,
            at: r.at,
        }
    }
}
