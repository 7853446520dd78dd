//! Outbound collaborators of the session engine.
//!
//! Each sink receives one-way requests. A sink may fail; [`Sinks`] logs the
//! failure and carries on, so nothing a collaborator does can reach back
//! into the countdown.

use std::sync::{Arc, Mutex};

use crate::error::SinkError;
use crate::events::{Event, NotificationRequest, SoundCue, StatRecord, StateBroadcast};

pub type SinkResult = Result<(), SinkError>;

/// Tray tooltip/icon, overlay card, console line.
pub trait PresentationSink {
    fn emit_state(&mut self, state: StateBroadcast) -> SinkResult;
}

pub trait SoundSink {
    fn play(&mut self, cue: SoundCue, looped: bool) -> SinkResult;
    fn stop(&mut self) -> SinkResult;
}

pub trait NotificationSink {
    fn notify(&mut self, request: &NotificationRequest) -> SinkResult;
}

pub trait StatsSink {
    fn record(&mut self, record: StatRecord) -> SinkResult;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn emit_state(&mut self, _state: StateBroadcast) -> SinkResult {
        Ok(())
    }
}

impl SoundSink for NullSink {
    fn play(&mut self, _cue: SoundCue, _looped: bool) -> SinkResult {
        Ok(())
    }
    fn stop(&mut self) -> SinkResult {
        Ok(())
    }
}

impl NotificationSink for NullSink {
    fn notify(&mut self, _request: &NotificationRequest) -> SinkResult {
        Ok(())
    }
}

impl StatsSink for NullSink {
    fn record(&mut self, _record: StatRecord) -> SinkResult {
        Ok(())
    }
}

/// Captures every signal as an [`Event`]. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Event) {
        // A poisoned log only happens if a test panicked mid-push.
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }

    pub fn sound_requests(&self) -> Vec<(SoundCue, bool)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::SoundRequested { cue, looped } => Some((cue, looped)),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<NotificationRequest> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::NotificationRequested {
                    title_key,
                    body_key,
                    params,
                } => Some(NotificationRequest {
                    title_key,
                    body_key,
                    params,
                }),
                _ => None,
            })
            .collect()
    }

    pub fn statistics(&self) -> Vec<StatRecord> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::StatisticRecorded { kind, at } => Some(StatRecord { kind, at }),
                _ => None,
            })
            .collect()
    }

    pub fn last_state(&self) -> Option<StateBroadcast> {
        self.events().into_iter().rev().find_map(|e| match e {
            Event::StateChanged {
                phase,
                remaining_seconds,
                paused_in,
            } => Some(StateBroadcast {
                phase,
                remaining_seconds,
                paused_in,
            }),
            _ => None,
        })
    }
}

impl PresentationSink for Recorder {
    fn emit_state(&mut self, state: StateBroadcast) -> SinkResult {
        self.push(state.into());
        Ok(())
    }
}

impl SoundSink for Recorder {
    fn play(&mut self, cue: SoundCue, looped: bool) -> SinkResult {
        self.push(Event::SoundRequested { cue, looped });
        Ok(())
    }
    fn stop(&mut self) -> SinkResult {
        self.push(Event::SoundStopped);
        Ok(())
    }
}

impl NotificationSink for Recorder {
    fn notify(&mut self, request: &NotificationRequest) -> SinkResult {
        self.push(request.clone().into());
        Ok(())
    }
}

impl StatsSink for Recorder {
    fn record(&mut self, record: StatRecord) -> SinkResult {
        self.push(record.into());
        Ok(())
    }
}

/// The four collaborators the engine talks to.
pub struct Sinks {
    pub presentation: Box<dyn PresentationSink + Send>,
    pub sound: Box<dyn SoundSink + Send>,
    pub notifications: Box<dyn NotificationSink + Send>,
    pub stats: Box<dyn StatsSink + Send>,
}

impl Sinks {
    pub fn null() -> Self {
        Self {
            presentation: Box::new(NullSink),
            sound: Box::new(NullSink),
            notifications: Box::new(NullSink),
            stats: Box::new(NullSink),
        }
    }

    /// Route every sink into one shared recorder.
    pub fn recording(recorder: &Recorder) -> Self {
        Self {
            presentation: Box::new(recorder.clone()),
            sound: Box::new(recorder.clone()),
            notifications: Box::new(recorder.clone()),
            stats: Box::new(recorder.clone()),
        }
    }

    pub(crate) fn emit_state(&mut self, state: StateBroadcast) {
        if let Err(e) = self.presentation.emit_state(state) {
            tracing::warn!(error = %e, "presentation sink rejected state");
        }
    }

    pub(crate) fn play(&mut self, cue: SoundCue, looped: bool) {
        if let Err(e) = self.sound.play(cue, looped) {
            tracing::warn!(error = %e, ?cue, "sound request dropped");
        }
    }

    pub(crate) fn stop_sound(&mut self) {
        if let Err(e) = self.sound.stop() {
            tracing::warn!(error = %e, "stop sound request dropped");
        }
    }

    pub(crate) fn notify(&mut self, request: NotificationRequest) {
        if let Err(e) = self.notifications.notify(&request) {
            tracing::warn!(error = %e, body = %request.body_key, "notification dropped");
        }
    }

    pub(crate) fn record(&mut self, record: StatRecord) {
        if let Err(e) = self.stats.record(record) {
            tracing::warn!(error = %e, "statistics record dropped");
        }
    }
}

impl std::fmt::Debug for Sinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sinks").finish_non_exhaustive()
    }
}
