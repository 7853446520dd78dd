//! Session engine implementation.
//!
//! The engine is an explicit state machine over [`Phase`]. It owns no
//! threads: a [`Scheduler`] delivers 1-second ticks and delayed actions, and
//! the caller feeds them back through [`SessionEngine::tick`] and
//! [`SessionEngine::fire`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Work -> (ShortRest | LongRest) -> Work -> ...
//!           \-> paused, pending rest   (pause_after_work)
//! any  -> Idle                          (reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new(settings, scheduler, sinks);
//! engine.toggle_pause_resume();
//! // On every scheduler wakeup:
//! engine.tick();          // Wakeup::Tick
//! engine.fire(deferred);  // Wakeup::Deferred
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::phase::{Durations, Phase};
use super::scheduler::{Deferred, DeferredAction, ManualScheduler, Scheduler, Wakeup};
use super::settings::Settings;
use crate::events::{NotificationRequest, SoundCue, StatRecord, StateBroadcast};
use crate::sinks::Sinks;

/// Delay between a zero-crossing and the automatic start of the next phase.
pub const PHASE_CHANGE_DELAY: Duration = Duration::from_millis(1500);
/// Delay between entering a work phase and starting the looping tick cue.
pub const TICK_SOUND_DELAY: Duration = Duration::from_millis(1000);

const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;

/// Live snapshot of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub phase: Phase,
    pub remaining_seconds: u32,
    pub paused: bool,
    /// Work phases finished since the last long rest (or since start).
    pub completed_work_units: u32,
    /// Rest phase entered on resume after a work unit completed with
    /// auto-advance disabled.
    pub pending_phase_after_pause: Option<Phase>,
}

pub struct SessionEngine<S: Scheduler> {
    state: EngineState,
    settings: Settings,
    /// Last-known-good values, used when a settings snapshot carries zeros.
    durations: Durations,
    long_break_interval: u32,
    /// Phase type whose duration `Idle` displays and `reset` restores.
    last_phase_type: Phase,
    /// Bumped whenever armed work is superseded; stale deferred actions
    /// compare against it.
    generation: u64,
    ticking: bool,
    tick_sound_playing: bool,
    /// Target of a scheduled post-zero transition.
    awaiting: Option<Phase>,
    scheduler: S,
    sinks: Sinks,
}

impl<S: Scheduler> SessionEngine<S> {
    /// Create an engine in `Idle`, showing the work duration.
    pub fn new(settings: Settings, scheduler: S, sinks: Sinks) -> Self {
        let (durations, rejected) = Durations::default().merge_valid(&settings.durations);
        for field in rejected {
            tracing::warn!(field, "non-positive duration in settings, using default");
        }
        let long_break_interval = if settings.long_break_interval == 0 {
            tracing::warn!("long_break_interval is 0, using default");
            DEFAULT_LONG_BREAK_INTERVAL
        } else {
            settings.long_break_interval
        };

        Self {
            state: EngineState {
                phase: Phase::Idle,
                remaining_seconds: durations.work,
                paused: false,
                completed_work_units: 0,
                pending_phase_after_pause: None,
            },
            settings,
            durations,
            long_break_interval,
            last_phase_type: Phase::Work,
            generation: 0,
            ticking: false,
            tick_sound_playing: false,
            awaiting: None,
            scheduler,
            sinks,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn last_phase_type(&self) -> Phase {
        self.last_phase_type
    }

    /// Effective duration of a phase type after last-known-good fallback.
    pub fn duration(&self, phase: Phase) -> u32 {
        self.durations.of(phase)
    }

    pub fn long_break_interval(&self) -> u32 {
        self.long_break_interval
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// What external observers are told. Paused sessions read as idle.
    pub fn broadcast(&self) -> StateBroadcast {
        let phase = if self.state.paused || self.state.phase == Phase::Idle {
            Phase::Idle
        } else {
            self.state.phase
        };
        let paused_in = (self.state.paused && self.state.phase != Phase::Idle)
            .then_some(self.state.phase);
        StateBroadcast {
            phase,
            remaining_seconds: self.state.remaining_seconds,
            paused_in,
        }
    }

    /// Emit the current broadcast to the presentation sink.
    pub fn publish(&mut self) {
        let b = self.broadcast();
        self.sinks.emit_state(b);
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// The single start/pause/resume control.
    pub fn toggle_pause_resume(&mut self) {
        if self.state.phase == Phase::Idle {
            self.state.completed_work_units = 0;
            self.enter_phase(Phase::Work);
            return;
        }

        if let Some(target) = self.state.pending_phase_after_pause {
            tracing::debug!(%target, "resuming into pending phase");
            self.enter_phase(target);
            return;
        }

        if let Some(target) = self.awaiting.take() {
            // Pausing inside the auto-advance window turns the scheduled
            // transition into a pending one.
            self.generation += 1;
            self.state.paused = true;
            self.state.pending_phase_after_pause = Some(target);
            self.state.remaining_seconds = self.duration(target);
            self.last_phase_type = target;
            tracing::debug!(%target, "paused before auto-advance");
            self.publish();
            return;
        }

        if self.state.paused {
            self.state.paused = false;
            self.arm_ticker();
            if self.state.phase == Phase::Work && self.settings.enable_ticking_sound {
                self.start_tick_sound();
            }
            tracing::debug!(remaining = self.state.remaining_seconds, "resumed");
        } else {
            self.generation += 1;
            self.state.paused = true;
            self.disarm_ticker();
            self.stop_sound();
            tracing::debug!(remaining = self.state.remaining_seconds, "paused");
        }
        self.publish();
    }

    /// Return to `Idle`, clearing the cycle. Always succeeds.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.disarm_ticker();
        self.stop_sound();
        self.awaiting = None;
        self.state = EngineState {
            phase: Phase::Idle,
            remaining_seconds: self.duration(self.last_phase_type),
            paused: false,
            completed_work_units: 0,
            pending_phase_after_pause: None,
        };
        tracing::debug!(showing = %self.last_phase_type, "reset to idle");
        self.publish();
    }

    /// One second of countdown. Ignored unless a countdown is armed,
    /// running and above zero, so late ticks from a stopped ticker are
    /// harmless.
    pub fn tick(&mut self) {
        if !self.ticking
            || self.state.paused
            || self.state.phase == Phase::Idle
            || self.state.remaining_seconds == 0
        {
            tracing::trace!("tick ignored");
            return;
        }

        self.state.remaining_seconds -= 1;
        self.publish();

        if self.state.remaining_seconds == 0 {
            self.complete_countdown();
        }
    }

    /// Deliver a delayed action. Dropped when superseded.
    pub fn fire(&mut self, deferred: Deferred) {
        if deferred.generation != self.generation {
            tracing::debug!(
                scheduled = deferred.generation,
                current = self.generation,
                action = ?deferred.action,
                "stale deferred action dropped"
            );
            return;
        }

        match deferred.action {
            DeferredAction::EnterPhase(target) => {
                if self.state.phase == Phase::Idle || self.state.paused {
                    return;
                }
                self.enter_phase(target);
            }
            DeferredAction::StartTickSound => {
                if self.state.phase == Phase::Work
                    && !self.state.paused
                    && self.ticking
                    && self.settings.enable_ticking_sound
                {
                    self.start_tick_sound();
                }
            }
        }
    }

    /// Arm a phase for active countdown.
    pub fn enter_phase(&mut self, phase: Phase) {
        if phase == Phase::Idle {
            self.reset();
            return;
        }

        self.generation += 1;
        if self.tick_sound_playing {
            self.stop_sound();
        }
        self.awaiting = None;
        self.last_phase_type = phase;
        self.state.phase = phase;
        self.state.remaining_seconds = self.duration(phase);
        self.state.paused = false;
        self.state.pending_phase_after_pause = None;

        if phase == Phase::Work {
            if self.settings.enable_completion_sound {
                self.sinks.play(SoundCue::Start, false);
            }
            self.scheduler.schedule(
                TICK_SOUND_DELAY,
                Deferred {
                    generation: self.generation,
                    action: DeferredAction::StartTickSound,
                },
            );
        }

        self.arm_ticker();
        tracing::info!(%phase, seconds = self.state.remaining_seconds, "phase started");
        self.publish();
    }

    /// Replace the settings snapshot wholesale.
    pub fn apply_settings(&mut self, settings: Settings) {
        let (durations, rejected) = self.durations.merge_valid(&settings.durations);
        for field in rejected {
            tracing::warn!(field, "non-positive duration in settings, keeping last value");
        }
        if settings.long_break_interval == 0 {
            tracing::warn!(
                kept = self.long_break_interval,
                "long_break_interval is 0, keeping last value"
            );
        } else {
            self.long_break_interval = settings.long_break_interval;
        }

        let before = self.duration(self.last_phase_type);
        self.durations = durations;
        self.settings = settings;
        let after = self.duration(self.last_phase_type);

        if (self.state.phase == Phase::Idle || self.state.paused) && before != after {
            self.state.remaining_seconds = after;
        }
        if !self.settings.enable_ticking_sound && self.tick_sound_playing {
            self.stop_sound();
        }
        tracing::debug!("settings applied");
        self.publish();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_countdown(&mut self) {
        self.disarm_ticker();
        if self.tick_sound_playing {
            self.stop_sound();
        }

        let completion_sound = self.settings.enable_completion_sound;
        let notifications = self.settings.enable_notifications;

        match self.state.phase {
            Phase::Work => {
                if completion_sound {
                    self.sinks.play(SoundCue::Complete, false);
                }
                self.state.completed_work_units += 1;
                let target = if self.state.completed_work_units >= self.long_break_interval {
                    Phase::LongRest
                } else {
                    Phase::ShortRest
                };
                tracing::info!(
                    units = self.state.completed_work_units,
                    next = %target,
                    "work unit completed"
                );

                if self.settings.enable_stats {
                    self.sinks.record(StatRecord::work_unit(Utc::now()));
                }

                if self.settings.pause_after_work {
                    self.state.paused = true;
                    self.state.remaining_seconds = self.duration(target);
                    self.state.pending_phase_after_pause = Some(target);
                    self.last_phase_type = target;
                    self.publish();
                    if notifications {
                        self.sinks.notify(
                            NotificationRequest::new(
                                "notification_work_complete_title",
                                "notification_work_complete_next_body",
                            )
                            .with_param("next", target.as_str()),
                        );
                    }
                    return;
                }

                if notifications {
                    self.sinks.notify(
                        NotificationRequest::new(
                            "notification_work_complete_title",
                            "notification_work_complete_auto_body",
                        )
                        .with_param("next", target.as_str()),
                    );
                }
                self.schedule_transition(target);
            }
            Phase::ShortRest | Phase::LongRest => {
                if self.state.phase == Phase::LongRest {
                    self.state.completed_work_units = 0;
                }
                if completion_sound {
                    self.sinks.play(SoundCue::Complete, false);
                }
                if notifications {
                    self.sinks.notify(NotificationRequest::new(
                        "notification_break_complete_title",
                        "notification_break_complete_body",
                    ));
                }
                tracing::info!(rest = %self.state.phase, "rest completed");
                self.schedule_transition(Phase::Work);
            }
            Phase::Idle => {}
        }
    }

    fn schedule_transition(&mut self, target: Phase) {
        self.awaiting = Some(target);
        self.scheduler.schedule(
            PHASE_CHANGE_DELAY,
            Deferred {
                generation: self.generation,
                action: DeferredAction::EnterPhase(target),
            },
        );
    }

    fn arm_ticker(&mut self) {
        self.scheduler.start_ticker();
        self.ticking = true;
    }

    fn disarm_ticker(&mut self) {
        if self.ticking {
            self.scheduler.stop_ticker();
            self.ticking = false;
        }
    }

    fn start_tick_sound(&mut self) {
        self.sinks.play(SoundCue::Tick, true);
        self.tick_sound_playing = true;
    }

    fn stop_sound(&mut self) {
        self.sinks.stop_sound();
        self.tick_sound_playing = false;
    }
}

impl SessionEngine<ManualScheduler> {
    /// Move virtual time forward, delivering every tick and deferred action
    /// that falls due, in time order.
    pub fn advance(&mut self, by: Duration) {
        let until = self.scheduler.now_ms() + by.as_millis() as u64;
        while let Some(wakeup) = self.scheduler.pop_due(until) {
            match wakeup {
                Wakeup::Tick => self.tick(),
                Wakeup::Deferred(d) => self.fire(d),
            }
        }
        self.scheduler.set_now_ms(until);
    }

    pub fn advance_secs(&mut self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl<S: Scheduler> std::fmt::Debug for SessionEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("ticking", &self.ticking)
            .field("awaiting", &self.awaiting)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::events::Event;
    use crate::sinks::{
        NotificationSink, PresentationSink, Recorder, SinkResult, SoundSink, StatsSink,
    };

    fn engine_with(settings: Settings) -> (SessionEngine<ManualScheduler>, Recorder) {
        let recorder = Recorder::new();
        let engine = SessionEngine::new(
            settings,
            ManualScheduler::new(),
            Sinks::recording(&recorder),
        );
        (engine, recorder)
    }

    fn short_settings() -> Settings {
        Settings::with_durations(10, 3, 5)
    }

    #[test]
    fn starts_idle_showing_work_duration() {
        let (engine, _) = engine_with(short_settings());
        assert_eq!(engine.state().phase, Phase::Idle);
        assert_eq!(engine.state().remaining_seconds, 10);
        assert!(!engine.is_ticking());
    }

    #[test]
    fn toggle_from_idle_enters_work_with_start_cue() {
        let (mut engine, rec) = engine_with(short_settings());
        engine.toggle_pause_resume();

        assert_eq!(engine.state().phase, Phase::Work);
        assert!(!engine.state().paused);
        assert!(engine.scheduler().ticker_active());
        assert_eq!(rec.sound_requests(), vec![(SoundCue::Start, false)]);
        assert_eq!(
            rec.last_state(),
            Some(StateBroadcast {
                phase: Phase::Work,
                remaining_seconds: 10,
                paused_in: None,
            })
        );
    }

    #[test]
    fn tick_sound_starts_one_second_into_work() {
        let (mut engine, rec) = engine_with(short_settings());
        engine.toggle_pause_resume();
        engine.advance(Duration::from_millis(999));
        assert_eq!(rec.sound_requests().len(), 1);

        engine.advance(Duration::from_millis(1));
        assert_eq!(
            rec.sound_requests(),
            vec![(SoundCue::Start, false), (SoundCue::Tick, true)]
        );
        assert_eq!(engine.state().remaining_seconds, 9);
    }

    #[test]
    fn no_tick_sound_when_disabled() {
        let mut settings = short_settings();
        settings.enable_ticking_sound = false;
        let (mut engine, rec) = engine_with(settings);
        engine.toggle_pause_resume();
        engine.advance_secs(3);
        assert!(!rec.sound_requests().contains(&(SoundCue::Tick, true)));
    }

    #[test]
    fn pause_then_resume_restores_state() {
        let (mut engine, rec) = engine_with(short_settings());
        engine.toggle_pause_resume();
        engine.advance_secs(3);
        let before = *engine.state();

        engine.toggle_pause_resume();
        assert!(engine.state().paused);
        assert!(!engine.scheduler().ticker_active());
        assert_eq!(rec.events().last(), Some(&Event::StateChanged {
            phase: Phase::Idle,
            remaining_seconds: 7,
            paused_in: Some(Phase::Work),
        }));
        assert!(rec.events().contains(&Event::SoundStopped));

        engine.advance_secs(5);
        assert_eq!(engine.state().remaining_seconds, 7);

        engine.toggle_pause_resume();
        assert_eq!(*engine.state(), before);
        assert!(engine.scheduler().ticker_active());
        assert_eq!(rec.sound_requests().last(), Some(&(SoundCue::Tick, true)));
    }

    #[test]
    fn reset_returns_to_idle_from_running() {
        let (mut engine, rec) = engine_with(short_settings());
        engine.toggle_pause_resume();
        engine.advance_secs(4);
        engine.reset();

        assert_eq!(
            *engine.state(),
            EngineState {
                phase: Phase::Idle,
                remaining_seconds: 10,
                paused: false,
                completed_work_units: 0,
                pending_phase_after_pause: None,
            }
        );
        assert!(!engine.is_ticking());
        assert!(!engine.scheduler().ticker_active());
        assert_eq!(rec.events().iter().filter(|e| **e == Event::SoundStopped).count(), 1);
    }

    #[test]
    fn work_completion_auto_advances_after_delay() {
        let (mut engine, rec) = engine_with(short_settings());
        engine.toggle_pause_resume();
        engine.advance_secs(10);

        assert_eq!(engine.state().phase, Phase::Work);
        assert_eq!(engine.state().remaining_seconds, 0);
        assert_eq!(engine.state().completed_work_units, 1);
        assert!(!engine.scheduler().ticker_active());
        assert!(rec.sound_requests().contains(&(SoundCue::Complete, false)));
        let notes = rec.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].body_key, "notification_work_complete_auto_body");
        assert_eq!(notes[0].params.get("next").map(String::as_str), Some("shortrest"));

        engine.advance(Duration::from_millis(1499));
        assert_eq!(engine.state().phase, Phase::Work);
        engine.advance(Duration::from_millis(1));
        assert_eq!(engine.state().phase, Phase::ShortRest);
        assert_eq!(engine.state().remaining_seconds, 3);
        assert!(engine.scheduler().ticker_active());
    }

    #[test]
    fn rest_completion_returns_to_work() {
        let (mut engine, rec) = engine_with(short_settings());
        engine.toggle_pause_resume();
        engine.advance_secs(10);
        engine.advance(PHASE_CHANGE_DELAY);
        rec.drain();

        engine.advance_secs(3);
        let notes = rec.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].body_key, "notification_break_complete_body");
        assert_eq!(engine.state().completed_work_units, 1);

        engine.advance(PHASE_CHANGE_DELAY);
        assert_eq!(engine.state().phase, Phase::Work);
        assert_eq!(engine.state().remaining_seconds, 10);
    }

    #[test]
    fn zero_crossing_happens_once() {
        let (mut engine, rec) = engine_with(Settings::with_durations(1, 5, 5));
        engine.toggle_pause_resume();
        engine.advance_secs(1);
        engine.tick();
        engine.tick();
        assert_eq!(engine.state().completed_work_units, 1);
        assert_eq!(engine.state().remaining_seconds, 0);
        assert_eq!(rec.notifications().len(), 1);
    }

    #[test]
    fn pause_after_work_holds_until_resume() {
        let mut settings = Settings::with_durations(1, 3, 5);
        settings.pause_after_work = true;
        let (mut engine, rec) = engine_with(settings);
        engine.toggle_pause_resume();
        engine.advance_secs(1);

        assert_eq!(engine.state().phase, Phase::Work);
        assert!(engine.state().paused);
        assert_eq!(engine.state().pending_phase_after_pause, Some(Phase::ShortRest));
        assert_eq!(engine.state().remaining_seconds, 3);
        assert_eq!(engine.broadcast().phase, Phase::Idle);
        assert_eq!(
            rec.notifications()[0].body_key,
            "notification_work_complete_next_body"
        );

        engine.advance_secs(30);
        assert_eq!(engine.state().remaining_seconds, 3);
        assert_eq!(engine.state().phase, Phase::Work);

        engine.toggle_pause_resume();
        assert_eq!(engine.state().phase, Phase::ShortRest);
        assert!(!engine.state().paused);
        assert_eq!(engine.state().pending_phase_after_pause, None);
        engine.advance_secs(1);
        assert_eq!(engine.state().remaining_seconds, 2);
    }

    #[test]
    fn reset_during_transition_window_stays_idle() {
        let (mut engine, _) = engine_with(short_settings());
        engine.toggle_pause_resume();
        engine.advance_secs(10);
        engine.advance(Duration::from_millis(500));
        engine.reset();

        engine.advance_secs(5);
        assert_eq!(engine.state().phase, Phase::Idle);
        assert!(!engine.scheduler().ticker_active());
        assert_eq!(engine.scheduler().pending(), 0);
    }

    #[test]
    fn pause_during_transition_window_becomes_pending() {
        let (mut engine, _) = engine_with(short_settings());
        engine.toggle_pause_resume();
        engine.advance_secs(10);
        engine.toggle_pause_resume();

        assert!(engine.state().paused);
        assert_eq!(engine.state().pending_phase_after_pause, Some(Phase::ShortRest));
        assert_eq!(engine.state().remaining_seconds, 3);

        engine.advance_secs(5);
        assert_eq!(engine.state().phase, Phase::Work);
        assert_eq!(engine.state().completed_work_units, 1);

        engine.toggle_pause_resume();
        assert_eq!(engine.state().phase, Phase::ShortRest);
    }

    #[test]
    fn stale_tick_sound_after_pause_is_dropped() {
        let (mut engine, rec) = engine_with(short_settings());
        engine.toggle_pause_resume();
        engine.advance(Duration::from_millis(300));
        engine.toggle_pause_resume();
        engine.toggle_pause_resume();
        rec.drain();
        // The original 1 s tick-sound deferral was scheduled under an older
        // generation; only the resume itself requested the loop.
        engine.advance(Duration::from_millis(800));
        assert!(rec.sound_requests().is_empty());
    }

    #[test]
    fn ticks_ignored_when_not_running() {
        let (mut engine, rec) = engine_with(short_settings());
        engine.tick();
        assert_eq!(engine.state().remaining_seconds, 10);

        engine.toggle_pause_resume();
        engine.toggle_pause_resume();
        engine.tick();
        assert_eq!(engine.state().remaining_seconds, 10);
        assert!(rec.statistics().is_empty());
    }

    #[test]
    fn stats_recorded_only_when_enabled() {
        let mut settings = Settings::with_durations(1, 1, 1);
        let (mut engine, rec) = engine_with(settings.clone());
        engine.toggle_pause_resume();
        engine.advance_secs(1);
        assert!(rec.statistics().is_empty());

        settings.enable_stats = true;
        let (mut engine, rec) = engine_with(settings);
        engine.toggle_pause_resume();
        engine.advance_secs(1);
        assert_eq!(rec.statistics().len(), 1);
    }

    #[test]
    fn notifications_respect_setting() {
        let mut settings = Settings::with_durations(1, 1, 1);
        settings.enable_notifications = false;
        let (mut engine, rec) = engine_with(settings);
        engine.toggle_pause_resume();
        engine.advance_secs(5);
        assert!(rec.notifications().is_empty());
    }

    #[test]
    fn zero_durations_keep_last_known_good() {
        let (mut engine, _) = engine_with(Settings::with_durations(0, 3, 5));
        assert_eq!(engine.duration(Phase::Work), 25 * 60);

        let mut next = Settings::with_durations(40, 0, 7);
        next.long_break_interval = 0;
        engine.apply_settings(next);
        assert_eq!(engine.duration(Phase::Work), 40);
        assert_eq!(engine.duration(Phase::ShortRest), 3);
        assert_eq!(engine.duration(Phase::LongRest), 7);
        assert_eq!(engine.long_break_interval(), 4);
        assert_eq!(engine.state().remaining_seconds, 40);
    }

    #[test]
    fn settings_change_while_running_keeps_countdown() {
        let (mut engine, rec) = engine_with(short_settings());
        engine.toggle_pause_resume();
        engine.advance_secs(2);

        let mut next = Settings::with_durations(60, 3, 5);
        next.enable_ticking_sound = false;
        engine.apply_settings(next);
        assert_eq!(engine.state().remaining_seconds, 8);
        assert_eq!(rec.events().iter().rev().nth(1), Some(&Event::SoundStopped));
    }

    struct Broken;

    fn broken() -> SinkResult {
        Err(SinkError::Unsupported {
            sink: "test",
            message: "nope".into(),
        })
    }

    impl PresentationSink for Broken {
        fn emit_state(&mut self, _: StateBroadcast) -> SinkResult {
            broken()
        }
    }
    impl SoundSink for Broken {
        fn play(&mut self, _: SoundCue, _: bool) -> SinkResult {
            broken()
        }
        fn stop(&mut self) -> SinkResult {
            broken()
        }
    }
    impl NotificationSink for Broken {
        fn notify(&mut self, _: &NotificationRequest) -> SinkResult {
            broken()
        }
    }
    impl StatsSink for Broken {
        fn record(&mut self, _: StatRecord) -> SinkResult {
            broken()
        }
    }

    #[test]
    fn failing_sinks_do_not_disturb_countdown() {
        let mut settings = Settings::with_durations(2, 1, 1);
        settings.enable_stats = true;
        let sinks = Sinks {
            presentation: Box::new(Broken),
            sound: Box::new(Broken),
            notifications: Box::new(Broken),
            stats: Box::new(Broken),
        };
        let mut engine = SessionEngine::new(settings, ManualScheduler::new(), sinks);
        engine.toggle_pause_resume();
        engine.advance_secs(2);
        assert_eq!(engine.state().completed_work_units, 1);
        engine.advance(PHASE_CHANGE_DELAY);
        assert_eq!(engine.state().phase, Phase::ShortRest);
    }
}
