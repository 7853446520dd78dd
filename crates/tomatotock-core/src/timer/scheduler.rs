//! Timing collaborators for the session engine.
//!
//! The engine never sleeps or spawns. It asks a [`Scheduler`] for a 1 Hz
//! ticker and for one-shot delayed actions, and the driver feeds the
//! resulting wakeups back through `tick()` and `fire()`.

use std::time::Duration;

use super::phase::Phase;

/// Work the engine wants done later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Arm the given phase (the auto-advance after a zero-crossing).
    EnterPhase(Phase),
    /// Start the looping tick cue a moment into a work phase.
    StartTickSound,
}

/// A delayed action tagged with the engine generation it was scheduled
/// under. The engine drops it if the generation has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deferred {
    pub generation: u64,
    pub action: DeferredAction,
}

pub trait Scheduler {
    /// Start the 1-second ticker, replacing any ticker already running.
    fn start_ticker(&mut self);
    fn stop_ticker(&mut self);
    fn schedule(&mut self, delay: Duration, deferred: Deferred);
}

/// A wakeup produced by a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    Tick,
    Deferred(Deferred),
}

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Virtual-time scheduler. Nothing happens until the owner advances the
/// clock, so tests run instantly and deterministically.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now_ms: u64,
    next_tick_ms: Option<u64>,
    /// (due, insertion order, action)
    pending: Vec<(u64, u64, Deferred)>,
    seq: u64,
    tickers_started: u32,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms)
    }

    pub fn ticker_active(&self) -> bool {
        self.next_tick_ms.is_some()
    }

    /// How many times a ticker has been (re)started.
    pub fn tickers_started(&self) -> u32 {
        self.tickers_started
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Pop the earliest wakeup due at or before `until_ms`, moving the
    /// clock to its due time. Deferred actions win ties against the ticker.
    pub(crate) fn pop_due(&mut self, until_ms: u64) -> Option<Wakeup> {
        let deferred = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (due, _, _))| *due <= until_ms)
            .min_by_key(|(_, (due, seq, _))| (*due, *seq))
            .map(|(idx, (due, _, _))| (idx, *due));
        let tick = self.next_tick_ms.filter(|due| *due <= until_ms);

        match (deferred, tick) {
            (Some((idx, due)), Some(tick_due)) if due <= tick_due => {
                Some(self.take_deferred(idx, due))
            }
            (Some((idx, due)), None) => Some(self.take_deferred(idx, due)),
            (_, Some(tick_due)) => {
                self.now_ms = tick_due;
                self.next_tick_ms = Some(tick_due + TICK_INTERVAL.as_millis() as u64);
                Some(Wakeup::Tick)
            }
            (None, None) => None,
        }
    }

    fn take_deferred(&mut self, idx: usize, due: u64) -> Wakeup {
        self.now_ms = due;
        let (_, _, deferred) = self.pending.remove(idx);
        Wakeup::Deferred(deferred)
    }

    pub(crate) fn set_now_ms(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

impl Scheduler for ManualScheduler {
    fn start_ticker(&mut self) {
        self.tickers_started += 1;
        self.next_tick_ms = Some(self.now_ms + TICK_INTERVAL.as_millis() as u64);
    }

    fn stop_ticker(&mut self) {
        self.next_tick_ms = None;
    }

    fn schedule(&mut self, delay: Duration, deferred: Deferred) {
        let due = self.now_ms + delay.as_millis() as u64;
        self.pending.push((due, self.seq, deferred));
        self.seq += 1;
    }
}
