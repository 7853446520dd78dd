//! Async driver for the session engine.
//!
//! [`TokioScheduler`] turns ticker and delayed-action requests into tokio
//! tasks that post wakeups on a channel. [`SessionRunner`] owns the engine
//! and is the only place it is mutated: wakeups and user commands are
//! handled one at a time in a single task.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::sinks::Sinks;
use crate::timer::{
    Deferred, EngineState, Scheduler, SessionEngine, Settings, TICK_INTERVAL,
};

/// Wakeup posted by a [`TokioScheduler`] task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timed {
    /// Tick from the ticker with the given id.
    Tick(u64),
    Deferred(Deferred),
}

/// Scheduler backed by tokio timers. Must be used from within a runtime.
#[derive(Debug)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<Timed>,
    ticker: Option<JoinHandle<()>>,
    ticker_id: u64,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Timed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                ticker: None,
                ticker_id: 0,
            },
            rx,
        )
    }

    /// Whether a tick came from the ticker that is currently armed.
    pub fn is_current(&self, ticker_id: u64) -> bool {
        self.ticker.is_some() && self.ticker_id == ticker_id
    }
}

impl Scheduler for TokioScheduler {
    fn start_ticker(&mut self) {
        self.stop_ticker();
        self.ticker_id += 1;
        let id = self.ticker_id;
        let tx = self.tx.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(Timed::Tick(id)).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }

    fn schedule(&mut self, delay: Duration, deferred: Deferred) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The runner may already be gone; nothing to deliver to then.
            let _ = tx.send(Timed::Deferred(deferred));
        });
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

/// Inbound user/IPC commands.
#[derive(Debug)]
pub enum Command {
    Toggle,
    Reset,
    /// Replace the settings snapshot.
    Reload(Settings),
    /// Reply with the current engine state.
    Snapshot(oneshot::Sender<EngineState>),
    Quit,
}

pub struct SessionRunner {
    engine: SessionEngine<TokioScheduler>,
    wakeups: mpsc::UnboundedReceiver<Timed>,
}

impl SessionRunner {
    pub fn new(settings: Settings, sinks: Sinks) -> Self {
        let (scheduler, wakeups) = TokioScheduler::new();
        Self {
            engine: SessionEngine::new(settings, scheduler, sinks),
            wakeups,
        }
    }

    pub fn engine(&self) -> &SessionEngine<TokioScheduler> {
        &self.engine
    }

    /// Drive the engine until `Quit` arrives or every command sender is
    /// dropped. Returns the final state.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> EngineState {
        self.engine.publish();
        loop {
            tokio::select! {
                Some(wakeup) = self.wakeups.recv() => self.handle_wakeup(wakeup),
                command = commands.recv() => match command {
                    Some(Command::Quit) | None => break,
                    Some(command) => self.handle_command(command),
                },
            }
        }
        tracing::debug!(state = ?self.engine.state(), "session runner stopped");
        *self.engine.state()
    }

    fn handle_wakeup(&mut self, wakeup: Timed) {
        match wakeup {
            Timed::Tick(id) => {
                if self.engine.scheduler().is_current(id) {
                    self.engine.tick();
                } else {
                    tracing::trace!(ticker = id, "tick from retired ticker ignored");
                }
            }
            Timed::Deferred(deferred) => self.engine.fire(deferred),
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Toggle => self.engine.toggle_pause_resume(),
            Command::Reset => self.engine.reset(),
            Command::Reload(settings) => self.engine.apply_settings(settings),
            Command::Snapshot(reply) => {
                let _ = reply.send(*self.engine.state());
            }
            Command::Quit => {}
        }
    }
}
