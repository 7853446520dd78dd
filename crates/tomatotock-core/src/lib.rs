//! # Tomatotock Core Library
//!
//! Core logic for the Tomatotock work/break interval timer. The desktop
//! shell and the CLI are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Session Engine**: A phase state machine (idle / work / short rest /
//!   long rest) driven by an injected scheduler; it never spawns or sleeps
//! - **Sinks**: One-way collaborators for presentation, sound,
//!   notifications and statistics
//! - **Runtime**: A tokio driver that owns the engine and feeds it ticks,
//!   delayed actions and user commands
//! - **Storage**: TOML-based configuration and SQLite work-unit statistics
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: Core session state machine
//! - [`Scheduler`]: Ticker and delayed-callback abstraction
//! - [`Config`]: Application configuration management
//! - [`Database`]: Statistics persistence

pub mod error;
pub mod events;
pub mod runtime;
pub mod sinks;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, SinkError};
pub use events::{Event, NotificationRequest, SoundCue, StatKind, StatRecord, StateBroadcast};
pub use runtime::{Command, SessionRunner, TokioScheduler};
pub use sinks::{
    NotificationSink, NullSink, PresentationSink, Recorder, Sinks, SoundSink, StatsSink,
};
pub use storage::{Config, Database, Stats};
pub use timer::{
    Deferred, DeferredAction, Durations, EngineState, ManualScheduler, Phase, Scheduler,
    SessionEngine, Settings,
};
