mod engine;
mod phase;
mod scheduler;
mod settings;

pub use engine::{EngineState, SessionEngine, PHASE_CHANGE_DELAY, TICK_SOUND_DELAY};
pub use phase::{Durations, Phase};
pub use scheduler::{
    Deferred, DeferredAction, ManualScheduler, Scheduler, Wakeup, TICK_INTERVAL,
};
pub use settings::Settings;
