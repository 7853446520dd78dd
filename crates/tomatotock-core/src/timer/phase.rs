use serde::{Deserialize, Serialize};

/// The interval type the session is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Work,
    ShortRest,
    LongRest,
}

impl Phase {
    /// Stable lowercase label, also used as the notification parameter value.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Work => "work",
            Phase::ShortRest => "shortrest",
            Phase::LongRest => "longrest",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub work: u32,
    pub short_rest: u32,
    pub long_rest: u32,
}

impl Durations {
    /// Duration for a phase type. `Idle` has no countdown of its own and
    /// reports the work duration.
    pub fn of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Idle | Phase::Work => self.work,
            Phase::ShortRest => self.short_rest,
            Phase::LongRest => self.long_rest,
        }
    }

    /// Keep every positive field of `candidate`, falling back to `self`
    /// for the rest. Returns the merged value and the names of the fields
    /// that were rejected.
    pub fn merge_valid(&self, candidate: &Durations) -> (Durations, Vec<&'static str>) {
        let mut rejected = Vec::new();
        let mut pick = |name: &'static str, new: u32, old: u32| {
            if new == 0 {
                rejected.push(name);
                old
            } else {
                new
            }
        };
        let merged = Durations {
            work: pick("work", candidate.work, self.work),
            short_rest: pick("short_rest", candidate.short_rest, self.short_rest),
            long_rest: pick("long_rest", candidate.long_rest, self.long_rest),
        };
        (merged, rejected)
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work: 25 * 60,
            short_rest: 5 * 60,
            long_rest: 15 * 60,
        }
    }
}
