//! Per-tick signal patterns
//!
//! Patterns decide, tick by tick, whether a simulated party asserts a signal:
//! a consumer's `ready`, a producer's willingness to offer a fresh record, or
//! the upper group's activity flag.

use serde::{Deserialize, Serialize};

/// Repeating boolean pattern indexed by tick
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pattern {
    /// Asserted on every tick
    #[default]
    Always,
    /// Never asserted
    Never,
    /// Asserted on every `n`th tick (ticks `n-1`, `2n-1`, ...)
    EveryNth {
        /// Period in ticks
        n: u64,
    },
    /// Repeats the given sequence
    Cycle {
        /// One entry per tick
        steps: Vec<bool>,
    },
}

impl Pattern {
    /// Whether the signal is asserted on `tick`
    pub fn at(&self, tick: u64) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::EveryNth { n } => *n <= 1 || tick % n == n - 1,
            Self::Cycle { steps } => {
                if steps.is_empty() {
                    true
                } else {
                    steps[(tick % steps.len() as u64) as usize]
                }
            }
        }
    }
}

/// Upper group activity over time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActivitySchedule {
    /// Same value for the whole run
    Constant(bool),
    /// `(tick, active)` switch points in ascending tick order; the flag is
    /// `true` before the first switch point
    Switches(Vec<(u64, bool)>),
    /// Follows a repeating pattern
    Pattern(Pattern),
}

impl ActivitySchedule {
    /// Activity flag on `tick`
    pub fn at(&self, tick: u64) -> bool {
        match self {
            Self::Constant(active) => *active,
            Self::Switches(points) => points
                .iter()
                .take_while(|(at, _)| *at <= tick)
                .last()
                .map(|(_, active)| *active)
                .unwrap_or(true),
            Self::Pattern(pattern) => pattern.at(tick),
        }
    }
}

impl Default for ActivitySchedule {
    fn default() -> Self {
        Self::Constant(true)
    }
}
