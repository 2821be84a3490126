//! Arbitration state and counters

use chan_protocol::{Group, StreamRecord};
use serde::{Deserialize, Serialize};

/// Which group currently owns the merged stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Forwarding the lower group's burst
    #[default]
    ServingLower,
    /// Forwarding (or draining) the upper group's burst
    ServingUpper,
}

impl Phase {
    /// Group served in this phase
    pub fn group(&self) -> Group {
        match self {
            Self::ServingLower => Group::Lower,
            Self::ServingUpper => Group::Upper,
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::ServingLower => "Serving Lower",
            Self::ServingUpper => "Serving Upper",
        }
    }
}

/// What a single step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Egress not ready or the served producer had nothing on offer
    Stalled {
        /// Phase the combiner stayed in
        phase: Phase,
    },
    /// A producer's record was passed through to the merged stream
    Forwarded {
        /// Source group
        group: Group,
        /// Record as emitted on the merged stream
        record: StreamRecord,
    },
    /// An upper record was consumed and replaced by a zero placeholder
    Drained {
        /// Drain slot used for the placeholder index
        slot: u32,
        /// Upstream record that was thrown away
        discarded: StreamRecord,
        /// Placeholder emitted on the merged stream
        record: StreamRecord,
    },
}

impl StepOutcome {
    /// Record emitted on the merged stream, if any
    pub fn emitted(&self) -> Option<StreamRecord> {
        match self {
            Self::Stalled { .. } => None,
            Self::Forwarded { record, .. } | Self::Drained { record, .. } => Some(*record),
        }
    }

    /// Check if the step moved no data
    pub fn is_stall(&self) -> bool {
        matches!(self, Self::Stalled { .. })
    }
}

/// Running totals kept by a combiner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombinerStats {
    /// Steps taken
    pub ticks: u64,
    /// Steps that moved no data
    pub stalls: u64,
    /// Lower records forwarded
    pub lower_forwarded: u64,
    /// Upper records forwarded
    pub upper_forwarded: u64,
    /// Placeholders emitted for a disabled upper group
    pub drained: u64,
    /// Completed lower-then-upper rounds
    pub rounds: u64,
}

impl CombinerStats {
    /// Records emitted on the merged stream
    pub fn emitted(&self) -> u64 {
        self.lower_forwarded + self.upper_forwarded + self.drained
    }

    pub(crate) fn record(&mut self, outcome: &StepOutcome) {
        self.ticks += 1;
        match outcome {
            StepOutcome::Stalled { .. } => self.stalls += 1,
            StepOutcome::Forwarded {
                group: Group::Lower,
                ..
            } => self.lower_forwarded += 1,
            StepOutcome::Forwarded {
                group: Group::Upper,
                ..
            } => self.upper_forwarded += 1,
            StepOutcome::Drained { .. } => self.drained += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accounting() {
        let mut stats = CombinerStats::default();
        let record = StreamRecord::new(1, 0);

        stats.record(&StepOutcome::Stalled {
            phase: Phase::ServingLower,
        });
        stats.record(&StepOutcome::Forwarded {
            group: Group::Lower,
            record,
        });
        stats.record(&StepOutcome::Drained {
            slot: 0,
            discarded: record,
            record: StreamRecord::new(0, 2),
        });

        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.stalls, 1);
        assert_eq!(stats.lower_forwarded, 1);
        assert_eq!(stats.drained, 1);
        assert_eq!(stats.emitted(), 2);
    }

    #[test]
    fn test_phase_groups() {
        assert_eq!(Phase::default(), Phase::ServingLower);
        assert_eq!(Phase::ServingLower.group(), Group::Lower);
        assert_eq!(Phase::ServingUpper.group(), Group::Upper);
    }
}
