//! Combiner events
//!
//! Step-level happenings worth observing from outside (burst boundaries,
//! phase changes, drain passes) are buffered by the combiner and handed out
//! through [`crate::Combiner::drain_events`]. The actor forwards them on its
//! event channel.

use chan_protocol::Group;

use crate::state::Phase;

/// Notable combiner activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombinerEvent {
    /// The combiner will serve a different group from the next tick on
    PhaseChanged {
        /// Phase left
        from: Phase,
        /// Phase entered
        to: Phase,
        /// Tick on which the deciding transfer happened
        tick: u64,
    },

    /// A group's burst was fully emitted on the merged stream
    BurstCompleted {
        /// Group whose burst ended
        group: Group,
        /// Records emitted for the burst
        records: u32,
        /// Whether any of those records were drain placeholders
        drained: bool,
    },

    /// The upper group was found inactive and its slots are being drained
    DrainStarted {
        /// Tick of the first placeholder
        tick: u64,
    },
}

impl CombinerEvent {
    /// Check if this event marks the end of a round (upper burst done)
    pub fn is_round_end(&self) -> bool {
        matches!(
            self,
            CombinerEvent::BurstCompleted {
                group: Group::Upper,
                ..
            }
        )
    }
}
