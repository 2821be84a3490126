//! Combiner engine
//!
//! The arbitration state machine that decides, tick by tick, which group may
//! advance and what the merged stream carries.

use chan_protocol::{Group, StreamPort, StreamRecord};
use tracing::{debug, info, trace};

use crate::config::CombinerConfig;
use crate::error::MuxError;
use crate::events::CombinerEvent;
use crate::state::{CombinerStats, Phase, StepOutcome};

/// All signals around a combiner for one tick
///
/// The combiner reads `lower`/`upper` record and valid, `combined.ready` and
/// `upper_active`; it drives `lower.ready`, `upper.ready`, and the combined
/// record and valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombinerIo {
    /// Lower group ingress
    pub lower: StreamPort,
    /// Upper group ingress
    pub upper: StreamPort,
    /// Merged egress
    pub combined: StreamPort,
    /// Upper group enabled, sampled live every tick
    pub upper_active: bool,
}

impl CombinerIo {
    /// Idle ports with the given upper activity
    pub fn new(upper_active: bool) -> Self {
        Self {
            upper_active,
            ..Default::default()
        }
    }
}

/// Combinational result of one tick, before state is committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Record driven onto the merged stream (`None` leaves valid low)
    pub combined: Option<StreamRecord>,
    /// Ready driven back to the lower producer
    pub lower_ready: bool,
    /// Ready driven back to the upper producer
    pub upper_ready: bool,
    /// Summary of the tick
    pub outcome: StepOutcome,
    /// Phase for the next tick
    pub next_phase: Phase,
    /// Drain slot for the next tick
    pub next_drain_slot: u32,
}

impl Decision {
    fn hold(phase: Phase, drain_slot: u32) -> Self {
        Self {
            combined: None,
            lower_ready: false,
            upper_ready: false,
            outcome: StepOutcome::Stalled { phase },
            next_phase: phase,
            next_drain_slot: drain_slot,
        }
    }

    fn enter_lower(&mut self) {
        self.next_phase = Phase::ServingLower;
        self.next_drain_slot = 0;
    }
}

/// Two-group stream combiner
#[derive(Debug, Clone)]
pub struct Combiner {
    config: CombinerConfig,
    phase: Phase,
    drain_slot: u32,
    burst_records: u32,
    burst_drained: bool,
    stats: CombinerStats,
    event_buffer: Vec<CombinerEvent>,
}

impl Combiner {
    /// Create a combiner in the lower phase
    ///
    /// Fails if `config` does not pass [`CombinerConfig::validate`].
    pub fn new(config: CombinerConfig) -> Result<Self, MuxError> {
        config.validate()?;
        info!(
            "Combiner created: {} lower + {} upper channels ({} index bits)",
            config.lower.channel_count,
            config.upper.channel_count,
            config.combined_index_bits()
        );

        Ok(Self {
            config,
            phase: Phase::ServingLower,
            drain_slot: 0,
            burst_records: 0,
            burst_drained: false,
            stats: CombinerStats::default(),
            event_buffer: Vec::new(),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &CombinerConfig {
        &self.config
    }

    /// Get the current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Get the drain slot used by the next placeholder
    pub fn drain_slot(&self) -> u32 {
        self.drain_slot
    }

    /// Get running totals
    pub fn stats(&self) -> &CombinerStats {
        &self.stats
    }

    /// Return to the lower phase with a cleared drain slot
    ///
    /// Statistics are kept; pending events are discarded.
    pub fn reset(&mut self) {
        debug!("Combiner reset from {}", self.phase.name());
        self.phase = Phase::ServingLower;
        self.drain_slot = 0;
        self.burst_records = 0;
        self.burst_drained = false;
        self.event_buffer.clear();
    }

    /// Compute this tick's outputs without changing any state
    pub fn evaluate(
        &self,
        lower: &StreamPort,
        upper: &StreamPort,
        combined_ready: bool,
        upper_active: bool,
    ) -> Decision {
        let mut decision = Decision::hold(self.phase, self.drain_slot);
        if !combined_ready {
            return decision;
        }

        match self.phase {
            Phase::ServingLower => {
                let Some(input) = lower.offered() else {
                    return decision;
                };

                // Only the upper group's end closes a merged burst
                let record = StreamRecord {
                    payload: input.payload,
                    channel_nr: input.channel_nr,
                    first: input.first,
                    last: false,
                };
                decision.lower_ready = true;
                decision.combined = Some(record);
                decision.outcome = StepOutcome::Forwarded {
                    group: Group::Lower,
                    record,
                };
                if input.last {
                    decision.next_phase = Phase::ServingUpper;
                }
            }

            Phase::ServingUpper => {
                let Some(input) = upper.offered() else {
                    return decision;
                };
                let offset = self.config.rebase_offset();
                decision.upper_ready = true;

                if upper_active {
                    let record = StreamRecord {
                        payload: input.payload,
                        channel_nr: input.channel_nr.wrapping_add(offset),
                        first: false,
                        last: input.last,
                    };
                    decision.combined = Some(record);
                    decision.outcome = StepOutcome::Forwarded {
                        group: Group::Upper,
                        record,
                    };
                    if input.last {
                        decision.enter_lower();
                    }
                } else {
                    let slot = self.drain_slot;
                    let last_slot = slot + 1 >= self.config.upper.channel_count;
                    let record = StreamRecord {
                        payload: 0,
                        channel_nr: slot.wrapping_add(offset),
                        first: false,
                        last: last_slot,
                    };
                    decision.combined = Some(record);
                    decision.outcome = StepOutcome::Drained {
                        slot,
                        discarded: *input,
                        record,
                    };
                    if last_slot {
                        decision.enter_lower();
                    } else {
                        decision.next_drain_slot = slot + 1;
                    }
                }
            }
        }

        decision
    }

    /// Advance one tick
    ///
    /// Drives the combiner-owned signals in `io` and commits the next state.
    /// A transfer on an ingress port happened iff that port has fired
    /// afterwards; the same holds for the combined port.
    pub fn step(&mut self, io: &mut CombinerIo) -> StepOutcome {
        let decision = self.evaluate(&io.lower, &io.upper, io.combined.ready, io.upper_active);

        io.lower.set_ready(decision.lower_ready);
        io.upper.set_ready(decision.upper_ready);
        match decision.combined {
            Some(record) => io.combined.offer(record),
            None => io.combined.withdraw(),
        }

        self.commit(&decision);
        decision.outcome
    }

    fn commit(&mut self, decision: &Decision) {
        let tick = self.stats.ticks;
        self.stats.record(&decision.outcome);

        match decision.outcome {
            StepOutcome::Stalled { .. } => {}
            StepOutcome::Forwarded { group, record } => {
                trace!(
                    "tick {}: forwarded {} record to channel {}",
                    tick,
                    group,
                    record.channel_nr
                );
                self.burst_records = self.burst_records.saturating_add(1);
            }
            StepOutcome::Drained { slot, record, .. } => {
                if slot == 0 {
                    debug!("tick {}: upper group inactive, draining", tick);
                    self.event_buffer.push(CombinerEvent::DrainStarted { tick });
                }
                trace!(
                    "tick {}: drained slot {} as channel {}",
                    tick,
                    slot,
                    record.channel_nr
                );
                self.burst_records = self.burst_records.saturating_add(1);
                self.burst_drained = true;
            }
        }

        if decision.next_phase != self.phase {
            let from = self.phase;
            let to = decision.next_phase;

            self.event_buffer.push(CombinerEvent::BurstCompleted {
                group: from.group(),
                records: self.burst_records,
                drained: self.burst_drained,
            });
            self.event_buffer
                .push(CombinerEvent::PhaseChanged { from, to, tick });
            debug!(
                "tick {}: {} burst done after {} records, switching to {}",
                tick,
                from.group(),
                self.burst_records,
                to.name()
            );

            if to == Phase::ServingLower {
                self.stats.rounds += 1;
            }
            self.burst_records = 0;
            self.burst_drained = false;
        }

        self.phase = decision.next_phase;
        self.drain_slot = decision.next_drain_slot;
    }

    /// Drain pending events
    pub fn drain_events(&mut self) -> Vec<CombinerEvent> {
        std::mem::take(&mut self.event_buffer)
    }
}
