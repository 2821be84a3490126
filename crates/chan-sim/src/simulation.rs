//! Tick-driven simulation harness
//!
//! Wires a [`Combiner`] to two virtual producers, a virtual consumer and a
//! contract monitor on every port, then steps the whole network one tick at
//! a time. Within a tick the order is: parties drive their signals, the
//! combiner decides, monitors look at the settled signals, and finally every
//! party observes whether its transfer happened.

use chan_mux::{Combiner, CombinerConfig, CombinerEvent, CombinerIo, CombinerStats, Phase, StepOutcome};
use chan_protocol::{Group, StreamRecord};
use tracing::{debug, info};

use crate::consumer::VirtualConsumer;
use crate::error::SimError;
use crate::monitor::{ProtocolMonitor, Violation};
use crate::pattern::ActivitySchedule;
use crate::producer::VirtualProducer;

/// Outcome of a simulation run
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Ticks simulated
    pub ticks: u64,
    /// Combiner totals
    pub stats: CombinerStats,
    /// Phase the combiner ended in
    pub phase: Phase,
    /// Merged stream as received by the consumer
    pub received: Vec<StreamRecord>,
    /// Combiner events in order
    pub events: Vec<CombinerEvent>,
    /// Contract breaches on any port
    pub violations: Vec<Violation>,
    /// Lower records never transferred
    pub lower_pending: usize,
    /// Upper records never transferred
    pub upper_pending: usize,
}

/// A combiner surrounded by simulated parties
#[derive(Debug)]
pub struct Simulation {
    combiner: Combiner,
    io: CombinerIo,
    lower: VirtualProducer,
    upper: VirtualProducer,
    consumer: VirtualConsumer,
    activity: ActivitySchedule,
    lower_monitor: ProtocolMonitor,
    upper_monitor: ProtocolMonitor,
    combined_monitor: ProtocolMonitor,
    events: Vec<CombinerEvent>,
    tick: u64,
}

impl Simulation {
    /// Create a simulation with empty producers, an always-ready consumer and
    /// an always-active upper group
    pub fn new(config: CombinerConfig) -> Result<Self, SimError> {
        Ok(Self {
            combiner: Combiner::new(config)?,
            io: CombinerIo::default(),
            lower: VirtualProducer::new(Group::Lower),
            upper: VirtualProducer::new(Group::Upper),
            consumer: VirtualConsumer::new(),
            activity: ActivitySchedule::default(),
            lower_monitor: ProtocolMonitor::new("lower")
                .with_channel_count(config.lower.channel_count),
            upper_monitor: ProtocolMonitor::new("upper")
                .with_channel_count(config.upper.channel_count),
            combined_monitor: ProtocolMonitor::new("combined")
                .with_channel_count(config.total_channels()),
            events: Vec::new(),
            tick: 0,
        })
    }

    /// Get the combiner
    pub fn combiner(&self) -> &Combiner {
        &self.combiner
    }

    /// Get the lower producer
    pub fn lower_mut(&mut self) -> &mut VirtualProducer {
        &mut self.lower
    }

    /// Get the upper producer
    pub fn upper_mut(&mut self) -> &mut VirtualProducer {
        &mut self.upper
    }

    /// Get the consumer
    pub fn consumer(&self) -> &VirtualConsumer {
        &self.consumer
    }

    /// Get the consumer mutably
    pub fn consumer_mut(&mut self) -> &mut VirtualConsumer {
        &mut self.consumer
    }

    /// Set the upper group activity schedule
    pub fn set_activity(&mut self, activity: ActivitySchedule) {
        self.activity = activity;
    }

    /// Ticks simulated so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulate one tick
    pub fn step(&mut self) -> StepOutcome {
        let tick = self.tick;

        self.lower.drive(&mut self.io.lower, tick);
        self.upper.drive(&mut self.io.upper, tick);
        self.consumer.drive(&mut self.io.combined, tick);
        self.io.upper_active = self.activity.at(tick);

        let outcome = self.combiner.step(&mut self.io);

        self.lower_monitor.observe(&self.io.lower, tick);
        self.upper_monitor.observe(&self.io.upper, tick);
        self.combined_monitor.observe(&self.io.combined, tick);

        self.consumer.complete(&self.io.combined);
        self.lower.complete(&mut self.io.lower);
        self.upper.complete(&mut self.io.upper);

        self.events.extend(self.combiner.drain_events());
        self.tick += 1;
        outcome
    }

    /// Simulate `ticks` ticks
    pub fn run(&mut self, ticks: u64) -> SimulationReport {
        for _ in 0..ticks {
            self.step();
        }
        self.report()
    }

    /// Check if the group being served has nothing left to send
    ///
    /// In that state the combiner can only stall, whatever the other group
    /// still holds.
    pub fn is_idle(&self) -> bool {
        match self.combiner.phase() {
            Phase::ServingLower => self.lower.is_exhausted(),
            Phase::ServingUpper => self.upper.is_exhausted(),
        }
    }

    /// Simulate until the served group runs dry or `max_ticks` total ticks
    pub fn run_until_idle(&mut self, max_ticks: u64) -> SimulationReport {
        while self.tick < max_ticks && !self.is_idle() {
            self.step();
        }
        if !self.is_idle() {
            debug!("Simulation hit the tick limit of {}", max_ticks);
        }

        let report = self.report();
        info!(
            "Simulation finished after {} ticks: {} records, {} rounds, {} violations",
            report.ticks,
            report.received.len(),
            report.stats.rounds,
            report.violations.len()
        );
        report
    }

    /// Snapshot of the run so far
    pub fn report(&self) -> SimulationReport {
        let violations = [
            &self.lower_monitor,
            &self.upper_monitor,
            &self.combined_monitor,
        ]
        .iter()
        .flat_map(|m| m.violations().iter().cloned())
        .collect();

        SimulationReport {
            ticks: self.tick,
            stats: *self.combiner.stats(),
            phase: self.combiner.phase(),
            received: self.consumer.received().to_vec(),
            events: self.events.clone(),
            violations,
            lower_pending: self.lower.pending(),
            upper_pending: self.upper.pending(),
        }
    }
}
