//! Virtual stream producer
//!
//! Provides a simulated upstream source that offers queued records on a
//! [`StreamPort`] while following the stream contract: once a record is on
//! offer it stays there, unchanged, until the consumer takes it.

use std::collections::VecDeque;

use chan_protocol::{Group, StreamPort, StreamRecord};
use tracing::trace;

use crate::pattern::Pattern;

/// A simulated producer feeding one channel group
#[derive(Debug, Clone)]
pub struct VirtualProducer {
    /// Group this producer feeds
    group: Group,
    /// Records not yet transferred (front is on offer when `offering`)
    queue: VecDeque<StreamRecord>,
    /// Ticks on which a fresh record may be put on offer
    offer_pattern: Pattern,
    /// Front record is currently on offer
    offering: bool,
    /// Records transferred so far
    sent: u64,
}

impl VirtualProducer {
    /// Create an empty producer
    pub fn new(group: Group) -> Self {
        Self {
            group,
            queue: VecDeque::new(),
            offer_pattern: Pattern::Always,
            offering: false,
            sent: 0,
        }
    }

    /// Get the group this producer feeds
    pub fn group(&self) -> Group {
        self.group
    }

    /// Set the pattern gating when a fresh record may be offered
    pub fn set_offer_pattern(&mut self, pattern: Pattern) {
        self.offer_pattern = pattern;
    }

    /// Queue a single record
    pub fn push(&mut self, record: StreamRecord) {
        self.queue.push_back(record);
    }

    /// Queue a whole burst
    pub fn push_frame(&mut self, records: &[StreamRecord]) {
        self.queue.extend(records.iter().copied());
    }

    /// Records still waiting to transfer
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Check if every queued record has transferred
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty()
    }

    /// Records transferred so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Drive `record`/`valid` for `tick`
    pub fn drive(&mut self, port: &mut StreamPort, tick: u64) {
        if !self.offering {
            if let Some(next) = self.queue.front() {
                if self.offer_pattern.at(tick) {
                    self.offering = true;
                    port.offer(*next);
                }
            }
        }
        if !self.offering {
            port.withdraw();
        }
    }

    /// Observe the end of a tick; drop the front record if it transferred
    pub fn complete(&mut self, port: &mut StreamPort) {
        if self.offering && port.fired() {
            if let Some(record) = self.queue.pop_front() {
                trace!(
                    "{} producer: record for channel {} transferred",
                    self.group,
                    record.channel_nr
                );
            }
            self.offering = false;
            self.sent += 1;
            port.withdraw();
        }
    }
}
