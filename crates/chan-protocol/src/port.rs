//! Ready/valid stream endpoint
//!
//! [`StreamPort`] is the single endpoint type used for every stream in the
//! system. The producer side drives `record` and `valid`, the consumer side
//! drives `ready`. Neither side stores anything beyond the current tick's
//! signal values.

use crate::record::StreamRecord;

/// Signals of one flow-controlled stream endpoint for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamPort {
    /// Record offered by the producer (meaningful only while `valid`)
    pub record: StreamRecord,
    /// Producer has a record on offer
    pub valid: bool,
    /// Consumer accepts a record this tick
    pub ready: bool,
}

impl StreamPort {
    /// An endpoint with no record on offer and no consumer readiness
    pub fn idle() -> Self {
        Self::default()
    }

    /// An endpoint with `record` on offer
    pub fn offering(record: StreamRecord) -> Self {
        Self {
            record,
            valid: true,
            ready: false,
        }
    }

    /// Producer side: put `record` on offer
    pub fn offer(&mut self, record: StreamRecord) {
        self.record = record;
        self.valid = true;
    }

    /// Producer side: stop offering
    pub fn withdraw(&mut self) {
        self.valid = false;
    }

    /// Consumer side: drive the ready signal
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// The offered record, if `valid` is asserted
    pub fn offered(&self) -> Option<&StreamRecord> {
        self.valid.then_some(&self.record)
    }

    /// Whether a transfer happens on this tick (`valid` and `ready`)
    pub fn fired(&self) -> bool {
        self.valid && self.ready
    }

    /// The record transferred on this tick, if any
    pub fn transfer(&self) -> Option<StreamRecord> {
        self.fired().then_some(self.record)
    }
}
