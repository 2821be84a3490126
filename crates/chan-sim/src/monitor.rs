//! Stream contract monitor
//!
//! The combiner trusts its producers. This monitor watches one port from the
//! outside and records every tick on which the producer side broke the
//! contract: dropping `valid` or changing the record before a transfer, or
//! sending a channel index outside its group.

use chan_protocol::{ProtocolError, StreamPort, StreamRecord};
use tracing::warn;

/// A contract breach observed on one port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Tick of the breach
    pub tick: u64,
    /// Port name
    pub port: String,
    /// What went wrong
    pub error: ProtocolError,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tick {} on {}: {}", self.tick, self.port, self.error)
    }
}

/// Watches the producer side of one [`StreamPort`]
#[derive(Debug, Clone)]
pub struct ProtocolMonitor {
    name: String,
    channel_count: Option<u32>,
    held: Option<StreamRecord>,
    violations: Vec<Violation>,
}

impl ProtocolMonitor {
    /// Create a monitor for the port called `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel_count: None,
            held: None,
            violations: Vec::new(),
        }
    }

    /// Also check transferred channel indices against `channel_count`
    pub fn with_channel_count(mut self, channel_count: u32) -> Self {
        self.channel_count = Some(channel_count);
        self
    }

    /// Get the port name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inspect the port once all of a tick's signals are settled
    pub fn observe(&mut self, port: &StreamPort, tick: u64) {
        if let Some(before) = self.held {
            if !port.valid {
                self.flag(tick, ProtocolError::ValidWithdrawn(before));
            } else if port.record != before {
                self.flag(
                    tick,
                    ProtocolError::RecordChanged {
                        before,
                        after: port.record,
                    },
                );
            }
        }

        if let (Some(record), Some(count)) = (port.transfer(), self.channel_count) {
            if let Err(e) = record.check_channel(count) {
                self.flag(tick, e);
            }
        }

        self.held = (port.valid && !port.ready).then_some(port.record);
    }

    fn flag(&mut self, tick: u64, error: ProtocolError) {
        let violation = Violation {
            tick,
            port: self.name.clone(),
            error,
        };
        warn!("Stream contract violation: {}", violation);
        self.violations.push(violation);
    }

    /// Violations seen so far
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Take the violations seen so far
    pub fn take_violations(&mut self) -> Vec<Violation> {
        std::mem::take(&mut self.violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_handshake() {
        let mut monitor = ProtocolMonitor::new("lower").with_channel_count(2);
        let mut port = StreamPort::offering(StreamRecord::new(1, 1));

        monitor.observe(&port, 0);
        port.set_ready(true);
        monitor.observe(&port, 1);
        port.withdraw();
        monitor.observe(&port, 2);

        assert!(monitor.violations().is_empty());
    }

    #[test]
    fn test_detects_withdrawn_valid() {
        let mut monitor = ProtocolMonitor::new("upper");
        let mut port = StreamPort::offering(StreamRecord::new(1, 0));

        monitor.observe(&port, 0);
        port.withdraw();
        monitor.observe(&port, 1);

        assert_eq!(
            monitor.violations()[0].error,
            ProtocolError::ValidWithdrawn(StreamRecord::new(1, 0))
        );
    }

    #[test]
    fn test_detects_changed_record() {
        let mut monitor = ProtocolMonitor::new("upper");
        let mut port = StreamPort::offering(StreamRecord::new(1, 0));

        monitor.observe(&port, 0);
        port.offer(StreamRecord::new(2, 0));
        monitor.observe(&port, 1);

        let violations = monitor.take_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].tick, 1);
        assert!(matches!(
            violations[0].error,
            ProtocolError::RecordChanged { .. }
        ));
        assert!(violations[0].to_string().starts_with("tick 1 on upper"));
    }

    #[test]
    fn test_detects_out_of_range_channel() {
        let mut monitor = ProtocolMonitor::new("lower").with_channel_count(2);
        let mut port = StreamPort::offering(StreamRecord::new(1, 5));
        port.set_ready(true);

        monitor.observe(&port, 0);

        assert!(matches!(
            monitor.violations()[0].error,
            ProtocolError::ChannelOutOfRange {
                channel_nr: 5,
                channel_count: 2
            }
        ));
    }
}
