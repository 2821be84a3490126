//! Virtual downstream consumer

use chan_protocol::{StreamPort, StreamRecord};

use crate::pattern::Pattern;

/// A simulated sink for the merged stream
#[derive(Debug, Clone, Default)]
pub struct VirtualConsumer {
    ready_pattern: Pattern,
    received: Vec<StreamRecord>,
}

impl VirtualConsumer {
    /// Create a consumer that is always ready
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a consumer following `pattern`
    pub fn with_pattern(ready_pattern: Pattern) -> Self {
        Self {
            ready_pattern,
            received: Vec::new(),
        }
    }

    /// Set the ready pattern
    pub fn set_ready_pattern(&mut self, pattern: Pattern) {
        self.ready_pattern = pattern;
    }

    /// Drive `ready` for `tick`
    pub fn drive(&self, port: &mut StreamPort, tick: u64) {
        port.set_ready(self.ready_pattern.at(tick));
    }

    /// Observe the end of a tick and keep any transferred record
    pub fn complete(&mut self, port: &StreamPort) -> Option<StreamRecord> {
        let record = port.transfer()?;
        self.received.push(record);
        Some(record)
    }

    /// Everything received so far
    pub fn received(&self) -> &[StreamRecord] {
        &self.received
    }

    /// Take everything received so far
    pub fn take_received(&mut self) -> Vec<StreamRecord> {
        std::mem::take(&mut self.received)
    }

    /// Received records split into merged frames (each ending on `last`)
    ///
    /// A trailing partial frame is included as the final element.
    pub fn frames(&self) -> Vec<&[StreamRecord]> {
        self.received
            .split_inclusive(|r| r.last)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_only_transfers() {
        let mut consumer = VirtualConsumer::with_pattern(Pattern::Never);
        let mut port = StreamPort::offering(StreamRecord::new(1, 0));

        consumer.drive(&mut port, 0);
        assert!(consumer.complete(&port).is_none());

        consumer.set_ready_pattern(Pattern::Always);
        consumer.drive(&mut port, 1);
        assert_eq!(consumer.complete(&port), Some(StreamRecord::new(1, 0)));
        assert_eq!(consumer.received().len(), 1);
    }

    #[test]
    fn test_frames_split_on_last() {
        let mut consumer = VirtualConsumer::new();
        for record in [
            StreamRecord::new(1, 0).with_first(true),
            StreamRecord::new(2, 1).with_last(true),
            StreamRecord::new(3, 0).with_first(true),
        ] {
            let mut port = StreamPort::offering(record);
            consumer.drive(&mut port, 0);
            consumer.complete(&port);
        }

        let frames = consumer.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].len(), 2);
        assert_eq!(frames[1].len(), 1);
        assert_eq!(consumer.take_received().len(), 3);
        assert!(consumer.received().is_empty());
    }
}
