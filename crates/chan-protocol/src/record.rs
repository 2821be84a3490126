//! Channel-tagged sample records

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// One sample travelling over a stream endpoint
///
/// `payload` holds the raw sample bits (see [`crate::SampleFormat`] for the
/// width). `channel_nr` is local to the producing group on ingress and global
/// on the merged egress stream. `first`/`last` delimit a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StreamRecord {
    /// Raw sample bits
    pub payload: u32,
    /// Channel index
    pub channel_nr: u32,
    /// Start of burst
    #[cfg_attr(feature = "serde", serde(default))]
    pub first: bool,
    /// End of burst
    #[cfg_attr(feature = "serde", serde(default))]
    pub last: bool,
}

impl StreamRecord {
    /// Create a record with both burst markers cleared
    pub fn new(payload: u32, channel_nr: u32) -> Self {
        Self {
            payload,
            channel_nr,
            first: false,
            last: false,
        }
    }

    /// Set the start-of-burst marker
    pub fn with_first(mut self, first: bool) -> Self {
        self.first = first;
        self
    }

    /// Set the end-of-burst marker
    pub fn with_last(mut self, last: bool) -> Self {
        self.last = last;
        self
    }

    /// Check that the channel index lies inside a group of `channel_count`
    pub fn check_channel(&self, channel_count: u32) -> Result<(), ProtocolError> {
        if self.channel_nr < channel_count {
            Ok(())
        } else {
            Err(ProtocolError::ChannelOutOfRange {
                channel_nr: self.channel_nr,
                channel_count,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_markers() {
        let record = StreamRecord::new(10, 1).with_first(true).with_last(true);
        assert_eq!(record.payload, 10);
        assert_eq!(record.channel_nr, 1);
        assert!(record.first);
        assert!(record.last);
    }

    #[test]
    fn test_check_channel() {
        assert!(StreamRecord::new(0, 2).check_channel(3).is_ok());
        assert_eq!(
            StreamRecord::new(0, 3).check_channel(3),
            Err(ProtocolError::ChannelOutOfRange {
                channel_nr: 3,
                channel_count: 3
            })
        );
    }
}
