//! Construction-time configuration

use chan_protocol::{index_bits, Group, SampleFormat};
use serde::{Deserialize, Serialize};

use crate::error::MuxError;

/// Size of one channel group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Number of channels in the group
    pub channel_count: u32,
}

impl GroupConfig {
    /// Create a group of `channel_count` channels
    pub fn new(channel_count: u32) -> Self {
        Self { channel_count }
    }

    /// Bits needed for a group-local channel index
    pub fn index_bits(&self) -> u32 {
        index_bits(self.channel_count)
    }
}

/// Combiner configuration, immutable once the combiner is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinerConfig {
    /// Lower channel group
    pub lower: GroupConfig,
    /// Upper channel group
    pub upper: GroupConfig,
    /// Payload encoding
    #[serde(default)]
    pub sample_format: SampleFormat,
}

impl CombinerConfig {
    /// Create a validated configuration with the default sample format
    pub fn new(lower_channels: u32, upper_channels: u32) -> Result<Self, MuxError> {
        let config = Self {
            lower: GroupConfig::new(lower_channels),
            upper: GroupConfig::new(upper_channels),
            sample_format: SampleFormat::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the sample format
    pub fn with_sample_format(mut self, sample_format: SampleFormat) -> Self {
        self.sample_format = sample_format;
        self
    }

    /// Check channel counts
    ///
    /// Deserialized configurations bypass [`CombinerConfig::new`];
    /// [`crate::Combiner::new`] runs this check again before building.
    pub fn validate(&self) -> Result<(), MuxError> {
        for (group, cfg) in [(Group::Lower, self.lower), (Group::Upper, self.upper)] {
            if cfg.channel_count == 0 {
                return Err(MuxError::InvalidChannelCount {
                    group,
                    count: cfg.channel_count,
                });
            }
        }
        if self
            .lower
            .channel_count
            .checked_add(self.upper.channel_count)
            .is_none()
        {
            return Err(MuxError::ChannelSpaceOverflow {
                lower: self.lower.channel_count,
                upper: self.upper.channel_count,
            });
        }
        Ok(())
    }

    /// Offset added to upper channel indices on the merged stream
    pub fn rebase_offset(&self) -> u32 {
        self.lower.channel_count
    }

    /// Channels in the merged index space (saturating for unvalidated configs)
    pub fn total_channels(&self) -> u32 {
        self.lower.channel_count.saturating_add(self.upper.channel_count)
    }

    /// Channel count of a group
    pub fn channel_count(&self, group: Group) -> u32 {
        match group {
            Group::Lower => self.lower.channel_count,
            Group::Upper => self.upper.channel_count,
        }
    }

    /// Bits needed for a lower-group channel index
    pub fn lower_index_bits(&self) -> u32 {
        self.lower.index_bits()
    }

    /// Bits needed for an upper-group channel index
    pub fn upper_index_bits(&self) -> u32 {
        self.upper.index_bits()
    }

    /// Bits needed for a merged-stream channel index
    pub fn combined_index_bits(&self) -> u32 {
        index_bits(self.total_channels())
    }

    /// Which group a merged-stream channel index belongs to
    pub fn group_of(&self, channel_nr: u32) -> Group {
        if channel_nr < self.rebase_offset() {
            Group::Lower
        } else {
            Group::Upper
        }
    }
}
