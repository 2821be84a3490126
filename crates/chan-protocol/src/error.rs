//! Error types for the stream contract

use thiserror::Error;

use crate::record::StreamRecord;

/// Errors describing a malformed sample or a broken stream contract
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Sample width outside the supported range
    #[error("invalid sample width: {0} bits (expected 1..=32)")]
    InvalidSampleWidth(u8),

    /// Signed sample does not fit the configured width
    #[error("sample {value} does not fit in {width} bits")]
    SampleOutOfRange { value: i64, width: u8 },

    /// Channel index outside its group
    #[error("channel {channel_nr} out of range for a group of {channel_count}")]
    ChannelOutOfRange { channel_nr: u32, channel_count: u32 },

    /// Producer changed a record that was offered but not yet transferred
    #[error("offered record changed before transfer: {before:?} -> {after:?}")]
    RecordChanged {
        before: StreamRecord,
        after: StreamRecord,
    },

    /// Producer dropped valid before the offered record transferred
    #[error("valid withdrawn before transfer of {0:?}")]
    ValidWithdrawn(StreamRecord),
}
