//! Error types for the simulation layer

use chan_protocol::Group;
use thiserror::Error;

/// Errors that can occur while building a simulation
#[derive(Debug, Error)]
pub enum SimError {
    /// Combiner configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] chan_mux::MuxError),

    /// Sample could not be encoded
    #[error("protocol error: {0}")]
    Protocol(#[from] chan_protocol::ProtocolError),

    /// Scenario file could not be parsed
    #[error("invalid scenario: {0}")]
    Json(#[from] serde_json::Error),

    /// A frame carries no samples
    #[error("empty frame for {0} group")]
    EmptyFrame(Group),

    /// A frame has more samples than its group has channels
    #[error("{group} frame has {len} samples but the group has {channel_count} channels")]
    FrameTooWide {
        /// Group the frame was meant for
        group: Group,
        /// Samples in the frame
        len: usize,
        /// Channels in the group
        channel_count: u32,
    },
}
