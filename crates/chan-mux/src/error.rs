//! Error types for the combiner

use chan_protocol::Group;
use thiserror::Error;

/// Errors that can occur while building or driving a combiner
#[derive(Debug, Error)]
pub enum MuxError {
    /// A channel group must contain at least one channel
    #[error("{group} group needs at least one channel, got {count}")]
    InvalidChannelCount {
        /// Group with the bad count
        group: Group,
        /// Configured channel count
        count: u32,
    },

    /// Merged index space does not fit a `u32`
    #[error("combined channel count overflows: {lower} + {upper}")]
    ChannelSpaceOverflow {
        /// Lower channel count
        lower: u32,
        /// Upper channel count
        upper: u32,
    },

    /// Protocol error
    #[error("protocol error: {0}")]
    ProtocolError(#[from] chan_protocol::ProtocolError),

    /// The actor is no longer running
    #[error("combiner actor stopped")]
    ActorStopped,
}
