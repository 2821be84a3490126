//! Channel Stream Protocol Library
//!
//! This crate defines the flow-controlled stream contract shared by every
//! endpoint of the channel combiner: the two ingress groups (lower and upper)
//! and the merged egress stream.
//!
//! # Stream contract
//!
//! A stream endpoint carries a [`StreamRecord`] from producer to consumer,
//! qualified by a `valid` bit, and a `ready` bit from consumer to producer.
//! A record transfers on a tick if and only if `valid` and `ready` both hold
//! on that tick. Until the transfer happens the producer keeps the record and
//! `valid` stable.
//!
//! # Example
//!
//! ```rust
//! use chan_protocol::{StreamPort, StreamRecord};
//!
//! let mut port = StreamPort::idle();
//! port.offer(StreamRecord::new(0x12_3456, 0).with_first(true));
//!
//! // The consumer decides whether it takes the record this tick
//! port.set_ready(true);
//! assert_eq!(port.transfer().map(|r| r.payload), Some(0x12_3456));
//! ```

pub mod error;
pub mod group;
pub mod port;
pub mod record;
pub mod sample;

pub use error::ProtocolError;
pub use group::Group;
pub use port::StreamPort;
pub use record::StreamRecord;
pub use sample::{index_bits, SampleFormat, DEFAULT_SAMPLE_WIDTH};
