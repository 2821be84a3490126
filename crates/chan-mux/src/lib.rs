//! Channel Stream Combiner
//!
//! This crate merges two flow-controlled sample streams, a "lower" channel
//! group and an "upper" channel group, into a single channel-tagged stream.
//!
//! # Architecture
//!
//! The [`Combiner`] is a two-phase state machine stepped once per tick:
//!
//! - **Serving lower**: lower records pass straight through until the lower
//!   producer marks the end of its burst
//! - **Serving upper**: upper records pass through with their channel index
//!   rebased by the lower channel count, until the upper burst ends
//!
//! When the upper group is switched off the combiner still spends exactly
//! `upper_count` transfers in the upper phase, consuming and discarding the
//! upstream records and emitting zero-valued placeholders instead. The merged
//! stream therefore keeps the same frame cadence whether the upper group is
//! active or not.
//!
//! For real-time use, [`run_combiner_actor`] drives a combiner from tokio
//! channels at a fixed tick period.
//!
//! # Example
//!
//! ```rust
//! use chan_mux::{Combiner, CombinerConfig, CombinerIo};
//! use chan_protocol::StreamRecord;
//!
//! let config = CombinerConfig::new(2, 3).unwrap();
//! let mut combiner = Combiner::new(config).unwrap();
//! let mut io = CombinerIo::new(false);
//!
//! io.combined.set_ready(true);
//! io.lower.offer(StreamRecord::new(10, 0).with_first(true));
//! combiner.step(&mut io);
//!
//! assert!(io.lower.ready);
//! assert_eq!(io.combined.transfer().map(|r| r.payload), Some(10));
//! ```

pub mod actor;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod state;

// Re-export actor types
pub use actor::{run_combiner_actor, ActorSettings, CombinerChannels, CombinerCommand};

// Re-export engine types
pub use config::{CombinerConfig, GroupConfig};
pub use engine::{Combiner, CombinerIo, Decision};
pub use error::MuxError;
pub use events::CombinerEvent;
pub use state::{CombinerStats, Phase, StepOutcome};
