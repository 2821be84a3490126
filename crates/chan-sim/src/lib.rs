//! Channel Combiner Simulation Library
//!
//! This crate provides a simulation layer for exercising the combiner without
//! real sample producers or a real downstream sink. It includes:
//!
//! - **VirtualProducer**: Offers queued records on a stream port, honouring
//!   the hold-until-transfer rule, with optional idle gaps
//! - **VirtualConsumer**: Drives `ready` from a pattern and collects the
//!   merged stream
//! - **ProtocolMonitor**: Flags producers that break the stream contract
//! - **Simulation**: Wires all of the above around a [`chan_mux::Combiner`]
//! - **Scenario**: JSON-loadable description of a simulation run
//!
//! # Example
//!
//! ```rust
//! use chan_mux::CombinerConfig;
//! use chan_sim::{ActivitySchedule, Simulation};
//! use chan_protocol::SampleFormat;
//!
//! let config = CombinerConfig::new(2, 3).unwrap();
//! let mut sim = Simulation::new(config).unwrap();
//! sim.set_activity(ActivitySchedule::Constant(false));
//!
//! let format = SampleFormat::default();
//! sim.lower_mut().push_frame(&chan_sim::frame(&format, &[10, 20]).unwrap());
//! sim.upper_mut().push_frame(&chan_sim::frame(&format, &[1, 2, 3]).unwrap());
//!
//! let report = sim.run_until_idle(100);
//! assert_eq!(report.received.len(), 5);
//! assert!(report.violations.is_empty());
//! ```

pub mod consumer;
pub mod error;
pub mod monitor;
pub mod pattern;
pub mod producer;
pub mod scenario;
pub mod simulation;
pub mod source;

pub use consumer::VirtualConsumer;
pub use error::SimError;
pub use monitor::{ProtocolMonitor, Violation};
pub use pattern::{ActivitySchedule, Pattern};
pub use producer::VirtualProducer;
pub use scenario::{GroupFeed, Scenario};
pub use simulation::{Simulation, SimulationReport};
pub use source::{frame, frames, ramp_frames};
